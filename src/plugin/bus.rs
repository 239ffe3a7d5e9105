//! Ordered plugin dispatch.
//!
//! Plugins are called in registration order. For text events the bus threads
//! a value through the chain:
//!
//! ```text
//! text ─► P1 ─Some("Jam")─► P2 ─None─► P3 ─Some("")─► result = "Jam"
//!              replaces         keeps       keeps
//! ```
//!
//! A plugin error stops the chain and surfaces as `GenerationError::Plugin`.

use crate::config::{ConfigError, PatternSet, PluginSection};
use crate::error::{Error, GenerationError, Result};
use crate::site::{NodeId, ResourceId, Site};
use crate::template::{TemplateEngine, TextHooks};

use super::{Event, Plugin};

/// Arguments for a dynamically dispatched event.
pub enum EventArgs<'a> {
    /// Site-level events
    Site,
    Node(NodeId),
    /// Binary resource events
    Resource(ResourceId),
    /// Text resource events: resource and current text
    Text(ResourceId, String),
    Template(&'a dyn TemplateEngine),
}

impl EventArgs<'_> {
    fn describe(&self) -> &'static str {
        match self {
            Self::Site => "site arguments",
            Self::Node(_) => "a node",
            Self::Resource(_) => "a resource",
            Self::Text(..) => "a resource with text",
            Self::Template(_) => "a template",
        }
    }
}

/// Resources a plugin sees in resource-level events.
#[derive(Debug, Clone, Default)]
pub struct ResourceFilter {
    include: PatternSet,
    exclude: PatternSet,
}

impl ResourceFilter {
    pub fn from_section(section: &PluginSection) -> Result<Option<Self>, ConfigError> {
        let (include, exclude) = section.patterns()?;
        if include.is_empty() && exclude.is_empty() {
            return Ok(None);
        }
        Ok(Some(Self { include, exclude }))
    }

    /// Empty include list accepts everything not excluded.
    pub fn accepts(&self, relative: &str) -> bool {
        (self.include.is_empty() || self.include.is_match(relative))
            && !self.exclude.is_match(relative)
    }
}

struct Entry {
    plugin: Box<dyn Plugin>,
    filter: Option<ResourceFilter>,
}

impl Entry {
    #[inline]
    fn accepts(&self, relative: &str) -> bool {
        self.filter.as_ref().is_none_or(|f| f.accepts(relative))
    }
}

#[derive(Default)]
pub struct PluginBus {
    entries: Vec<Entry>,
}

impl std::fmt::Debug for PluginBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl PluginBus {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin that sees every resource.
    pub fn push(&mut self, plugin: Box<dyn Plugin>) {
        self.entries.push(Entry {
            plugin,
            filter: None,
        });
    }

    /// Register a plugin restricted to resources accepted by `filter`.
    pub fn push_filtered(&mut self, plugin: Box<dyn Plugin>, filter: Option<ResourceFilter>) {
        self.entries.push(Entry { plugin, filter });
    }

    pub fn with(mut self, plugin: impl Plugin + 'static) -> Self {
        self.push(Box::new(plugin));
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.plugin.name())
    }

    // ========================================================================
    // Dynamic dispatch
    // ========================================================================

    /// Fire an event by name.
    ///
    /// Returns the resulting text for text events, `None` otherwise. Unknown
    /// names and mismatched arguments are `Error::PluginProtocol`.
    pub fn call(&mut self, name: &str, site: &mut Site, args: EventArgs<'_>) -> Result<Option<String>> {
        let event: Event = name.parse()?;
        match (event, args) {
            (Event::TemplateLoaded, EventArgs::Template(template)) => {
                self.template_loaded(site, template)?;
            }
            (Event::BeginGeneration, EventArgs::Site) => self.begin_generation(site)?,
            (Event::BeginSite, EventArgs::Site) => self.begin_site(site)?,
            (Event::SiteComplete, EventArgs::Site) => self.site_complete(site)?,
            (Event::GenerationComplete, EventArgs::Site) => self.generation_complete(site)?,
            (Event::BeginNode, EventArgs::Node(node)) => self.begin_node(site, node)?,
            (Event::NodeComplete, EventArgs::Node(node)) => self.node_complete(site, node)?,
            (Event::BeginBinaryResource, EventArgs::Resource(id)) => {
                self.begin_binary_resource(site, id)?;
            }
            (Event::BinaryResourceComplete, EventArgs::Resource(id)) => {
                self.binary_resource_complete(site, id)?;
            }
            (Event::BeginTextResource, EventArgs::Text(id, text)) => {
                return self.begin_text_resource(site, id, text).map(Some);
            }
            (Event::TextResourceComplete, EventArgs::Text(id, text)) => {
                return self.text_resource_complete(site, id, text).map(Some);
            }
            (event, args) => {
                return Err(Error::PluginProtocol(format!(
                    "`{event}` cannot be called with {}",
                    args.describe()
                )));
            }
        }
        Ok(None)
    }

    // ========================================================================
    // Typed events
    // ========================================================================

    pub fn template_loaded(&mut self, site: &mut Site, template: &dyn TemplateEngine) -> Result<()> {
        self.broadcast(Event::TemplateLoaded, site, |p, site| {
            p.template_loaded(site, template)
        })
    }

    pub fn begin_generation(&mut self, site: &mut Site) -> Result<()> {
        self.broadcast(Event::BeginGeneration, site, |p, site| p.begin_generation(site))
    }

    pub fn begin_site(&mut self, site: &mut Site) -> Result<()> {
        self.broadcast(Event::BeginSite, site, |p, site| p.begin_site(site))
    }

    pub fn begin_node(&mut self, site: &mut Site, node: NodeId) -> Result<()> {
        self.broadcast(Event::BeginNode, site, |p, site| p.begin_node(site, node))
    }

    pub fn node_complete(&mut self, site: &mut Site, node: NodeId) -> Result<()> {
        self.broadcast(Event::NodeComplete, site, |p, site| p.node_complete(site, node))
    }

    pub fn site_complete(&mut self, site: &mut Site) -> Result<()> {
        self.broadcast(Event::SiteComplete, site, |p, site| p.site_complete(site))
    }

    pub fn generation_complete(&mut self, site: &mut Site) -> Result<()> {
        self.broadcast(Event::GenerationComplete, site, |p, site| {
            p.generation_complete(site)
        })
    }

    pub fn begin_binary_resource(&mut self, site: &mut Site, id: ResourceId) -> Result<()> {
        self.for_resource(Event::BeginBinaryResource, site, id, |p, site| {
            p.begin_binary_resource(site, id)
        })
    }

    pub fn binary_resource_complete(&mut self, site: &mut Site, id: ResourceId) -> Result<()> {
        self.for_resource(Event::BinaryResourceComplete, site, id, |p, site| {
            p.binary_resource_complete(site, id)
        })
    }

    pub fn begin_text_resource(&mut self, site: &mut Site, id: ResourceId, text: String) -> Result<String> {
        self.chain(Event::BeginTextResource, site, id, text, |p, site, text| {
            p.begin_text_resource(site, id, text)
        })
    }

    pub fn text_resource_complete(
        &mut self,
        site: &mut Site,
        id: ResourceId,
        text: String,
    ) -> Result<String> {
        self.chain(Event::TextResourceComplete, site, id, text, |p, site, text| {
            p.text_resource_complete(site, id, text)
        })
    }

    // ========================================================================
    // Dispatch helpers
    // ========================================================================

    fn broadcast<F>(&mut self, event: Event, site: &mut Site, mut hook: F) -> Result<()>
    where
        F: FnMut(&mut dyn Plugin, &mut Site) -> anyhow::Result<()>,
    {
        for entry in &mut self.entries {
            hook(entry.plugin.as_mut(), site).map_err(|e| plugin_error(entry, event, e))?;
        }
        Ok(())
    }

    fn for_resource<F>(&mut self, event: Event, site: &mut Site, id: ResourceId, mut hook: F) -> Result<()>
    where
        F: FnMut(&mut dyn Plugin, &mut Site) -> anyhow::Result<()>,
    {
        let relative = site.content().relative_path(id);
        for entry in &mut self.entries {
            if !entry.accepts(&relative) {
                continue;
            }
            hook(entry.plugin.as_mut(), site).map_err(|e| plugin_error(entry, event, e))?;
        }
        Ok(())
    }

    fn chain<F>(
        &mut self,
        event: Event,
        site: &mut Site,
        id: ResourceId,
        mut text: String,
        mut hook: F,
    ) -> Result<String>
    where
        F: FnMut(&mut dyn Plugin, &mut Site, &str) -> anyhow::Result<Option<String>>,
    {
        let relative = site.content().relative_path(id);
        for entry in &mut self.entries {
            if !entry.accepts(&relative) {
                continue;
            }
            let result = hook(entry.plugin.as_mut(), site, &text)
                .map_err(|e| plugin_error(entry, event, e))?;
            if let Some(replacement) = result
                && !replacement.is_empty()
            {
                text = replacement;
            }
        }
        Ok(text)
    }
}

fn plugin_error(entry: &Entry, event: Event, source: anyhow::Error) -> Error {
    GenerationError::Plugin {
        plugin: entry.plugin.name().to_string(),
        event: event.to_string(),
        source,
    }
    .into()
}

impl TextHooks for PluginBus {
    fn preprocess(&mut self, site: &mut Site, id: ResourceId, text: String) -> Result<String> {
        self.begin_text_resource(site, id, text)
    }

    fn postprocess(&mut self, site: &mut Site, id: ResourceId, text: String) -> Result<String> {
        self.text_resource_complete(site, id, text)
    }
}
