//! Plugin contract and event bus.
//!
//! # Lifecycle
//!
//! ```text
//! template_loaded
//! begin_generation
//! └─ begin_site
//!    └─ begin_node                       (every node, depth-first)
//!       ├─ begin_text_resource           ┐ text resources,
//!       │  text_resource_complete        ┘ chained through the bus
//!       ├─ begin_binary_resource         ┐ everything else
//!       │  binary_resource_complete      ┘
//!       └─ node_complete
//!    site_complete
//! generation_complete
//! ```
//!
//! Every hook is optional. Text hooks may return a replacement text; the bus
//! threads it to the next plugin (see `PluginBus`).
//!
//! # Module Structure
//!
//! ```text
//! plugin/
//! ├── bus        # PluginBus: ordered dispatch, text chaining, filters
//! ├── registry   # name → plugin, built from `build.plugins`
//! └── builtin/   # meta, depends, auto_extend, sorter
//! ```

mod builtin;
mod bus;
pub mod registry;

pub use bus::{EventArgs, PluginBus, ResourceFilter};

use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::site::{NodeId, ResourceId, Site};
use crate::template::TemplateEngine;

/// A content-transforming plugin.
///
/// Hooks receive the whole site mutably: plugins may set metadata, deploy
/// paths, dependencies and processing flags.
#[allow(unused_variables)]
pub trait Plugin {
    fn name(&self) -> &str;

    fn template_loaded(
        &mut self,
        site: &mut Site,
        template: &dyn TemplateEngine,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    fn begin_generation(&mut self, site: &mut Site) -> anyhow::Result<()> {
        Ok(())
    }

    fn begin_site(&mut self, site: &mut Site) -> anyhow::Result<()> {
        Ok(())
    }

    fn begin_node(&mut self, site: &mut Site, node: NodeId) -> anyhow::Result<()> {
        Ok(())
    }

    /// `Some(text)` replaces the text for later plugins.
    fn begin_text_resource(
        &mut self,
        site: &mut Site,
        resource: ResourceId,
        text: &str,
    ) -> anyhow::Result<Option<String>> {
        Ok(None)
    }

    /// `Some(text)` replaces the text for later plugins.
    fn text_resource_complete(
        &mut self,
        site: &mut Site,
        resource: ResourceId,
        text: &str,
    ) -> anyhow::Result<Option<String>> {
        Ok(None)
    }

    fn begin_binary_resource(&mut self, site: &mut Site, resource: ResourceId) -> anyhow::Result<()> {
        Ok(())
    }

    fn binary_resource_complete(
        &mut self,
        site: &mut Site,
        resource: ResourceId,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    fn node_complete(&mut self, site: &mut Site, node: NodeId) -> anyhow::Result<()> {
        Ok(())
    }

    fn site_complete(&mut self, site: &mut Site) -> anyhow::Result<()> {
        Ok(())
    }

    fn generation_complete(&mut self, site: &mut Site) -> anyhow::Result<()> {
        Ok(())
    }
}

// ============================================================================
// Events
// ============================================================================

/// Lifecycle events, in firing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    TemplateLoaded,
    BeginGeneration,
    BeginSite,
    BeginNode,
    BeginTextResource,
    TextResourceComplete,
    BeginBinaryResource,
    BinaryResourceComplete,
    NodeComplete,
    SiteComplete,
    GenerationComplete,
}

impl Event {
    pub const ALL: [Event; 11] = [
        Event::TemplateLoaded,
        Event::BeginGeneration,
        Event::BeginSite,
        Event::BeginNode,
        Event::BeginTextResource,
        Event::TextResourceComplete,
        Event::BeginBinaryResource,
        Event::BinaryResourceComplete,
        Event::NodeComplete,
        Event::SiteComplete,
        Event::GenerationComplete,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TemplateLoaded => "template_loaded",
            Self::BeginGeneration => "begin_generation",
            Self::BeginSite => "begin_site",
            Self::BeginNode => "begin_node",
            Self::BeginTextResource => "begin_text_resource",
            Self::TextResourceComplete => "text_resource_complete",
            Self::BeginBinaryResource => "begin_binary_resource",
            Self::BinaryResourceComplete => "binary_resource_complete",
            Self::NodeComplete => "node_complete",
            Self::SiteComplete => "site_complete",
            Self::GenerationComplete => "generation_complete",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Event {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|event| event.as_str() == name)
            .ok_or_else(|| Error::PluginProtocol(format!("unknown event `{name}`")))
    }
}
