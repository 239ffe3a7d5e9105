//! Test fixtures: a temporary site and stub collaborators.

use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use rustc_hash::FxHashMap;
use serde_json::Value as JsonValue;
use tempfile::TempDir;

use crate::config::SiteConfig;
use crate::deps::DependencySet;
use crate::error::{GenerationError, Result};
use crate::fs::normalize_path;
use crate::generator::Generator;
use crate::plugin::{Event, Plugin, PluginBus};
use crate::site::{NodeId, ResourceId, Site};
use crate::template::{ContextBuilder, TemplateEngine, TextHooks};

/// How far in the past fixture files are dated.
const PAST: Duration = Duration::from_secs(3600);

/// Set the modification time of `path`.
pub fn set_mtime(path: &Path, time: SystemTime) {
    let file = fs::File::options().write(true).open(path).unwrap();
    file.set_modified(time).unwrap();
}

// ============================================================================
// Fixture
// ============================================================================

/// A site rooted in a temporary directory.
///
/// Files written through the fixture are dated an hour in the past, so
/// anything generated afterwards is strictly newer.
pub struct Fixture {
    _dir: TempDir,
    pub root: PathBuf,
    pub config: SiteConfig,
}

impl Fixture {
    /// A site with an empty content folder.
    pub fn new() -> Self {
        let fixture = Self::empty();
        fs::create_dir_all(fixture.config.content_root()).unwrap();
        fixture
    }

    /// A site without a content folder.
    pub fn empty() -> Self {
        let dir = TempDir::new().unwrap();
        let root = normalize_path(dir.path());
        let config = SiteConfig::for_root(&root);
        Self {
            _dir: dir,
            root,
            config,
        }
    }

    fn write(path: &Path, text: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
        set_mtime(path, SystemTime::now() - PAST);
    }

    pub fn content(&self, relative: &str, text: &str) -> PathBuf {
        let path = self.content_path(relative);
        Self::write(&path, text);
        path
    }

    pub fn layout(&self, relative: &str, text: &str) -> PathBuf {
        let path = self.config.layout_root().join(relative);
        Self::write(&path, text);
        path
    }

    pub fn content_path(&self, relative: &str) -> PathBuf {
        self.config.content_root().join(relative)
    }

    pub fn deploy_path(&self, relative: &str) -> PathBuf {
        self.config.deploy_root().join(relative)
    }

    pub fn read_deploy(&self, relative: &str) -> Option<String> {
        fs::read_to_string(self.deploy_path(relative)).ok()
    }

    /// Date `path` `secs` seconds from now.
    pub fn touch(&self, path: &Path, secs: i64) {
        let now = SystemTime::now();
        let offset = Duration::from_secs(secs.unsigned_abs());
        let time = if secs >= 0 { now + offset } else { now - offset };
        set_mtime(path, time);
    }

    /// A loaded site over the current config.
    pub fn site(&self) -> Site {
        let mut site = Site::new(Arc::new(self.config.clone()));
        site.load().unwrap();
        site
    }

    pub fn generator(&self, template: impl TemplateEngine + 'static, plugins: PluginBus) -> Generator {
        Generator::new(Arc::new(self.config.clone()), Box::new(template), plugins)
    }
}

// ============================================================================
// Template stub
// ============================================================================

/// Text hooks that change nothing.
pub struct NoHooks;

impl TextHooks for NoHooks {
    fn preprocess(&mut self, _: &mut Site, _: ResourceId, text: String) -> Result<String> {
        Ok(text)
    }

    fn postprocess(&mut self, _: &mut Site, _: ResourceId, text: String) -> Result<String> {
        Ok(text)
    }
}

/// Template engine that renders the preprocessed source verbatim.
///
/// Dependencies come from a fixed table; `get_dependencies` calls are counted.
#[derive(Default, Clone)]
pub struct StubTemplate {
    pub dependency_calls: Rc<Cell<usize>>,
    pub render_calls: Rc<Cell<usize>>,
    deps: FxHashMap<String, DependencySet>,
    fail_once: Rc<RefCell<Option<String>>>,
}

impl StubTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deps(mut self, path: &str, deps: &[&str]) -> Self {
        self.deps
            .insert(path.to_string(), deps.iter().copied().collect());
        self
    }

    pub fn with_unresolved(mut self, path: &str) -> Self {
        self.deps.insert(path.to_string(), DependencySet::unresolved());
        self
    }

    /// Fail the next render of `path`.
    pub fn fail_once(&self, path: &str) {
        *self.fail_once.borrow_mut() = Some(path.to_string());
    }
}

impl TemplateEngine for StubTemplate {
    fn name(&self) -> &str {
        "stub"
    }

    fn configure(&mut self, _site: &Site) -> Result<()> {
        Ok(())
    }

    fn render_resource(
        &mut self,
        site: &mut Site,
        id: ResourceId,
        _context: ContextBuilder<'_>,
        hooks: &mut dyn TextHooks,
    ) -> Result<String> {
        self.render_calls.set(self.render_calls.get() + 1);
        let relative = site.content().relative_path(id);
        let failing = self.fail_once.borrow().as_deref() == Some(relative.as_str());
        if failing {
            self.fail_once.borrow_mut().take();
            return Err(GenerationError::template(relative, "forced failure").into());
        }
        let text = fs::read_to_string(site.resource(id).source()).unwrap();
        hooks.preprocess(site, id, text)
    }

    fn render(&mut self, text: &str, _context: &JsonValue) -> Result<String> {
        Ok(text.to_string())
    }

    fn get_dependencies(&self, path: &str) -> DependencySet {
        self.dependency_calls.set(self.dependency_calls.get() + 1);
        self.deps.get(path).cloned().unwrap_or_default()
    }
}

// ============================================================================
// Plugin stubs
// ============================================================================

pub type EventLog = Rc<RefCell<Vec<String>>>;

/// Records every event as `name:event` or `name:event:path`.
pub struct Recorder {
    name: String,
    log: EventLog,
}

impl Recorder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            log: EventLog::default(),
        }
    }

    /// A recorder writing to the same log as `other`.
    pub fn sharing(name: &str, other: &Recorder) -> Self {
        Self {
            name: name.to_string(),
            log: Rc::clone(&other.log),
        }
    }

    pub fn log(&self) -> EventLog {
        Rc::clone(&self.log)
    }

    fn record(&self, event: Event, path: Option<String>) {
        let entry = match path {
            Some(path) => format!("{}:{}:{}", self.name, event, path),
            None => format!("{}:{}", self.name, event),
        };
        self.log.borrow_mut().push(entry);
    }

    fn node(&self, site: &Site, event: Event, node: NodeId) -> anyhow::Result<()> {
        self.record(event, Some(site.content().node_relative_path(node)));
        Ok(())
    }

    fn resource(&self, site: &Site, event: Event, id: ResourceId) {
        self.record(event, Some(site.content().relative_path(id)));
    }
}

impl Plugin for Recorder {
    fn name(&self) -> &str {
        &self.name
    }

    fn template_loaded(&mut self, _: &mut Site, _: &dyn TemplateEngine) -> anyhow::Result<()> {
        self.record(Event::TemplateLoaded, None);
        Ok(())
    }

    fn begin_generation(&mut self, _: &mut Site) -> anyhow::Result<()> {
        self.record(Event::BeginGeneration, None);
        Ok(())
    }

    fn begin_site(&mut self, _: &mut Site) -> anyhow::Result<()> {
        self.record(Event::BeginSite, None);
        Ok(())
    }

    fn begin_node(&mut self, site: &mut Site, node: NodeId) -> anyhow::Result<()> {
        self.node(site, Event::BeginNode, node)
    }

    fn begin_text_resource(
        &mut self,
        site: &mut Site,
        resource: ResourceId,
        _: &str,
    ) -> anyhow::Result<Option<String>> {
        self.resource(site, Event::BeginTextResource, resource);
        Ok(None)
    }

    fn text_resource_complete(
        &mut self,
        site: &mut Site,
        resource: ResourceId,
        _: &str,
    ) -> anyhow::Result<Option<String>> {
        self.resource(site, Event::TextResourceComplete, resource);
        Ok(None)
    }

    fn begin_binary_resource(&mut self, site: &mut Site, resource: ResourceId) -> anyhow::Result<()> {
        self.resource(site, Event::BeginBinaryResource, resource);
        Ok(())
    }

    fn binary_resource_complete(&mut self, site: &mut Site, resource: ResourceId) -> anyhow::Result<()> {
        self.resource(site, Event::BinaryResourceComplete, resource);
        Ok(())
    }

    fn node_complete(&mut self, site: &mut Site, node: NodeId) -> anyhow::Result<()> {
        self.node(site, Event::NodeComplete, node)
    }

    fn site_complete(&mut self, _: &mut Site) -> anyhow::Result<()> {
        self.record(Event::SiteComplete, None);
        Ok(())
    }

    fn generation_complete(&mut self, _: &mut Site) -> anyhow::Result<()> {
        self.record(Event::GenerationComplete, None);
        Ok(())
    }
}

/// Returns a fixed text (or nothing) from both text hooks.
pub struct Constant {
    name: String,
    text: Option<String>,
}

impl Constant {
    pub fn new(name: &str, text: &str) -> Self {
        Self {
            name: name.to_string(),
            text: Some(text.to_string()),
        }
    }

    /// Returns nothing.
    pub fn silent(name: &str) -> Self {
        Self {
            name: name.to_string(),
            text: None,
        }
    }
}

impl Plugin for Constant {
    fn name(&self) -> &str {
        &self.name
    }

    fn begin_text_resource(&mut self, _: &mut Site, _: ResourceId, _: &str) -> anyhow::Result<Option<String>> {
        Ok(self.text.clone())
    }

    fn text_resource_complete(&mut self, _: &mut Site, _: ResourceId, _: &str) -> anyhow::Result<Option<String>> {
        Ok(self.text.clone())
    }
}

/// Fails in one event.
pub struct Failing {
    name: String,
    event: Event,
}

impl Failing {
    pub fn on(name: &str, event: Event) -> Self {
        Self {
            name: name.to_string(),
            event,
        }
    }

    fn check(&self, event: Event) -> anyhow::Result<()> {
        if event == self.event {
            anyhow::bail!("{} failed on purpose", self.name);
        }
        Ok(())
    }
}

impl Plugin for Failing {
    fn name(&self) -> &str {
        &self.name
    }

    fn begin_site(&mut self, _: &mut Site) -> anyhow::Result<()> {
        self.check(Event::BeginSite)
    }

    fn begin_text_resource(&mut self, _: &mut Site, _: ResourceId, _: &str) -> anyhow::Result<Option<String>> {
        self.check(Event::BeginTextResource).map(|_| None)
    }

    fn begin_binary_resource(&mut self, _: &mut Site, _: ResourceId) -> anyhow::Result<()> {
        self.check(Event::BeginBinaryResource)
    }
}
