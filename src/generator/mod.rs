//! Incremental generation engine.
//!
//! # States
//!
//! ```text
//! Uninitialized ─► TemplateLoading ─► SiteLoading ─► Generating ─► Idle
//!                                                        ▲           │
//!                                                        └───────────┘
//! ```
//!
//! One `Generator` lives for a whole session (a build, or a watch loop) and
//! is called serially. Template and site are loaded lazily and reused until
//! `reload` or a config change.
//!
//! # Entry points
//!
//! | Call                 | Scope             | Site events                  | On `GenerationError`  |
//! |----------------------|-------------------|------------------------------|-----------------------|
//! | `generate_all`       | every node        | always                       | propagate             |
//! | `generate_node`      | one subtree       | once per loaded site         | one full rebuild      |
//! | `generate_resource`  | one resource      | once per loaded site         | one full rebuild      |
//!
//! # Staleness
//!
//! A resource is regenerated in incremental mode when its target is missing,
//! older than its source, older than the config file, or (for templated text)
//! older than any dependency. Unknown dependencies count as changed.

mod context;

pub use context::for_resource as resource_context;

use rustc_hash::FxHashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::SiteConfig;
use crate::deps::{DependencySet, DependencyTracker};
use crate::error::{Error, GenerationError, Result, chain};
use crate::fs::{File, normalize_key};
use crate::logger::plural;
use crate::plugin::{PluginBus, registry};
use crate::site::{NodeId, ResourceId, Site};
use crate::template::{TemplateEngine, TeraTemplate, TextHooks};
use crate::{debug, log};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorState {
    Uninitialized,
    TemplateLoading,
    SiteLoading,
    Generating,
    Idle,
}

/// Counters for the last generation call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationStats {
    pub rendered: usize,
    pub copied: usize,
    pub skipped: usize,
}

impl GenerationStats {
    #[inline]
    pub fn processed(&self) -> usize {
        self.rendered + self.copied
    }

    pub fn add(&mut self, other: GenerationStats) {
        self.rendered += other.rendered;
        self.copied += other.copied;
        self.skipped += other.skipped;
    }
}

pub struct Generator {
    config: Arc<SiteConfig>,
    site: Site,
    template: Box<dyn TemplateEngine>,
    plugins: PluginBus,
    /// Rebuild the bus from config on reload
    plugins_from_config: bool,
    deps: DependencyTracker,
    /// Resources whose dependency entry was refreshed during this call
    computed: FxHashSet<String>,
    state: GeneratorState,
    template_loaded: bool,
    /// `begin_site` already fired for the loaded site
    site_begun: bool,
    config_mtime: Option<std::time::SystemTime>,
    generated_once: bool,
    stats: GenerationStats,
}

impl Generator {
    pub fn new(config: Arc<SiteConfig>, template: Box<dyn TemplateEngine>, plugins: PluginBus) -> Self {
        let deps = DependencyTracker::load(config.deps_path());
        Self {
            site: Site::new(Arc::clone(&config)),
            config_mtime: config.last_modified(),
            config,
            template,
            plugins,
            plugins_from_config: false,
            deps,
            computed: FxHashSet::default(),
            state: GeneratorState::Uninitialized,
            template_loaded: false,
            site_begun: false,
            generated_once: false,
            stats: GenerationStats::default(),
        }
    }

    /// Generator with the Tera engine and the configured plugins.
    pub fn from_config(config: Arc<SiteConfig>) -> Result<Self> {
        let plugins = registry::load_all(&config)?;
        let mut generator = Self::new(config, Box::new(TeraTemplate::new()), plugins);
        generator.plugins_from_config = true;
        Ok(generator)
    }

    #[inline]
    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    #[inline]
    pub fn site(&self) -> &Site {
        &self.site
    }

    #[inline]
    pub fn site_mut(&mut self) -> &mut Site {
        &mut self.site
    }

    #[inline]
    pub fn state(&self) -> GeneratorState {
        self.state
    }

    #[inline]
    pub fn stats(&self) -> GenerationStats {
        self.stats
    }

    #[inline]
    pub fn generated_once(&self) -> bool {
        self.generated_once
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Force template and site to be reloaded on the next call.
    pub fn reload(&mut self) {
        debug!("generate"; "site marked for reload");
        self.site = Site::new(Arc::clone(&self.config));
        self.template_loaded = false;
        self.site_begun = false;
    }

    /// Reload configuration if the config file changed on disk.
    ///
    /// Returns true if a reload happened.
    pub fn reload_if_needed(&mut self) -> Result<bool> {
        let Some(path) = self.config.config_path.clone() else {
            return Ok(false);
        };
        let mtime = crate::fs::get_mtime(&path);
        if mtime == self.config_mtime {
            return Ok(false);
        }

        log!("generate"; "{} changed, reloading", path.display());
        let config = Arc::new(SiteConfig::load(&path)?);
        if self.plugins_from_config {
            self.plugins = registry::load_all(&config)?;
        }
        self.config = config;
        self.config_mtime = mtime;
        self.reload();
        Ok(true)
    }

    pub fn load_template_if_needed(&mut self) -> Result<()> {
        if self.template_loaded {
            return Ok(());
        }
        self.state = GeneratorState::TemplateLoading;
        debug!("generate"; "configuring {} templates", self.template.name());
        self.template.configure(&self.site)?;
        self.plugins.template_loaded(&mut self.site, self.template.as_ref())?;
        self.template_loaded = true;
        Ok(())
    }

    /// Load template and site unless already loaded.
    pub fn load_site_if_needed(&mut self) -> Result<()> {
        self.load_template_if_needed()?;
        if self.site.is_loaded() {
            return Ok(());
        }
        self.state = GeneratorState::SiteLoading;
        self.site.load()?;
        self.computed.clear();
        crate::site::log_summary(&self.site);
        Ok(())
    }

    /// Load the site and let plugins prepare it (`begin_site`), without
    /// generating anything.
    ///
    /// Explicit dependencies are registered by plugins at this point.
    pub fn begin_site_if_needed(&mut self) -> Result<()> {
        self.load_site_if_needed()?;
        if !self.site_begun {
            self.begin_site()?;
        }
        Ok(())
    }

    /// Fire `begin_site`. Explicit dependencies start out empty so plugins
    /// register them from current metadata only.
    fn begin_site(&mut self) -> Result<()> {
        let ids: Vec<ResourceId> = self.site.content().resource_ids().collect();
        for id in ids {
            self.site.set_depends(id, Vec::new());
        }
        self.plugins.begin_site(&mut self.site)?;
        self.site_begun = true;
        Ok(())
    }

    // ========================================================================
    // Generation
    // ========================================================================

    /// Generate every node of the site.
    pub fn generate_all(&mut self, incremental: bool) -> Result<()> {
        self.begin_call();
        self.reload_if_needed()?;
        self.load_site_if_needed()?;
        log!("generate"; "generating {}{}",
            self.config.content_root().display(),
            if incremental { " (incremental)" } else { "" });

        self.state = GeneratorState::Generating;
        let result = self.generate_everything(incremental);
        self.state = GeneratorState::Idle;
        result?;

        self.generated_once = true;
        log!("generate"; "{} rendered, {} copied, {} skipped",
            plural(self.stats.rendered, "resource"),
            self.stats.copied,
            self.stats.skipped);
        Ok(())
    }

    /// Generate one node and its subtree.
    ///
    /// `None` (or a non-incremental call before any full pass) generates the
    /// whole site. A `GenerationError` triggers exactly one full rebuild.
    pub fn generate_node(&mut self, node: Option<NodeId>, incremental: bool) -> Result<()> {
        let Some(node) = node else {
            return self.generate_all(incremental);
        };
        if !self.generated_once && !incremental {
            return self.generate_all(incremental);
        }

        self.begin_call();
        if self.reload_if_needed()? {
            return self.generate_all(incremental);
        }
        let result = self.load_site_if_needed().and_then(|()| {
            debug!("generate"; "generating node {}", self.site.content().node_relative_path(node));
            self.state = GeneratorState::Generating;
            self.with_events(None, |g| g.visit_subtree(node, incremental))
        });
        self.recover(result)
    }

    /// Generate a single resource.
    ///
    /// Same delegation and fallback rules as `generate_node`.
    pub fn generate_resource(&mut self, resource: Option<ResourceId>, incremental: bool) -> Result<()> {
        let Some(id) = resource else {
            return self.generate_all(incremental);
        };
        if !self.generated_once && !incremental {
            return self.generate_all(incremental);
        }

        self.begin_call();
        if self.reload_if_needed()? {
            return self.generate_all(incremental);
        }
        let result = self.load_site_if_needed().and_then(|()| {
            self.state = GeneratorState::Generating;
            let node = self.site.resource(id).node();
            self.with_events(Some(node), |g| g.process_resource(id, incremental))
        });
        self.recover(result)
    }

    /// `generate_node` for a folder path (relative paths are site-root based).
    pub fn generate_node_at_path(&mut self, path: &Path, incremental: bool) -> Result<()> {
        self.load_site_if_needed()?;
        let path = self.absolute(path);
        let node = self.site.content().node_from_path(&path);
        if node.is_none() {
            debug!("generate"; "no node at {}, generating everything", path.display());
        }
        self.generate_node(node, incremental)
    }

    /// `generate_resource` for a file path (relative paths are site-root based).
    pub fn generate_resource_at_path(&mut self, path: &Path, incremental: bool) -> Result<()> {
        self.load_site_if_needed()?;
        let path = self.absolute(path);
        let resource = self.site.content().resource_from_path(&path);
        if resource.is_none() {
            debug!("generate"; "no resource at {}, generating everything", path.display());
        }
        self.generate_resource(resource, incremental)
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.config.root().join(path)
        }
    }

    fn begin_call(&mut self) {
        self.computed.clear();
        self.stats = GenerationStats::default();
    }

    /// Partial generation failed: rebuild everything once.
    fn recover(&mut self, result: Result<()>) -> Result<()> {
        self.state = GeneratorState::Idle;
        match result {
            Err(err) if err.is_generation() => {
                log!("error"; "{}", chain(&err));
                log!("generate"; "falling back to full generation");
                self.reload();
                self.generate_all(false)
            }
            other => other,
        }
    }

    fn generate_everything(&mut self, incremental: bool) -> Result<()> {
        self.plugins.begin_generation(&mut self.site)?;
        self.begin_site()?;
        let root = self.site.content().root();
        self.visit_subtree(root, incremental)?;
        self.plugins.site_complete(&mut self.site)?;
        self.plugins.generation_complete(&mut self.site)
    }

    /// Fire `begin_site` (and `begin_node`) around `body` unless the loaded
    /// site was already begun.
    fn with_events<F>(&mut self, node: Option<NodeId>, body: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let first = !self.site_begun;
        if first {
            self.begin_site()?;
            if let Some(node) = node {
                self.plugins.begin_node(&mut self.site, node)?;
            }
        }
        body(self)?;
        if first {
            if let Some(node) = node {
                self.plugins.node_complete(&mut self.site, node)?;
            }
            self.plugins.site_complete(&mut self.site)?;
        }
        Ok(())
    }

    /// Visit `from` and its descendants, pre-order. Nodes that are not
    /// processable are skipped with their subtrees.
    fn visit_subtree(&mut self, from: NodeId, incremental: bool) -> Result<()> {
        let mut stack = vec![from];
        while let Some(node) = stack.pop() {
            if !self.site.node(node).is_processable {
                debug!("generate"; "skipping folder {}", self.site.content().node_relative_path(node));
                continue;
            }
            self.plugins.begin_node(&mut self.site, node)?;
            let resources = self.site.node(node).resources().to_vec();
            for id in resources {
                self.process_resource(id, incremental)?;
            }
            self.plugins.node_complete(&mut self.site, node)?;
            stack.extend(self.site.node(node).children().iter().rev());
        }
        Ok(())
    }

    // ========================================================================
    // Per-resource processing
    // ========================================================================

    fn process_resource(&mut self, id: ResourceId, incremental: bool) -> Result<()> {
        let relative = self.site.content().relative_path(id);
        if !self.site.resource(id).is_processable {
            debug!("generate"; "not processable: {}", relative);
            return Ok(());
        }
        if incremental && !self.has_resource_changed(id) {
            debug!("generate"; "unchanged: {}", relative);
            self.stats.skipped += 1;
            return Ok(());
        }

        debug!("generate"; "processing {}", relative);
        let result = if self.site.resource(id).is_text() {
            self.process_text(id)
        } else {
            self.process_binary(id)
        };
        if let Err(err) = &result {
            log!("error"; "failed to generate {}: {}", relative, chain(err));
        }
        result
    }

    fn process_text(&mut self, id: ResourceId) -> Result<()> {
        let text = if self.site.resource(id).uses_template {
            let text = self.template.render_resource(
                &mut self.site,
                id,
                &context::for_resource,
                &mut self.plugins,
            )?;
            self.refresh_dependencies(id);
            text
        } else {
            let source = File::new(self.site.resource(id).source());
            let text = source
                .read_all()
                .map_err(|e| io_error(source.path(), e))?;
            self.plugins.preprocess(&mut self.site, id, text)?
        };
        let text = self.plugins.postprocess(&mut self.site, id, text)?;

        let target = self.target(id);
        target.write(&text).map_err(|e| io_error(target.path(), e))?;
        self.stats.rendered += 1;
        Ok(())
    }

    fn process_binary(&mut self, id: ResourceId) -> Result<()> {
        self.plugins.begin_binary_resource(&mut self.site, id)?;
        let source = File::new(self.site.resource(id).source());
        let target = self.target(id);
        source
            .copy_to(&target)
            .map_err(|e| io_error(target.path(), e))?;
        self.plugins.binary_resource_complete(&mut self.site, id)?;
        self.stats.copied += 1;
        Ok(())
    }

    /// Output file of a resource.
    fn target(&self, id: ResourceId) -> File {
        let deploy_path = self.site.content().relative_deploy_path(id);
        File::new(self.config.deploy_root().join(deploy_path))
    }

    // ========================================================================
    // Change detection
    // ========================================================================

    /// Whether `id` needs regenerating.
    pub fn has_resource_changed(&mut self, id: ResourceId) -> bool {
        let source = File::new(self.site.resource(id).source());
        let target = self.target(id);
        let relative = self.site.content().relative_path(id);

        if !target.exists() {
            debug!("generate"; "{}: no target", relative);
            return true;
        }
        if target.older_than(&source) {
            debug!("generate"; "{}: source is newer", relative);
            return true;
        }
        if let Some(config) = self.config.config_path.as_deref()
            && target.older_than(&File::new(config))
        {
            debug!("generate"; "{}: config is newer", relative);
            return true;
        }

        let resource = self.site.resource(id);
        if !resource.is_text() || !resource.uses_template {
            return false;
        }

        let deps = self.dependency_set(id);
        if deps.is_unresolved() {
            debug!("generate"; "{}: unresolved dependencies", relative);
            return true;
        }
        for dep in deps.paths() {
            let Some(path) = self.locate_dependency(dep) else {
                debug!("generate"; "{}: dependency {} not found", relative, dep);
                return true;
            };
            if target.older_than(&File::new(path)) {
                debug!("generate"; "{}: dependency {} is newer", relative, dep);
                return true;
            }
        }
        false
    }

    /// A dependency path on disk: layout folder first, then content.
    fn locate_dependency(&self, dep: &str) -> Option<PathBuf> {
        [self.config.layout_root(), self.config.content_root()]
            .into_iter()
            .map(|root| root.join(dep))
            .find(|path| path.is_file())
    }

    // ========================================================================
    // Dependencies
    // ========================================================================

    /// Dependency closure of `id`, without the unresolved sentinel.
    pub fn get_dependencies(&mut self, id: ResourceId) -> Vec<String> {
        self.dependency_set(id).to_vec()
    }

    /// Resources whose recorded dependencies include `path`.
    pub fn dependents_of(&self, path: &str) -> Vec<String> {
        self.deps.dependents_of(&normalize_key(path))
    }

    /// Cached dependency set of `id`, computed on a miss.
    fn dependency_set(&mut self, id: ResourceId) -> DependencySet {
        let relative = self.site.content().relative_path(id);
        if let Some(set) = self.deps.get(&relative) {
            return set.clone();
        }
        debug!("deps"; "computing dependencies of {}", relative);
        self.compute_dependencies(id, relative)
    }

    /// Recompute the entry of a rendered resource once per call.
    fn refresh_dependencies(&mut self, id: ResourceId) {
        let relative = self.site.content().relative_path(id);
        if !self.computed.contains(&relative) {
            self.compute_dependencies(id, relative);
        }
    }

    fn compute_dependencies(&mut self, id: ResourceId, relative: String) -> DependencySet {
        let set = self.dependency_closure(id, &relative);
        self.deps.insert(relative.clone(), set.clone());
        self.computed.insert(relative);
        set
    }

    /// Explicit `depends` (followed through their own `depends`), each
    /// expanded by the template engine, plus the resource's own template
    /// dependencies.
    fn dependency_closure(&self, id: ResourceId, relative: &str) -> DependencySet {
        let content = self.site.content();
        let mut set = self.template.get_dependencies(relative);
        let mut seen = FxHashSet::default();
        seen.insert(relative.to_string());

        let mut queue: Vec<String> = self.site.resource(id).depends.clone();
        while let Some(dep) = queue.pop() {
            let dep = normalize_key(&dep);
            if !seen.insert(dep.clone()) {
                continue;
            }
            set.extend(&self.template.get_dependencies(&dep));
            if let Some(other) = content.resource_from_relative_path(&dep) {
                queue.extend(content.resource(other).depends.iter().cloned());
            }
            set.insert(dep);
        }
        set.remove(relative);
        set
    }

    /// Persist the dependency map now (it is also saved on drop).
    pub fn save_dependencies(&mut self) -> Result<()> {
        self.deps
            .save()
            .map_err(|e| Error::io(self.deps.path().to_path_buf(), e))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> Error {
    GenerationError::Io {
        path: path.to_path_buf(),
        source,
    }
    .into()
}
