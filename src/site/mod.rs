//! Site model: the in-memory tree of nodes (folders) and resources (files).
//!
//! # Structure
//!
//! ```text
//! Site
//! ├── config          Arc<SiteConfig>
//! ├── content         ContentTree (arena + path indices)
//! ├── sorters         name → SortStrategy
//! ├── neighbors       sorter name → resource → (prev, next)
//! └── initialized     once-per-load flags for plugins
//! ```
//!
//! Resources refer to their node by `NodeId`; nodes list their children and
//! resources by id. The tree owns everything, so a reload simply replaces it.

mod kind;
pub mod meta;
mod node;
mod resource;
mod sort;
mod tree;
pub mod url;

pub use kind::ContentKind;
pub use meta::Metadata;
pub use node::{Node, NodeId};
pub use resource::{Resource, ResourceId};
pub use sort::{SortKey, SortStrategy, compare_keys};
pub use tree::ContentTree;

use jwalk::{Parallelism, WalkDir};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeMap;
use std::io;
use std::sync::Arc;
use toml::Value;

use crate::config::{ConfigError, SiteConfig};
use crate::error::{Error, Result};
use crate::fs::to_key;
use crate::{debug, log};

/// Previous and next resource under a sort strategy.
pub type Neighbors = (Option<ResourceId>, Option<ResourceId>);

#[derive(Debug, Clone)]
pub struct Site {
    config: Arc<SiteConfig>,
    content: ContentTree,
    sorters: BTreeMap<String, SortStrategy>,
    neighbors: FxHashMap<String, FxHashMap<ResourceId, Neighbors>>,
    initialized: FxHashSet<String>,
    loaded: bool,
}

impl Site {
    /// An empty site; call `load` to walk the content folder.
    pub fn new(config: Arc<SiteConfig>) -> Self {
        let content = ContentTree::new(config.content_root());
        Self {
            config,
            content,
            sorters: BTreeMap::new(),
            neighbors: FxHashMap::default(),
            initialized: FxHashSet::default(),
            loaded: false,
        }
    }

    #[inline]
    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    #[inline]
    pub fn config_arc(&self) -> Arc<SiteConfig> {
        Arc::clone(&self.config)
    }

    #[inline]
    pub fn content(&self) -> &ContentTree {
        &self.content
    }

    #[inline]
    pub fn content_mut(&mut self) -> &mut ContentTree {
        &mut self.content
    }

    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        self.content.node(id)
    }

    #[inline]
    pub fn resource(&self, id: ResourceId) -> &Resource {
        self.content.resource(id)
    }

    // ========================================================================
    // Setters used by plugins
    // ========================================================================

    /// Override the deploy path and re-index the resource under it.
    #[inline]
    pub fn set_relative_deploy_path(&mut self, id: ResourceId, path: &str) {
        self.content.set_relative_deploy_path(id, path);
    }

    pub fn set_depends(&mut self, id: ResourceId, depends: Vec<String>) {
        self.content.resource_mut(id).depends = depends;
    }

    pub fn set_processable(&mut self, id: ResourceId, processable: bool) {
        self.content.resource_mut(id).is_processable = processable;
    }

    pub fn set_uses_template(&mut self, id: ResourceId, uses_template: bool) {
        self.content.resource_mut(id).uses_template = uses_template;
    }

    pub fn set_meta(&mut self, id: ResourceId, meta: Metadata) {
        self.content.resource_mut(id).meta = meta;
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Walk the content folder top-down and rebuild the tree.
    ///
    /// Ignored folders are not descended into. Resources whose relative path
    /// matches a `simple_copy` pattern are flagged. All per-load state
    /// (sorters, neighbors, initialized flags) is reset.
    pub fn load(&mut self) -> Result<()> {
        let root = self.config.content_root().to_path_buf();
        if !root.is_dir() {
            return Err(ConfigError::MissingSource(root).into());
        }

        let ignore = self.config.ignore_patterns()?;
        let simple_copy = self.config.simple_copy_patterns()?;
        let media_root = self.config.media_root();

        let walk_root = root.clone();
        let walker = WalkDir::new(&root)
            .parallelism(Parallelism::Serial)
            .sort(true)
            .skip_hidden(false)
            .process_read_dir(move |_depth, dir, _state, children| {
                children.retain(|entry| match entry {
                    Ok(entry) => {
                        let path = dir.join(&entry.file_name);
                        let rel = path.strip_prefix(&walk_root).map(to_key).unwrap_or_default();
                        !ignore.is_match(&rel)
                    }
                    Err(_) => true,
                });
            });

        let mut tree = ContentTree::new(&root);
        for entry in walker {
            let entry = entry.map_err(|e| Error::io(&root, io::Error::other(e)))?;
            let path = entry.path();
            let file_type = entry.file_type();
            if file_type.is_dir() {
                tree.add_node(&path)?;
            } else if file_type.is_file() {
                let id = tree.add_resource(&path)?;
                if simple_copy.is_match(&tree.relative_path(id)) {
                    let resource = tree.resource_mut(id);
                    resource.simple_copy = true;
                    resource.uses_template = false;
                }
                tree.set_media(id, path.starts_with(&media_root));
            }
        }

        debug!("site"; "loaded {} nodes, {} resources from {}",
            tree.node_count(), tree.resource_count(), root.display());

        self.content = tree;
        self.sorters.clear();
        self.neighbors.clear();
        self.initialized.clear();
        self.loaded = true;
        Ok(())
    }

    /// Returns true the first time `key` is seen since the last load.
    pub fn initialize_once(&mut self, key: &str) -> bool {
        self.initialized.insert(key.to_string())
    }

    // ========================================================================
    // URLs
    // ========================================================================

    /// URL of a content path under `site.base_url`.
    #[inline]
    pub fn content_url(&self, path: &str) -> String {
        url::content_url(&self.config, path)
    }

    /// URL of a media-relative path under `site.media_url`.
    #[inline]
    pub fn media_url(&self, path: &str) -> String {
        url::media_url(&self.config, path)
    }

    /// Media URL for paths inside the media folder, content URL otherwise.
    #[inline]
    pub fn full_url(&self, path: &str) -> String {
        url::full_url(&self.config, path)
    }

    /// URL of a resource's deploy path.
    pub fn resource_url(&self, id: ResourceId) -> String {
        self.full_url(&self.content.relative_deploy_path(id))
    }

    // ========================================================================
    // Metadata
    // ========================================================================

    /// Look up a metadata key: resource, then enclosing nodes, then `[meta]`.
    pub fn meta_value(&self, id: ResourceId, key: &str) -> Option<&Value> {
        let resource = self.content.resource(id);
        if let Some(value) = resource.meta.get(key) {
            return Some(value);
        }
        self.node_meta_value(resource.node(), key)
    }

    /// Look up a metadata key on a node, its ancestors, then `[meta]`.
    pub fn node_meta_value(&self, id: NodeId, key: &str) -> Option<&Value> {
        let mut current = Some(id);
        while let Some(node) = current {
            let node = self.content.node(node);
            if let Some(value) = node.meta.get(key) {
                return Some(value);
            }
            current = node.parent();
        }
        meta::lookup(&self.config.meta, key)
    }

    /// Flattened metadata of a resource (outermost first, resource last).
    pub fn effective_meta(&self, id: ResourceId) -> toml::Table {
        let resource = self.content.resource(id);
        let mut table = self.node_effective_meta(resource.node());
        resource.meta.overlay_onto(&mut table);
        table
    }

    pub fn node_effective_meta(&self, id: NodeId) -> toml::Table {
        let mut table = self.config.meta.clone();
        let mut chain = self.content.ancestors(id);
        chain.reverse();
        chain.push(id);
        for node in chain {
            self.content.node(node).meta.overlay_onto(&mut table);
        }
        table
    }

    // ========================================================================
    // Sort strategies
    // ========================================================================

    pub fn register_sorter(&mut self, name: impl Into<String>, strategy: SortStrategy) {
        self.sorters.insert(name.into(), strategy);
    }

    #[inline]
    pub fn sorter(&self, name: &str) -> Option<&SortStrategy> {
        self.sorters.get(name)
    }

    pub fn sorter_names(&self) -> impl Iterator<Item = &str> {
        self.sorters.keys().map(String::as_str)
    }

    /// Attribute value used by sort strategies.
    ///
    /// `name`, `relative_path`, `deploy_path`, `kind`, `is_processable`, or `meta.<key>`.
    pub fn attribute(&self, id: ResourceId, attr: &str) -> Option<Value> {
        let resource = self.content.resource(id);
        match attr {
            "name" => Some(Value::String(resource.name().to_string())),
            "relative_path" => Some(Value::String(self.content.relative_path(id))),
            "deploy_path" => Some(Value::String(self.content.relative_deploy_path(id))),
            "kind" => Some(Value::String(resource.kind().name().to_string())),
            "is_processable" => Some(Value::Boolean(resource.is_processable)),
            _ => {
                let key = attr.strip_prefix("meta.")?;
                self.meta_value(id, key).cloned()
            }
        }
    }

    /// Resources under `node` that pass the strategy filters, in strategy order.
    ///
    /// Returns `None` if no strategy is registered under `name`.
    pub fn walk_resources_sorted(&self, node: NodeId, name: &str) -> Option<Vec<ResourceId>> {
        let strategy = self.sorters.get(name)?;
        let mut keyed: Vec<(Vec<SortKey>, ResourceId)> = self
            .content
            .walk_resources(node)
            .into_iter()
            .filter(|&id| {
                strategy
                    .filters
                    .iter()
                    .all(|(attr, expected)| self.attribute(id, attr).as_ref() == Some(expected))
            })
            .map(|id| {
                let keys = strategy
                    .attrs
                    .iter()
                    .map(|attr| SortKey::from_value(self.attribute(id, attr).as_ref()))
                    .collect();
                (keys, id)
            })
            .collect();

        keyed.sort_by(|(a, _), (b, _)| compare_keys(a, b));
        if strategy.reverse {
            keyed.reverse();
        }
        Some(keyed.into_iter().map(|(_, id)| id).collect())
    }

    /// Compute prev/next links for every resource sorted under `name`.
    pub fn compute_neighbors(&mut self, name: &str) {
        let Some(order) = self.walk_resources_sorted(self.content.root(), name) else {
            return;
        };
        let mut links = FxHashMap::default();
        for (i, &id) in order.iter().enumerate() {
            let prev = i.checked_sub(1).map(|p| order[p]);
            let next = order.get(i + 1).copied();
            links.insert(id, (prev, next));
        }
        self.neighbors.insert(name.to_string(), links);
    }

    /// Previous and next resources of `id` under the sorter `name`.
    pub fn neighbors(&self, id: ResourceId, name: &str) -> Neighbors {
        self.neighbors
            .get(name)
            .and_then(|links| links.get(&id))
            .copied()
            .unwrap_or((None, None))
    }
}

/// Log a short summary of a loaded site.
pub fn log_summary(site: &Site) {
    log!("site"; "{} in {}, {}",
        crate::logger::plural(site.content().resource_count(), "resource"),
        crate::logger::plural(site.content().node_count(), "folder"),
        site.config().content_root().display());
}
