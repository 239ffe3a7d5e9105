//! Arena-backed content tree with path indices.
//!
//! ```text
//! nodes:      [root, posts, posts/2024]          NodeId = index
//! resources:  [about.html, posts/a.html, ...]    ResourceId = index
//!
//! node_index:      "posts/2024"   → NodeId
//! resource_index:  "posts/a.html" → ResourceId
//! deploy_index:    "a/index.html" → ResourceId   (last write wins)
//! ```
//!
//! Index keys are root-relative, `/`-separated paths; the root node's key is `""`.
//! Nodes and resources are never removed individually: a reload builds a new tree.

use rustc_hash::FxHashMap;
use std::path::{Component, Path, PathBuf};

use super::{ContentKind, Node, NodeId, Resource, ResourceId};
use crate::error::{Error, Result};
use crate::fs::{normalize_key, normalize_path, to_key};

#[derive(Debug, Clone)]
pub struct ContentTree {
    root: PathBuf,
    nodes: Vec<Node>,
    resources: Vec<Resource>,
    node_index: FxHashMap<String, NodeId>,
    resource_index: FxHashMap<String, ResourceId>,
    deploy_index: FxHashMap<String, ResourceId>,
}

impl ContentTree {
    /// Create a tree holding only the root node.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let mut node_index = FxHashMap::default();
        node_index.insert(String::new(), NodeId(0));
        Self {
            nodes: vec![Node::new(root.clone(), None)],
            root,
            resources: Vec::new(),
            node_index,
            resource_index: FxHashMap::default(),
            deploy_index: FxHashMap::default(),
        }
    }

    #[inline]
    pub fn root_path(&self) -> &Path {
        &self.root
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    #[inline]
    pub fn resource(&self, id: ResourceId) -> &Resource {
        &self.resources[id.0]
    }

    #[inline]
    pub fn resource_mut(&mut self, id: ResourceId) -> &mut Resource {
        &mut self.resources[id.0]
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    /// All resource ids, in load order.
    pub fn resource_ids(&self) -> impl Iterator<Item = ResourceId> + use<> {
        (0..self.resources.len()).map(ResourceId)
    }

    // ========================================================================
    // Paths
    // ========================================================================

    /// Root-relative key of `path`, or `None` if it lies outside the root.
    ///
    /// Relative paths are taken relative to the root.
    pub fn key_of(&self, path: &Path) -> Option<String> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };
        if let Ok(rel) = absolute.strip_prefix(&self.root)
            && !rel.components().any(|c| matches!(c, Component::ParentDir))
        {
            return Some(to_key(rel));
        }
        let normalized = normalize_path(&absolute);
        normalized.strip_prefix(&self.root).ok().map(to_key)
    }

    /// Relative source path of a resource, derived from the root.
    pub fn relative_path(&self, id: ResourceId) -> String {
        self.resource(id)
            .source
            .strip_prefix(&self.root)
            .map(to_key)
            .unwrap_or_default()
    }

    /// Relative path of a node (`""` for the root).
    pub fn node_relative_path(&self, id: NodeId) -> String {
        self.node(id)
            .source
            .strip_prefix(&self.root)
            .map(to_key)
            .unwrap_or_default()
    }

    /// Deploy path: the override if set, otherwise the relative source path.
    pub fn relative_deploy_path(&self, id: ResourceId) -> String {
        match self.resource(id).deploy_override() {
            Some(path) => path.to_string(),
            None => self.relative_path(id),
        }
    }

    /// Node deploy path: the override if set, otherwise the relative path.
    pub fn node_deploy_path(&self, id: NodeId) -> String {
        match &self.node(id).relative_deploy_path {
            Some(path) => path.clone(),
            None => self.node_relative_path(id),
        }
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    pub fn node_from_path(&self, path: &Path) -> Option<NodeId> {
        let key = self.key_of(path)?;
        self.node_index.get(&key).copied()
    }

    pub fn node_from_relative_path(&self, relative: &str) -> Option<NodeId> {
        self.node_index.get(&normalize_key(relative)).copied()
    }

    pub fn resource_from_path(&self, path: &Path) -> Option<ResourceId> {
        let key = self.key_of(path)?;
        self.resource_index.get(&key).copied()
    }

    pub fn resource_from_relative_path(&self, relative: &str) -> Option<ResourceId> {
        self.resource_index.get(&normalize_key(relative)).copied()
    }

    pub fn resource_from_relative_deploy_path(&self, relative: &str) -> Option<ResourceId> {
        self.deploy_index.get(&normalize_key(relative)).copied()
    }

    // ========================================================================
    // Construction
    // ========================================================================

    /// Get or create the node for `folder`, creating missing ancestors.
    pub fn add_node(&mut self, folder: &Path) -> Result<NodeId> {
        let Some(key) = self.key_of(folder) else {
            return Err(self.outside(folder));
        };
        if let Some(&id) = self.node_index.get(&key) {
            return Ok(id);
        }

        // Walk up to the nearest registered ancestor. The root key "" always exists.
        let mut missing = Vec::new();
        let mut current = key;
        let mut parent = loop {
            if let Some(&id) = self.node_index.get(&current) {
                break id;
            }
            let up = parent_key(&current).to_string();
            missing.push(current);
            current = up;
        };

        for key in missing.into_iter().rev() {
            let id = NodeId(self.nodes.len());
            self.nodes
                .push(Node::new(self.root.join(&key), Some(parent)));
            self.nodes[parent.0].children.push(id);
            self.node_index.insert(key, id);
            parent = id;
        }
        Ok(parent)
    }

    /// Get or create the resource for `file`, creating its node if needed.
    ///
    /// Files outside the root are rejected before any index is touched.
    pub fn add_resource(&mut self, file: &Path) -> Result<ResourceId> {
        let key = match self.key_of(file) {
            Some(key) if !key.is_empty() => key,
            _ => return Err(self.outside(file)),
        };
        if let Some(&id) = self.resource_index.get(&key) {
            return Ok(id);
        }

        let source = self.root.join(&key);
        let node = self.add_node(&self.root.join(parent_key(&key)))?;
        let kind = ContentKind::detect(&source);

        let id = ResourceId(self.resources.len());
        self.resources.push(Resource::new(source, node, kind));
        self.nodes[node.0].resources.push(id);
        self.deploy_index.insert(key.clone(), id);
        self.resource_index.insert(key, id);
        Ok(id)
    }

    /// Set a deploy path override and re-index the resource under it.
    pub fn set_relative_deploy_path(&mut self, id: ResourceId, path: &str) {
        self.resources[id.0].relative_deploy_path = Some(normalize_key(path));
        self.deploy_path_changed(id);
    }

    /// Index the resource under its current deploy path.
    ///
    /// The entry under the previous deploy path is left in place; later
    /// registrations of the same path win.
    pub fn deploy_path_changed(&mut self, id: ResourceId) {
        let key = self.relative_deploy_path(id);
        self.deploy_index.insert(key, id);
    }

    pub(super) fn set_media(&mut self, id: ResourceId, is_media: bool) {
        self.resources[id.0].is_media = is_media;
    }

    fn outside(&self, path: &Path) -> Error {
        Error::Structure {
            path: path.to_path_buf(),
            root: self.root.clone(),
        }
    }

    // ========================================================================
    // Traversal
    // ========================================================================

    /// `from` and all its descendants, depth-first pre-order.
    pub fn walk_nodes(&self, from: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.node(id).children.iter().rev());
        }
        out
    }

    /// Resources of `from` and all its descendants, in walk order.
    pub fn walk_resources(&self, from: NodeId) -> Vec<ResourceId> {
        self.walk_nodes(from)
            .into_iter()
            .flat_map(|node| self.node(node).resources.iter().copied())
            .collect()
    }

    /// Chain of ancestors of a node, nearest first, excluding the node itself.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.node(id).parent;
        while let Some(parent) = current {
            out.push(parent);
            current = self.node(parent).parent;
        }
        out
    }
}

#[inline]
fn parent_key(key: &str) -> &str {
    key.rsplit_once('/').map_or("", |(parent, _)| parent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tree() -> (TempDir, ContentTree) {
        let dir = TempDir::new().unwrap();
        let root = normalize_path(dir.path()).join("content");
        std::fs::create_dir_all(&root).unwrap();
        (dir, ContentTree::new(root))
    }

    #[test]
    fn test_parent_key() {
        assert_eq!(parent_key("a/b/c.html"), "a/b");
        assert_eq!(parent_key("a"), "");
        assert_eq!(parent_key(""), "");
    }

    #[test]
    fn test_add_node_creates_ancestor_chain() {
        let (_dir, mut tree) = tree();
        let root = tree.root_path().to_path_buf();

        let deep = tree.add_node(&root.join("a/b/c")).unwrap();
        assert_eq!(tree.node_count(), 4);
        assert_eq!(tree.node_relative_path(deep), "a/b/c");

        let b = tree.node_from_relative_path("a/b").unwrap();
        let a = tree.node_from_relative_path("a").unwrap();
        assert_eq!(tree.node(deep).parent(), Some(b));
        assert_eq!(tree.node(b).parent(), Some(a));
        assert_eq!(tree.node(a).parent(), Some(tree.root()));
        assert_eq!(tree.ancestors(deep), vec![b, a, tree.root()]);

        // idempotent
        assert_eq!(tree.add_node(&root.join("a/b/c")).unwrap(), deep);
        assert_eq!(tree.add_node(&root).unwrap(), tree.root());
        assert_eq!(tree.node_count(), 4);
    }

    #[test]
    fn test_add_node_outside_root() {
        let (dir, mut tree) = tree();
        let err = tree.add_node(&dir.path().join("elsewhere")).unwrap_err();
        assert!(matches!(err, Error::Structure { .. }));
        assert!(tree.add_node(Path::new("../escape")).is_err());
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_add_resource_outside_root_leaves_index_untouched() {
        let (dir, mut tree) = tree();
        let outside = dir.path().join("stray.html");
        std::fs::write(&outside, "x").unwrap();

        let err = tree.add_resource(&outside).unwrap_err();
        assert!(matches!(err, Error::Structure { .. }));
        assert_eq!(tree.resource_count(), 0);
        assert_eq!(tree.node_count(), 1);
        assert!(tree.resource_from_path(&outside).is_none());

        // the root folder itself is not a resource
        let root = tree.root_path().to_path_buf();
        assert!(tree.add_resource(&root).is_err());
    }

    #[test]
    fn test_add_resource_registers_node_and_indices() {
        let (_dir, mut tree) = tree();
        let root = tree.root_path().to_path_buf();
        std::fs::create_dir_all(root.join("posts")).unwrap();
        std::fs::write(root.join("posts/a.html"), "<p>a</p>").unwrap();

        let id = tree.add_resource(&root.join("posts/a.html")).unwrap();
        let node = tree.node_from_relative_path("posts").unwrap();
        assert_eq!(tree.resource(id).node(), node);
        assert_eq!(tree.node(node).resources(), &[id]);
        assert_eq!(tree.relative_path(id), "posts/a.html");
        assert_eq!(tree.resource(id).kind(), ContentKind::Text);

        assert_eq!(tree.add_resource(&root.join("posts/a.html")).unwrap(), id);
        assert_eq!(tree.resource_from_path(&root.join("posts/a.html")), Some(id));
        assert_eq!(tree.resource_from_relative_path("posts\\a.html"), Some(id));
        assert_eq!(tree.resource_from_relative_path("./posts/a.html"), Some(id));
        assert_eq!(tree.resource_from_relative_deploy_path("posts/a.html"), Some(id));
        assert_eq!(tree.resource_from_path(Path::new("posts/a.html")), Some(id));
    }

    #[test]
    fn test_deploy_path_override_is_last_wins() {
        let (_dir, mut tree) = tree();
        let root = tree.root_path().to_path_buf();
        std::fs::write(root.join("a.html"), "a").unwrap();
        std::fs::write(root.join("b.html"), "b").unwrap();
        let a = tree.add_resource(&root.join("a.html")).unwrap();
        let b = tree.add_resource(&root.join("b.html")).unwrap();

        tree.set_relative_deploy_path(a, "pages/a/index.html");
        assert_eq!(tree.relative_deploy_path(a), "pages/a/index.html");
        assert_eq!(tree.relative_path(a), "a.html");
        assert_eq!(tree.resource_from_relative_deploy_path("pages/a/index.html"), Some(a));
        // stale entry stays
        assert_eq!(tree.resource_from_relative_deploy_path("a.html"), Some(a));

        tree.set_relative_deploy_path(b, "pages/a/index.html");
        assert_eq!(tree.resource_from_relative_deploy_path("pages/a/index.html"), Some(b));
    }

    #[test]
    fn test_walk_is_depth_first() {
        let (_dir, mut tree) = tree();
        let root = tree.root_path().to_path_buf();
        let a = tree.add_node(&root.join("a")).unwrap();
        let a1 = tree.add_node(&root.join("a/one")).unwrap();
        let b = tree.add_node(&root.join("b")).unwrap();
        assert_eq!(tree.walk_nodes(tree.root()), vec![tree.root(), a, a1, b]);
        assert_eq!(tree.walk_nodes(a), vec![a, a1]);
    }

    #[test]
    fn test_lookups_never_fail() {
        let (_dir, tree) = tree();
        assert!(tree.node_from_path(Path::new("/nowhere")).is_none());
        assert!(tree.resource_from_relative_path("missing.html").is_none());
        assert!(tree.resource_from_relative_deploy_path("").is_none());
        assert_eq!(tree.node_from_relative_path(""), Some(tree.root()));
    }
}
