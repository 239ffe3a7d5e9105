//! Nodes: source directories.

use std::path::{Path, PathBuf};

use super::{Metadata, ResourceId};

/// Index of a node in its `ContentTree`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(super) usize);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A source directory.
#[derive(Debug, Clone)]
pub struct Node {
    pub(super) source: PathBuf,
    pub(super) parent: Option<NodeId>,
    pub(super) children: Vec<NodeId>,
    pub(super) resources: Vec<ResourceId>,
    /// Skipped together with its subtree when false
    pub is_processable: bool,
    pub uses_template: bool,
    pub relative_deploy_path: Option<String>,
    pub meta: Metadata,
}

impl Node {
    pub(super) fn new(source: PathBuf, parent: Option<NodeId>) -> Self {
        Self {
            source,
            parent,
            children: Vec::new(),
            resources: Vec::new(),
            is_processable: true,
            uses_template: true,
            relative_deploy_path: None,
            meta: Metadata::default(),
        }
    }

    #[inline]
    pub fn source(&self) -> &Path {
        &self.source
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.source
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
    }

    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    #[inline]
    pub fn resources(&self) -> &[ResourceId] {
        &self.resources
    }
}
