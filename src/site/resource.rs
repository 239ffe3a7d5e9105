//! Resources: source files.

use std::path::{Path, PathBuf};

use super::{ContentKind, Metadata, NodeId};

/// Index of a resource in its `ContentTree`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub(super) usize);

impl ResourceId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A source file, owned by exactly one node.
///
/// The relative source path is derived from `source` and the tree root
/// (`ContentTree::relative_path`); the deploy path override lives here but is
/// only changed through `ContentTree::set_relative_deploy_path`, which keeps the
/// deploy index in sync.
#[derive(Debug, Clone)]
pub struct Resource {
    pub(super) source: PathBuf,
    pub(super) node: NodeId,
    pub(super) kind: ContentKind,
    pub(super) relative_deploy_path: Option<String>,
    pub(super) is_media: bool,
    pub is_processable: bool,
    pub uses_template: bool,
    /// Copied verbatim: no template, no text hooks
    pub simple_copy: bool,
    /// Explicit dependency paths, set by plugins
    pub depends: Vec<String>,
    pub meta: Metadata,
}

impl Resource {
    pub(super) fn new(source: PathBuf, node: NodeId, kind: ContentKind) -> Self {
        Self {
            source,
            node,
            kind,
            relative_deploy_path: None,
            is_media: false,
            is_processable: true,
            uses_template: true,
            simple_copy: false,
            depends: Vec::new(),
            meta: Metadata::default(),
        }
    }

    #[inline]
    pub fn source(&self) -> &Path {
        &self.source
    }

    #[inline]
    pub fn node(&self) -> NodeId {
        self.node
    }

    #[inline]
    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    /// Text resources that are not simple copies go through the text path.
    #[inline]
    pub fn is_text(&self) -> bool {
        self.kind.is_text() && !self.simple_copy
    }

    #[inline]
    pub fn is_media(&self) -> bool {
        self.is_media
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.source
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
    }

    /// Deploy path override, if one was set.
    #[inline]
    pub fn deploy_override(&self) -> Option<&str> {
        self.relative_deploy_path.as_deref()
    }
}
