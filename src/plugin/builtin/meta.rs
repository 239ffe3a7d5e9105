//! `meta`: node and resource metadata.
//!
//! - `_meta.toml` inside a folder becomes the node's metadata; the file
//!   itself is never deployed.
//! - `+++` TOML front matter of a text resource becomes its metadata and is
//!   stripped before the text reaches later plugins or templates.

use anyhow::Context;
use std::fs;

use crate::plugin::Plugin;
use crate::site::meta::{parse_front_matter, split_front_matter};
use crate::site::{Metadata, NodeId, ResourceId, Site};

/// Node metadata file name.
pub const NODE_META_FILE: &str = "_meta.toml";

pub struct MetaPlugin;

impl MetaPlugin {
    fn load_node_meta(site: &mut Site, node: NodeId) -> anyhow::Result<()> {
        let Some(file) = site
            .node(node)
            .resources()
            .iter()
            .copied()
            .find(|&id| site.resource(id).name() == NODE_META_FILE)
        else {
            return Ok(());
        };

        let path = site.resource(file).source().to_path_buf();
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let table: toml::Table =
            toml::from_str(&text).with_context(|| format!("invalid {}", path.display()))?;

        site.content_mut().node_mut(node).meta = Metadata::new(table);
        site.set_processable(file, false);
        Ok(())
    }

    /// Replace resource metadata with its front matter (empty without one).
    fn load_front_matter(site: &mut Site, id: ResourceId, text: &str) -> anyhow::Result<()> {
        let parsed = parse_front_matter(text).with_context(|| {
            format!("invalid front matter in {}", site.content().relative_path(id))
        })?;
        site.set_meta(id, parsed.map(|(meta, _)| meta).unwrap_or_default());
        Ok(())
    }
}

impl Plugin for MetaPlugin {
    fn name(&self) -> &str {
        "meta"
    }

    fn begin_site(&mut self, site: &mut Site) -> anyhow::Result<()> {
        let root = site.content().root();
        for node in site.content().walk_nodes(root) {
            Self::load_node_meta(site, node)?;
        }

        let texts: Vec<ResourceId> = site
            .content()
            .resource_ids()
            .filter(|&id| {
                let resource = site.resource(id);
                resource.is_processable && resource.is_text()
            })
            .collect();
        for id in texts {
            let path = site.resource(id).source().to_path_buf();
            let text = fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Self::load_front_matter(site, id, &text)?;
        }
        Ok(())
    }

    fn begin_text_resource(
        &mut self,
        site: &mut Site,
        resource: ResourceId,
        text: &str,
    ) -> anyhow::Result<Option<String>> {
        // keep metadata current for single-resource regeneration
        Self::load_front_matter(site, resource, text)?;
        Ok(split_front_matter(text).map(|(_, body)| body.to_string()))
    }
}
