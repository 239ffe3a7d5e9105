//! `auto_extend`: layouts named in metadata.
//!
//! A resource (or any enclosing `_meta.toml`) with `extends = "base.html"` is
//! wrapped before rendering:
//!
//! ```text
//! {% extends "base.html" %}{% block content %}<original text>{% endblock %}
//! ```
//!
//! `default_block` picks another block name. Text that already extends
//! something is left alone.

use toml::Value;

use super::{add_dependency, templated_text};
use crate::plugin::Plugin;
use crate::site::{ResourceId, Site};

const DEFAULT_BLOCK: &str = "content";

pub struct AutoExtendPlugin;

impl AutoExtendPlugin {
    fn layout(site: &Site, id: ResourceId) -> Option<String> {
        site.meta_value(id, "extends")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

impl Plugin for AutoExtendPlugin {
    fn name(&self) -> &str {
        "auto_extend"
    }

    fn begin_site(&mut self, site: &mut Site) -> anyhow::Result<()> {
        for id in templated_text(site) {
            if let Some(layout) = Self::layout(site, id) {
                add_dependency(site, id, &layout);
            }
        }
        Ok(())
    }

    fn begin_text_resource(
        &mut self,
        site: &mut Site,
        resource: ResourceId,
        text: &str,
    ) -> anyhow::Result<Option<String>> {
        let Some(layout) = Self::layout(site, resource) else {
            return Ok(None);
        };
        if text.contains("{% extends") || text.contains("{%- extends") {
            return Ok(None);
        }
        let block = site
            .meta_value(resource, "default_block")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_BLOCK);
        Ok(Some(format!(
            "{{% extends \"{layout}\" %}}{{% block {block} %}}{text}{{% endblock %}}"
        )))
    }
}
