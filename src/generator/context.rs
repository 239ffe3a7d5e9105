//! Template context for a resource.
//!
//! ```text
//! {
//!   <[context] values>,
//!   "site":     { base_url, media_url, mode, meta, sorted: { <sorter>: [summary] } },
//!   "node":     { name, path, url, meta },
//!   "resource": { name, path, deploy_path, url, meta, depends, neighbors: { <sorter>: { prev, next } } }
//! }
//! ```

use serde_json::{Map, Value as JsonValue, json};

use crate::site::meta::{table_to_json, to_json};
use crate::site::{NodeId, ResourceId, Site};

/// Full context for rendering `id`.
pub fn for_resource(site: &Site, id: ResourceId) -> JsonValue {
    let mut root: Map<String, JsonValue> = site
        .config()
        .context
        .iter()
        .map(|(key, value)| (key.clone(), to_json(value)))
        .collect();

    let node = site.resource(id).node();
    root.insert("site".into(), site_json(site));
    root.insert("node".into(), node_json(site, node));
    root.insert("resource".into(), resource_json(site, id));
    JsonValue::Object(root)
}

fn site_json(site: &Site) -> JsonValue {
    let config = site.config();
    let root = site.content().root();
    let sorted: Map<String, JsonValue> = site
        .sorter_names()
        .filter_map(|name| {
            let ids = site.walk_resources_sorted(root, name)?;
            let list = ids.into_iter().map(|id| summary(site, id)).collect();
            Some((name.to_string(), JsonValue::Array(list)))
        })
        .collect();

    json!({
        "base_url": config.site.base_url,
        "media_url": config.site.media_url,
        "mode": config.site.mode,
        "meta": table_to_json(&config.meta),
        "sorted": sorted,
    })
}

fn node_json(site: &Site, node: NodeId) -> JsonValue {
    let content = site.content();
    json!({
        "name": content.node(node).name(),
        "path": content.node_relative_path(node),
        "url": site.content_url(&content.node_deploy_path(node)),
        "meta": table_to_json(&site.node_effective_meta(node)),
    })
}

fn resource_json(site: &Site, id: ResourceId) -> JsonValue {
    let content = site.content();
    let resource = content.resource(id);

    let neighbors: Map<String, JsonValue> = site
        .sorter_names()
        .map(|name| {
            let (prev, next) = site.neighbors(id, name);
            let link = |other: Option<ResourceId>| other.map_or(JsonValue::Null, |o| summary(site, o));
            (name.to_string(), json!({ "prev": link(prev), "next": link(next) }))
        })
        .collect();

    json!({
        "name": resource.name(),
        "path": content.relative_path(id),
        "deploy_path": content.relative_deploy_path(id),
        "url": site.resource_url(id),
        "meta": table_to_json(&site.effective_meta(id)),
        "depends": resource.depends,
        "neighbors": neighbors,
    })
}

/// Short description of a resource for listings and links.
fn summary(site: &Site, id: ResourceId) -> JsonValue {
    json!({
        "name": site.resource(id).name(),
        "path": site.content().relative_path(id),
        "url": site.resource_url(id),
        "meta": table_to_json(site.resource(id).meta.table()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::{Metadata, SortStrategy};
    use crate::testing::Fixture;

    #[test]
    fn test_context_shape() {
        let mut fixture = Fixture::new();
        fixture.config.context = toml::from_str("title = \"My site\"").unwrap();
        fixture.config.meta = toml::from_str("author = \"me\"").unwrap();
        fixture.content("posts/a.html", "a");
        fixture.content("posts/b.html", "b");
        let mut site = fixture.site();
        let a = site.content().resource_from_relative_path("posts/a.html").unwrap();
        let b = site.content().resource_from_relative_path("posts/b.html").unwrap();
        site.set_meta(a, Metadata::new(toml::from_str("title = \"A\"").unwrap()));
        site.register_sorter("name", SortStrategy::by("name"));
        site.compute_neighbors("name");

        let ctx = for_resource(&site, a);
        assert_eq!(ctx["title"], "My site");
        assert_eq!(ctx["site"]["base_url"], "/");
        assert_eq!(ctx["site"]["sorted"]["name"][1]["path"], "posts/b.html");
        assert_eq!(ctx["node"]["path"], "posts");
        assert_eq!(ctx["node"]["meta"]["author"], "me");
        assert_eq!(ctx["resource"]["url"], "/posts/a.html");
        assert_eq!(ctx["resource"]["meta"]["title"], "A");
        assert_eq!(ctx["resource"]["meta"]["author"], "me");
        assert!(ctx["resource"]["neighbors"]["name"]["prev"].is_null());
        assert_eq!(ctx["resource"]["neighbors"]["name"]["next"]["name"], "b.html");

        let ctx = for_resource(&site, b);
        assert_eq!(ctx["resource"]["neighbors"]["name"]["prev"]["name"], "a.html");
    }
}
