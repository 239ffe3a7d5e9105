//! Built-in plugins.
//!
//! | Plugin        | begin_site                               | begin_text_resource        |
//! |---------------|------------------------------------------|----------------------------|
//! | `meta`        | `_meta.toml` and front matter → metadata | strip front matter         |
//! | `depends`     | `meta.depends` → `resource.depends`      |                            |
//! | `auto_extend` | `meta.extends` → `resource.depends`      | wrap in extends/block      |
//! | `sorter`      | register `[sorter.*]`, compute neighbors |                            |

mod auto_extend;
mod depends;
mod meta;
mod sorter;

pub use auto_extend::AutoExtendPlugin;
pub use depends::DependsPlugin;
pub use meta::MetaPlugin;
pub use sorter::SorterPlugin;

use crate::site::{ResourceId, Site};

/// Processable text resources that go through templates.
fn templated_text(site: &Site) -> Vec<ResourceId> {
    site.content()
        .resource_ids()
        .filter(|&id| {
            let resource = site.resource(id);
            resource.is_processable && resource.uses_template && resource.is_text()
        })
        .collect()
}

/// Add `path` to the explicit dependencies of `id` unless already present.
fn add_dependency(site: &mut Site, id: ResourceId, path: &str) {
    let depends = &mut site.content_mut().resource_mut(id).depends;
    if !depends.iter().any(|d| d == path) {
        depends.push(path.to_string());
    }
}
