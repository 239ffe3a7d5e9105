//! `depends`: explicit dependencies from metadata.
//!
//! ```text
//! +++
//! depends = ["posts/index.html", "data/menu.html"]
//! +++
//! ```

use toml::Value;

use super::add_dependency;
use crate::plugin::Plugin;
use crate::site::{ResourceId, Site};

pub struct DependsPlugin;

impl Plugin for DependsPlugin {
    fn name(&self) -> &str {
        "depends"
    }

    fn begin_site(&mut self, site: &mut Site) -> anyhow::Result<()> {
        let ids: Vec<ResourceId> = site.content().resource_ids().collect();
        for id in ids {
            let paths = match site.resource(id).meta.get("depends") {
                Some(Value::String(path)) => vec![path.clone()],
                Some(Value::Array(items)) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
                Some(other) => {
                    anyhow::bail!(
                        "`depends` of {} must be a string or a list, got {}",
                        site.content().relative_path(id),
                        other.type_str()
                    );
                }
                None => continue,
            };
            for path in paths {
                add_dependency(site, id, &path);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::Metadata;
    use crate::testing::Fixture;

    fn meta(text: &str) -> Metadata {
        Metadata::new(toml::from_str(text).unwrap())
    }

    #[test]
    fn test_string_and_list() {
        let fixture = Fixture::new();
        fixture.content("a.html", "a");
        fixture.content("b.html", "b");
        let mut site = fixture.site();
        let a = site.content().resource_from_relative_path("a.html").unwrap();
        let b = site.content().resource_from_relative_path("b.html").unwrap();
        site.set_meta(a, meta("depends = \"b.html\""));
        site.set_meta(b, meta("depends = [\"x.html\", \"y.html\", \"x.html\"]"));

        DependsPlugin.begin_site(&mut site).unwrap();
        assert_eq!(site.resource(a).depends, vec!["b.html"]);
        assert_eq!(site.resource(b).depends, vec!["x.html", "y.html"]);

        // running again does not duplicate
        DependsPlugin.begin_site(&mut site).unwrap();
        assert_eq!(site.resource(a).depends, vec!["b.html"]);
    }

    #[test]
    fn test_wrong_type_fails() {
        let fixture = Fixture::new();
        fixture.content("a.html", "a");
        let mut site = fixture.site();
        let a = site.content().resource_from_relative_path("a.html").unwrap();
        site.set_meta(a, meta("depends = 3"));
        assert!(DependsPlugin.begin_site(&mut site).is_err());
    }
}
