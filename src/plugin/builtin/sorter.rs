//! `sorter`: named sort strategies from `[sorter.<name>]`.
//!
//! Strategies are registered on the site once per load, then prev/next
//! neighbors are computed for each of them.

use crate::plugin::Plugin;
use crate::site::{Site, SortStrategy};

pub struct SorterPlugin;

impl Plugin for SorterPlugin {
    fn name(&self) -> &str {
        "sorter"
    }

    fn begin_site(&mut self, site: &mut Site) -> anyhow::Result<()> {
        if !site.initialize_once("sorter") {
            return Ok(());
        }
        let strategies: Vec<(String, SortStrategy)> = site
            .config()
            .sorter
            .iter()
            .map(|(name, section)| (name.clone(), SortStrategy::from_section(section)))
            .collect();
        for (name, strategy) in strategies {
            site.register_sorter(name.as_str(), strategy);
            site.compute_neighbors(&name);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SorterSection;
    use crate::testing::Fixture;

    #[test]
    fn test_registers_and_links() {
        let mut fixture = Fixture::new();
        fixture.config.sorter.insert(
            "name".into(),
            SorterSection {
                attr: vec!["name".into()],
                ..SorterSection::default()
            },
        );
        fixture.content("b.html", "b");
        fixture.content("a.html", "a");
        let mut site = fixture.site();

        SorterPlugin.begin_site(&mut site).unwrap();
        let a = site.content().resource_from_relative_path("a.html").unwrap();
        let b = site.content().resource_from_relative_path("b.html").unwrap();
        assert!(site.sorter("name").is_some());
        assert_eq!(site.neighbors(a, "name"), (None, Some(b)));
        assert_eq!(site.neighbors(b, "name"), (Some(a), None));
    }

    #[test]
    fn test_runs_once_per_load() {
        let mut fixture = Fixture::new();
        fixture
            .config
            .sorter
            .insert("all".into(), SorterSection::default());
        fixture.content("a.html", "a");
        let mut site = fixture.site();

        SorterPlugin.begin_site(&mut site).unwrap();
        site.register_sorter("all", SortStrategy::by("name").reversed());
        SorterPlugin.begin_site(&mut site).unwrap();
        assert!(site.sorter("all").unwrap().reverse, "second call is a no-op");

        site.load().unwrap();
        SorterPlugin.begin_site(&mut site).unwrap();
        assert!(!site.sorter("all").unwrap().reverse);
    }
}
