//! `lode deps <path>`: dependency closure and dependents of a resource.

use anyhow::{Result, bail};
use std::path::Path;
use std::sync::Arc;

use crate::config::SiteConfig;
use crate::generator::Generator;

/// Lines printed for `path`: `uses <dep>` then `used by <resource>`.
pub fn describe(generator: &mut Generator, path: &Path) -> Result<Vec<String>> {
    generator.begin_site_if_needed()?;
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        generator.config().root().join(path)
    };
    let content = generator.site().content();
    let Some(id) = content.resource_from_path(&absolute) else {
        bail!("no resource at {}", absolute.display());
    };
    let relative = content.relative_path(id);

    let mut lines: Vec<String> = generator
        .get_dependencies(id)
        .into_iter()
        .map(|dep| format!("uses {dep}"))
        .collect();
    lines.extend(
        generator
            .dependents_of(&relative)
            .into_iter()
            .map(|other| format!("used by {other}")),
    );
    Ok(lines)
}

pub fn show_dependencies(config: Arc<SiteConfig>, path: &Path) -> Result<()> {
    let mut generator = Generator::from_config(config)?;
    for line in describe(&mut generator, path)? {
        println!("{line}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::PluginBus;
    use crate::testing::{Fixture, StubTemplate};

    #[test]
    fn test_describe() {
        let fixture = Fixture::new();
        fixture.content("about.html", "about");
        let template = StubTemplate::new().with_deps("about.html", &["base.html"]);
        let mut generator = fixture.generator(template, PluginBus::new());

        let lines = describe(&mut generator, Path::new("content/about.html")).unwrap();
        assert_eq!(lines, vec!["uses base.html"]);
        assert!(describe(&mut generator, Path::new("content/missing.html")).is_err());
    }
}
