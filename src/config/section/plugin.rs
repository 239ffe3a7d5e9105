//! `[plugin.<name>]` sections.
//!
//! ```toml
//! [plugin.meta]
//! include = ["*.html", "*.md"]   # resources the plugin sees (empty = all)
//! exclude = ["drafts/**"]        # resources the plugin never sees
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, PatternSet};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginSection {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl PluginSection {
    /// Compile into `(include, exclude)` pattern sets.
    pub fn patterns(&self) -> Result<(PatternSet, PatternSet), ConfigError> {
        Ok((
            PatternSet::compile(&self.include)?,
            PatternSet::compile(&self.exclude)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;

    #[test]
    fn test_plugin_section() {
        let config = test_parse_config("[plugin.meta]\ninclude = [\"*.html\"]");
        let section = &config.plugin["meta"];
        let (include, exclude) = section.patterns().unwrap();
        assert!(include.is_match("posts/a.html"));
        assert!(!include.is_match("style.css"));
        assert!(exclude.is_empty());
    }
}
