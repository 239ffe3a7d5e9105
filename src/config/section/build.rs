//! `[build]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [build]
//! content = "content"       # Source tree (relative to site root)
//! layout = "layout"         # Template folder (relative to site root)
//! media = "media"           # Media folder (relative to content)
//! deploy = "deploy"         # Output folder (relative to site root, `~` expanded)
//! deps_file = ".lode_deps"  # Dependency map file at the site root
//! ignore = ["*~", "*.bak"]  # Skipped while walking content
//! simple_copy = ["robots.txt"]
//! plugins = ["meta", "depends", "auto_extend", "sorter"]
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSection {
    pub content: PathBuf,
    pub layout: PathBuf,
    pub media: PathBuf,
    pub deploy: PathBuf,
    pub deps_file: String,

    /// Names or paths skipped while walking the content folder.
    pub ignore: Vec<String>,

    /// Resources copied verbatim, bypassing templates and text hooks.
    pub simple_copy: Vec<String>,

    /// Plugin names, in event order.
    pub plugins: Vec<String>,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            content: "content".into(),
            layout: "layout".into(),
            media: "media".into(),
            deploy: "deploy".into(),
            deps_file: ".lode_deps".into(),
            ignore: ["*~", "*.bak", ".git", ".hg", ".svn", ".DS_Store"]
                .map(String::from)
                .to_vec(),
            simple_copy: Vec::new(),
            plugins: ["meta", "depends", "auto_extend", "sorter"]
                .map(String::from)
                .to_vec(),
        }
    }
}

impl BuildSection {
    /// Validate raw (not yet normalized) values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.content.as_os_str().is_empty() {
            return Err(ConfigError::Validation("`build.content` is empty".into()));
        }
        if self.deploy.as_os_str().is_empty() {
            return Err(ConfigError::Validation("`build.deploy` is empty".into()));
        }
        if self.deploy == self.content {
            return Err(ConfigError::Validation(
                "`build.deploy` must differ from `build.content`".into(),
            ));
        }
        if self.deps_file.is_empty() || self.deps_file.contains(['/', '\\']) {
            return Err(ConfigError::Validation(format!(
                "`build.deps_file` must be a plain file name, got `{}`",
                self.deps_file
            )));
        }

        let mut seen = Vec::with_capacity(self.plugins.len());
        for name in &self.plugins {
            if !crate::plugin::registry::is_builtin(name) {
                return Err(ConfigError::UnknownPlugin(name.clone()));
            }
            if seen.contains(&name) {
                return Err(ConfigError::Validation(format!(
                    "plugin `{name}` listed twice in `build.plugins`"
                )));
            }
            seen.push(name);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_build_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.build.content, PathBuf::from("content"));
        assert_eq!(config.build.deps_file, ".lode_deps");
        assert_eq!(config.build.plugins[0], "meta");
        assert!(config.build.ignore.iter().any(|p| p == ".git"));
        assert!(config.build.validate().is_ok());
    }

    #[test]
    fn test_unknown_plugin_rejected() {
        let config = test_parse_config("[build]\nplugins = [\"meta\", \"less\"]");
        let err = config.build.validate().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownPlugin(name) if name == "less"));
    }

    #[test]
    fn test_duplicate_plugin_rejected() {
        let config = test_parse_config("[build]\nplugins = [\"meta\", \"meta\"]");
        assert!(matches!(
            config.build.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_deploy_equals_content_rejected() {
        let config = test_parse_config("[build]\ncontent = \"site\"\ndeploy = \"site\"");
        assert!(config.build.validate().is_err());
    }

    #[test]
    fn test_deps_file_must_be_a_name() {
        let config = test_parse_config("[build]\ndeps_file = \"cache/deps.json\"");
        assert!(config.build.validate().is_err());
    }
}
