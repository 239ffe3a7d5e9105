//! Site configuration management for `lode.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── build      # [build]
//! │   ├── plugin     # [plugin.<name>]
//! │   ├── site       # [site]
//! │   └── sorter     # [sorter.<name>]
//! ├── error          # ConfigError
//! ├── pattern        # glob / regex path patterns
//! └── mod.rs         # SiteConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section            | Purpose                                          |
//! |--------------------|--------------------------------------------------|
//! | `[site]`           | URL prefixes and mode                            |
//! | `[build]`          | Folders, ignore / simple-copy patterns, plugins  |
//! | `[context]`        | Values merged into every template context        |
//! | `[meta]`           | Site-wide default metadata                       |
//! | `[plugin.<name>]`  | Per-plugin resource filters                      |
//! | `[sorter.<name>]`  | Named sort strategies                            |

mod error;
mod pattern;
pub mod section;
mod util;

pub use error::ConfigError;
pub use pattern::PatternSet;
pub use section::{BuildSection, PluginSection, SiteSection, SorterSection};

use crate::log;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    time::SystemTime,
};

/// Default config file name.
pub const CONFIG_FILE: &str = "lode.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing lode.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Absolute path to the config file, `None` for in-memory configs
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Site root directory - parent of config file
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub site: SiteSection,

    #[serde(default)]
    pub build: BuildSection,

    /// Arbitrary values merged into template contexts
    #[serde(default)]
    pub context: toml::Table,

    /// Site-wide default metadata
    #[serde(default)]
    pub meta: toml::Table,

    #[serde(default)]
    pub plugin: BTreeMap<String, PluginSection>,

    #[serde(default)]
    pub sorter: BTreeMap<String, SorterSection>,
}

impl SiteConfig {
    /// Load configuration from a file.
    ///
    /// The site root is the config file's parent directory. Unknown fields
    /// are reported as warnings.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let path = crate::fs::normalize_path(path);
        let content =
            fs::read_to_string(&path).map_err(|err| ConfigError::Io(path.clone(), err))?;

        let (mut config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, &path);
        }

        config.build.validate()?;
        let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
        config.config_path = Some(path);
        config.finalize(&root);
        Ok(config)
    }

    /// Find `config_name` upward from `start` and load it.
    pub fn discover(start: &Path, config_name: &Path) -> Result<Self, ConfigError> {
        let Some(path) = util::find_config_file(start, config_name) else {
            return Err(ConfigError::Validation(format!(
                "config file `{}` not found",
                config_name.display()
            )));
        };
        Self::load(&path)
    }

    /// In-memory default configuration rooted at `root` (no config file).
    pub fn for_root(root: &Path) -> Self {
        let mut config = Self::default();
        config.finalize(root);
        config
    }

    /// Parse configuration from a TOML string (paths stay relative).
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.build.validate()?;
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring: {}", display_path, fields.join(", "));
    }

    /// Set the root and normalize all folders against it.
    pub fn finalize(&mut self, root: &Path) {
        let root = crate::fs::normalize_path(root);
        self.build.content = util::resolve_under(&root, &self.build.content);
        self.build.layout = util::resolve_under(&root, &self.build.layout);
        self.build.deploy = util::resolve_under(&root, &self.build.deploy);
        // media stays relative to content
        self.root = root;
    }

    // ========================================================================
    // paths
    // ========================================================================

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[inline]
    pub fn content_root(&self) -> &Path {
        &self.build.content
    }

    #[inline]
    pub fn layout_root(&self) -> &Path {
        &self.build.layout
    }

    #[inline]
    pub fn deploy_root(&self) -> &Path {
        &self.build.deploy
    }

    /// Media folder (absolute, inside the content folder).
    #[inline]
    pub fn media_root(&self) -> PathBuf {
        self.build.content.join(&self.build.media)
    }

    /// Persisted dependency map file.
    #[inline]
    pub fn deps_path(&self) -> PathBuf {
        self.root.join(&self.build.deps_file)
    }

    /// Modification time of the config file, if there is one.
    pub fn last_modified(&self) -> Option<SystemTime> {
        self.config_path.as_deref().and_then(crate::fs::get_mtime)
    }

    // ========================================================================
    // patterns
    // ========================================================================

    pub fn ignore_patterns(&self) -> Result<PatternSet, ConfigError> {
        PatternSet::compile(&self.build.ignore)
    }

    pub fn simple_copy_patterns(&self) -> Result<PatternSet, ConfigError> {
        PatternSet::compile(&self.build.simple_copy)
    }

    /// `[plugin.<name>]` section, or the default (no filtering).
    pub fn plugin_section(&self, name: &str) -> PluginSection {
        self.plugin.get(name).cloned().unwrap_or_default()
    }
}

// ============================================================================
// Test Helpers
// ============================================================================

/// Parse config and panic on unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> SiteConfig {
    let (parsed, ignored) = SiteConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_from_str_invalid_toml() {
        let result = SiteConfig::from_str("[site\nbase_url = \"/\"");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "[site]\nbase_url = \"/\"\n[unknown_section]\nfield = \"value\"";
        let (config, ignored) = SiteConfig::parse_with_ignored(content).unwrap();
        assert_eq!(config.site.base_url, "/");
        assert!(ignored.iter().any(|f| f.contains("unknown_section")));
    }

    #[test]
    fn test_context_and_meta_tables() {
        let config = test_parse_config(
            "[context]\ntitle = \"My site\"\n[context.nav]\nhome = \"/\"\n[meta]\nauthor = \"me\"",
        );
        assert_eq!(
            config.context.get("title").and_then(|v| v.as_str()),
            Some("My site")
        );
        assert!(config.context.get("nav").is_some_and(toml::Value::is_table));
        assert_eq!(config.meta.get("author").and_then(|v| v.as_str()), Some("me"));
    }

    #[test]
    fn test_for_root_paths() {
        let dir = TempDir::new().unwrap();
        let config = SiteConfig::for_root(dir.path());
        let root = crate::fs::normalize_path(dir.path());
        assert_eq!(config.root(), root);
        assert_eq!(config.content_root(), root.join("content"));
        assert_eq!(config.layout_root(), root.join("layout"));
        assert_eq!(config.deploy_root(), root.join("deploy"));
        assert_eq!(config.media_root(), root.join("content/media"));
        assert_eq!(config.deps_path(), root.join(".lode_deps"));
        assert!(config.config_path.is_none());
        assert!(config.last_modified().is_none());
    }

    #[test]
    fn test_load_sets_root_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[build]\ncontent = \"src\"\ndeploy = \"out\"").unwrap();

        let config = SiteConfig::load(&path).unwrap();
        let root = crate::fs::normalize_path(dir.path());
        assert_eq!(config.root(), root);
        assert_eq!(config.content_root(), root.join("src"));
        assert_eq!(config.deploy_root(), root.join("out"));
        assert!(config.last_modified().is_some());
    }

    #[test]
    fn test_load_rejects_unknown_plugin() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[build]\nplugins = [\"stylus\"]").unwrap();
        assert!(matches!(
            SiteConfig::load(&path),
            Err(ConfigError::UnknownPlugin(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = SiteConfig::load(&dir.path().join(CONFIG_FILE));
        assert!(matches!(result, Err(ConfigError::Io(..))));
    }
}
