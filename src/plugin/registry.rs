//! Plugin registry.
//!
//! Plugins are values; the bus is built by explicit construction from the
//! `build.plugins` list, in that order.

use super::builtin::{AutoExtendPlugin, DependsPlugin, MetaPlugin, SorterPlugin};
use super::{Plugin, PluginBus, ResourceFilter};
use crate::config::{ConfigError, SiteConfig};
use crate::debug;

/// Names of the built-in plugins, in their default order.
pub const BUILTIN: [&str; 4] = ["meta", "depends", "auto_extend", "sorter"];

#[inline]
pub fn is_builtin(name: &str) -> bool {
    BUILTIN.contains(&name)
}

/// Instantiate a built-in plugin by name.
pub fn create(name: &str) -> Option<Box<dyn Plugin>> {
    let plugin: Box<dyn Plugin> = match name {
        "meta" => Box::new(MetaPlugin),
        "depends" => Box::new(DependsPlugin),
        "auto_extend" => Box::new(AutoExtendPlugin),
        "sorter" => Box::new(SorterPlugin),
        _ => return None,
    };
    Some(plugin)
}

/// Build the plugin bus for `config`, applying `[plugin.<name>]` filters.
pub fn load_all(config: &SiteConfig) -> Result<PluginBus, ConfigError> {
    let mut bus = PluginBus::new();
    for name in &config.build.plugins {
        let plugin = create(name).ok_or_else(|| ConfigError::UnknownPlugin(name.clone()))?;
        let filter = ResourceFilter::from_section(&config.plugin_section(name))?;
        bus.push_filtered(plugin, filter);
    }
    debug!("plugin"; "loaded [{}]", bus.names().collect::<Vec<_>>().join(", "));
    Ok(bus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_builtin_names() {
        for name in BUILTIN {
            assert!(is_builtin(name));
            assert_eq!(create(name).unwrap().name(), name);
        }
        assert!(!is_builtin("minify"));
        assert!(create("minify").is_none());
    }

    #[test]
    fn test_load_all_keeps_configured_order() {
        let config = test_parse_config("[build]\nplugins = [\"sorter\", \"meta\"]");
        let bus = load_all(&config).unwrap();
        assert_eq!(bus.names().collect::<Vec<_>>(), vec!["sorter", "meta"]);
    }

    #[test]
    fn test_load_all_default_plugins() {
        let bus = load_all(&SiteConfig::default()).unwrap();
        assert_eq!(bus.names().collect::<Vec<_>>(), BUILTIN.to_vec());
    }

    #[test]
    fn test_load_all_rejects_unknown() {
        let mut config = SiteConfig::default();
        config.build.plugins = vec!["meta".into(), "minify".into()];
        let err = load_all(&config).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownPlugin(ref name) if name == "minify"));
    }

    #[test]
    fn test_load_all_rejects_bad_filter() {
        let config = test_parse_config("[plugin.meta]\ninclude = [\"re:(\"]");
        assert!(matches!(
            load_all(&config).unwrap_err(),
            ConfigError::Pattern { .. }
        ));
    }
}
