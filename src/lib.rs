//! lode: incremental static site generation.
//!
//! A site is a tree of folders (nodes) and files (resources) under the
//! content folder. A [`generator::Generator`] walks it, renders text through a
//! [`template::TemplateEngine`], copies binaries, and raises lifecycle events
//! on a [`plugin::PluginBus`]. Dependencies between resources and templates
//! are tracked in [`deps::DependencyTracker`] so later runs only regenerate
//! what changed.
//!
//! ```text
//! lode.toml ─► SiteConfig ─► Site (nodes, resources, metadata)
//!                                 │
//!            PluginBus ◄──────── Generator ───► TemplateEngine (Tera)
//!                                 │
//!                      DependencyTracker (.lode_deps)
//! ```

pub mod logger;

pub mod cli;
pub mod config;
pub mod deps;
pub mod error;
pub mod fs;
pub mod generator;
pub mod plugin;
pub mod site;
pub mod template;

#[cfg(test)]
mod testing;

pub use config::SiteConfig;
pub use error::{Error, GenerationError, Result};
pub use generator::Generator;
