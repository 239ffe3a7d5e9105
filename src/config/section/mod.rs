//! Configuration section definitions.
//!
//! Each module corresponds to a section in `lode.toml`:
//!
//! | Module   | TOML Section      | Purpose                                  |
//! |----------|-------------------|------------------------------------------|
//! | `site`   | `[site]`          | URL prefixes and mode                    |
//! | `build`  | `[build]`         | Folders, patterns, plugin order          |
//! | `plugin` | `[plugin.<name>]` | Per-plugin resource filters              |
//! | `sorter` | `[sorter.<name>]` | Named sort strategies                    |

mod build;
mod plugin;
mod site;
mod sorter;

pub use build::BuildSection;
pub use plugin::PluginSection;
pub use site::SiteSection;
pub use sorter::SorterSection;
