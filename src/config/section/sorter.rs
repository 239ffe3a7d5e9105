//! `[sorter.<name>]` sections.
//!
//! ```toml
//! [sorter.time]
//! attr = ["meta.created", "name"]       # sort keys, in priority order
//! reverse = true
//! filters = { "meta.listable" = true }  # attribute → required value
//! ```
//!
//! Attributes: `name`, `relative_path`, `deploy_path`, `kind`, or `meta.<key>`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SorterSection {
    pub attr: Vec<String>,
    pub reverse: bool,
    pub filters: toml::Table,
}
