//! `[site]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [site]
//! base_url = "/blog"        # Prefix for content URLs
//! media_url = "/blog/media" # Prefix for media URLs
//! mode = "production"       # Exposed to templates as `site.mode`
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSection {
    pub base_url: String,
    pub media_url: String,
    pub mode: String,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            base_url: "/".into(),
            media_url: "/media".into(),
            mode: "development".into(),
        }
    }
}
