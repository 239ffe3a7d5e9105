//! URL building for content and media paths.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::config::SiteConfig;
use crate::fs::{normalize_key, to_key};

/// Characters kept verbatim in URL paths.
const PATH_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// URL of a content path under `site.base_url`.
pub fn content_url(config: &SiteConfig, path: &str) -> String {
    join_url(&config.site.base_url, path)
}

/// URL of a media-relative path under `site.media_url`.
pub fn media_url(config: &SiteConfig, path: &str) -> String {
    join_url(&config.site.media_url, path)
}

/// Media URL for paths inside the media folder, content URL otherwise.
pub fn full_url(config: &SiteConfig, path: &str) -> String {
    let media = to_key(&config.build.media);
    let path = normalize_key(path);
    if !media.is_empty()
        && let Some(rest) = path.strip_prefix(&media)
        && (rest.is_empty() || rest.starts_with('/'))
    {
        return media_url(config, rest);
    }
    content_url(config, &path)
}

/// Join a URL prefix and a relative path, percent-encoding the path.
pub fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    let encoded = utf8_percent_encode(path, PATH_SET);
    format!("{base}/{encoded}")
}
