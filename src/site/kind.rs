//! Text vs binary classification of resources.

use std::path::Path;

use crate::fs::File;

/// Kind of resource content, determines processing path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    /// Rendered or run through text hooks, written as UTF-8
    Text,
    /// Copied byte for byte
    Binary,
}

const TEXT_EXTENSIONS: &[&str] = &[
    "html", "htm", "xhtml", "xml", "css", "scss", "sass", "less", "js", "mjs", "ts", "json",
    "txt", "md", "markdown", "rst", "toml", "yaml", "yml", "svg", "csv", "rss", "atom", "j2",
    "jinja", "tera", "coffee", "styl", "htaccess", "webmanifest",
];

const BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "avif", "ico", "bmp", "tiff", "pdf", "zip", "gz",
    "tar", "woff", "woff2", "ttf", "otf", "eot", "mp3", "mp4", "webm", "ogg", "wav", "mov",
];

impl ContentKind {
    /// Detect kind from file extension alone.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        if TEXT_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Text)
        } else if BINARY_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Binary)
        } else {
            None
        }
    }

    /// Detect kind from extension, falling back to sniffing the content.
    ///
    /// Unreadable files are treated as binary, so they are copied rather than decoded.
    pub fn detect(path: &Path) -> Self {
        if let Some(kind) = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
        {
            return kind;
        }
        match File::new(path).looks_binary() {
            Ok(false) => Self::Text,
            _ => Self::Binary,
        }
    }

    #[inline]
    pub fn is_text(self) -> bool {
        self == Self::Text
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Binary => "binary",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_from_extension() {
        assert_eq!(ContentKind::from_extension("html"), Some(ContentKind::Text));
        assert_eq!(ContentKind::from_extension("CSS"), Some(ContentKind::Text));
        assert_eq!(ContentKind::from_extension("png"), Some(ContentKind::Binary));
        assert_eq!(ContentKind::from_extension("unknown"), None);
    }

    #[test]
    fn test_detect_sniffs_unknown_extensions() {
        let dir = TempDir::new().unwrap();
        let text = dir.path().join("LICENSE");
        let binary = dir.path().join("blob.dat");
        std::fs::write(&text, "MIT License").unwrap();
        std::fs::write(&binary, [1u8, 0, 2, 3]).unwrap();

        assert_eq!(ContentKind::detect(&text), ContentKind::Text);
        assert_eq!(ContentKind::detect(&binary), ContentKind::Binary);
        assert_eq!(
            ContentKind::detect(&dir.path().join("missing")),
            ContentKind::Binary
        );
    }
}
