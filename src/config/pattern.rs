//! Path patterns for `ignore`, `simple_copy` and plugin filters.
//!
//! | Form          | Example              | Matched against         |
//! |---------------|----------------------|-------------------------|
//! | glob, no `/`  | `*.bak`, `.git`      | file or folder name     |
//! | glob with `/` | `media/**/*.min.js`  | content-relative path   |
//! | `re:` prefix  | `re:^robots\.txt$`   | content-relative path   |
//!
//! Globs support `*` (within a segment), `**` (across segments) and `?`.

use regex::Regex;

use super::ConfigError;

const REGEX_PREFIX: &str = "re:";

#[derive(Debug, Clone)]
struct Pattern {
    regex: Regex,
    name_only: bool,
}

/// A compiled list of patterns; matches if any pattern matches.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

impl PatternSet {
    pub fn compile<S: AsRef<str>>(sources: &[S]) -> Result<Self, ConfigError> {
        let patterns = sources
            .iter()
            .map(|s| compile_one(s.as_ref()))
            .collect::<Result<_, _>>()?;
        Ok(Self { patterns })
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Match a `/`-separated relative path.
    pub fn is_match(&self, relative: &str) -> bool {
        let name = relative.rsplit('/').next().unwrap_or(relative);
        self.patterns.iter().any(|p| {
            if p.name_only {
                p.regex.is_match(name)
            } else {
                p.regex.is_match(relative)
            }
        })
    }
}

fn compile_one(source: &str) -> Result<Pattern, ConfigError> {
    let (expr, name_only) = match source.strip_prefix(REGEX_PREFIX) {
        Some(raw) => (raw.to_string(), false),
        None => (glob_to_regex(source), !source.contains('/')),
    };
    let regex = Regex::new(&expr).map_err(|e| ConfigError::Pattern {
        pattern: source.to_string(),
        source: e,
    })?;
    Ok(Pattern { regex, name_only })
}

/// Translate a glob into an anchored regex.
fn glob_to_regex(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len() * 2 + 2);
    out.push('^');
    let mut chars = glob.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                if chars.peek() == Some(&'/') {
                    chars.next();
                    out.push_str("(?:.*/)?");
                } else {
                    out.push_str(".*");
                }
            }
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            other => {
                let mut buf = [0u8; 4];
                out.push_str(&regex::escape(other.encode_utf8(&mut buf)));
            }
        }
    }
    out.push('$');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_globs_match_any_depth() {
        let set = PatternSet::compile(&["*.bak", ".git", "*~"]).unwrap();
        assert!(set.is_match("notes.bak"));
        assert!(set.is_match("posts/draft.html.bak"));
        assert!(set.is_match(".git"));
        assert!(set.is_match("posts/index.html~"));
        assert!(!set.is_match("posts/index.html"));
        assert!(!set.is_match(".github"));
    }

    #[test]
    fn test_path_globs() {
        let set = PatternSet::compile(&["media/**/*.min.js"]).unwrap();
        assert!(set.is_match("media/app.min.js"));
        assert!(set.is_match("media/js/vendor/app.min.js"));
        assert!(!set.is_match("js/app.min.js"));
        assert!(!set.is_match("media/app.js"));
    }

    #[test]
    fn test_regex_prefix() {
        let set = PatternSet::compile(&[r"re:^robots\.txt$"]).unwrap();
        assert!(set.is_match("robots.txt"));
        assert!(!set.is_match("media/robots.txt"));
    }

    #[test]
    fn test_invalid_regex() {
        let err = PatternSet::compile(&["re:(unclosed"]).unwrap_err();
        assert!(matches!(err, ConfigError::Pattern { .. }));
    }

    #[test]
    fn test_empty_set_matches_nothing() {
        let set = PatternSet::default();
        assert!(set.is_empty());
        assert!(!set.is_match("anything"));
    }
}
