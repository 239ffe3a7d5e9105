//! Resource and node metadata.
//!
//! Metadata is a TOML table attached at three levels, looked up innermost first:
//!
//! ```text
//! resource front matter  →  _meta.toml of each enclosing node  →  [meta] in lode.toml
//! ```
//!
//! Absence is explicit: lookups return `Option<&toml::Value>`.
//!
//! Front matter uses `+++` delimiters at the very start of a text resource:
//!
//! ```text
//! +++
//! title = "About"
//! extends = "base.html"
//! +++
//! <p>body</p>
//! ```

use serde_json::Value as JsonValue;
use toml::{Table, Value};

const DELIMITER: &str = "+++";

/// A metadata table with dotted-key lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata(Table);

impl Metadata {
    #[inline]
    pub fn new(table: Table) -> Self {
        Self(table)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn table(&self) -> &Table {
        &self.0
    }

    /// Look up a dotted key (`"author.name"`).
    pub fn get(&self, dotted: &str) -> Option<&Value> {
        lookup(&self.0, dotted)
    }

    pub fn get_str(&self, dotted: &str) -> Option<&str> {
        self.get(dotted).and_then(Value::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// Overlay this table's top-level keys onto `target`.
    pub fn overlay_onto(&self, target: &mut Table) {
        for (key, value) in &self.0 {
            target.insert(key.clone(), value.clone());
        }
    }
}

impl From<Table> for Metadata {
    fn from(table: Table) -> Self {
        Self(table)
    }
}

/// Dotted-key lookup in a plain table.
pub fn lookup<'a>(table: &'a Table, dotted: &str) -> Option<&'a Value> {
    let mut parts = dotted.split('.');
    let mut current = table.get(parts.next()?)?;
    for part in parts {
        current = current.as_table()?.get(part)?;
    }
    Some(current)
}

// ============================================================================
// Front matter
// ============================================================================

/// Split `+++` front matter from the body: `(front, body)`.
pub fn split_front_matter(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix(DELIMITER)?;
    let rest = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == DELIMITER {
            let front = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Some((front, body));
        }
        offset += line.len();
    }
    None
}

/// Parse front matter if present: `Some((metadata, body))`.
pub fn parse_front_matter(text: &str) -> Result<Option<(Metadata, &str)>, toml::de::Error> {
    let Some((front, body)) = split_front_matter(text) else {
        return Ok(None);
    };
    let table: Table = toml::from_str(front)?;
    Ok(Some((Metadata(table), body)))
}

// ============================================================================
// Conversion
// ============================================================================

/// Convert a TOML value to JSON for template contexts.
///
/// Datetimes become their RFC 3339 string form.
pub fn to_json(value: &Value) -> JsonValue {
    match value {
        Value::String(s) => JsonValue::String(s.clone()),
        Value::Integer(i) => JsonValue::from(*i),
        Value::Float(f) => JsonValue::from(*f),
        Value::Boolean(b) => JsonValue::Bool(*b),
        Value::Datetime(dt) => JsonValue::String(dt.to_string()),
        Value::Array(items) => JsonValue::Array(items.iter().map(to_json).collect()),
        Value::Table(table) => table_to_json(table),
    }
}

pub fn table_to_json(table: &Table) -> JsonValue {
    JsonValue::Object(
        table
            .iter()
            .map(|(k, v)| (k.clone(), to_json(v)))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dotted_lookup() {
        let table: Table = toml::from_str("title = \"x\"\n[author]\nname = \"Ann\"").unwrap();
        let meta = Metadata::new(table);
        assert_eq!(meta.get_str("title"), Some("x"));
        assert_eq!(meta.get_str("author.name"), Some("Ann"));
        assert!(meta.get("author.email").is_none());
        assert!(meta.get("title.inner").is_none());
        assert!(meta.get("").is_none());
    }

    #[test]
    fn test_split_front_matter() {
        let text = "+++\ntitle = \"About\"\n+++\n<p>body</p>\n";
        let (front, body) = split_front_matter(text).unwrap();
        assert_eq!(front, "title = \"About\"\n");
        assert_eq!(body, "<p>body</p>\n");

        assert!(split_front_matter("<p>no front matter</p>").is_none());
        // unterminated block is not front matter
        assert!(split_front_matter("+++\ntitle = 1\n").is_none());
    }

    #[test]
    fn test_split_front_matter_crlf() {
        let text = "+++\r\ntitle = \"About\"\r\n+++\r\nbody";
        let (front, body) = split_front_matter(text).unwrap();
        assert_eq!(front, "title = \"About\"\r\n");
        assert_eq!(body, "body");
    }

    #[test]
    fn test_parse_front_matter() {
        let text = "+++\ntitle = \"About\"\ntags = [\"a\", \"b\"]\n+++\nbody";
        let (meta, body) = parse_front_matter(text).unwrap().unwrap();
        assert_eq!(meta.get_str("title"), Some("About"));
        assert_eq!(body, "body");

        assert!(parse_front_matter("+++\ntitle = \n+++\n").is_err());
        assert!(parse_front_matter("plain").unwrap().is_none());
    }

    #[test]
    fn test_to_json() {
        let table: Table =
            toml::from_str("n = 1\nf = 1.5\nok = true\ncreated = 2024-01-02\nlist = [\"a\"]")
                .unwrap();
        let json = table_to_json(&table);
        assert_eq!(json["n"], 1);
        assert_eq!(json["f"], 1.5);
        assert_eq!(json["ok"], true);
        assert_eq!(json["created"], "2024-01-02");
        assert_eq!(json["list"][0], "a");
    }
}
