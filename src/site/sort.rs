//! Named sort strategies.
//!
//! A strategy filters resources by attribute values and orders them by a list
//! of attributes. Strategies are registered on the `Site` by name and queried
//! with `Site::walk_resources_sorted(node, name)`.

use std::cmp::Ordering;

use toml::Value;

use crate::config::SorterSection;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortStrategy {
    pub attrs: Vec<String>,
    pub reverse: bool,
    pub filters: Vec<(String, Value)>,
}

impl SortStrategy {
    pub fn by(attr: impl Into<String>) -> Self {
        Self {
            attrs: vec![attr.into()],
            ..Self::default()
        }
    }

    pub fn reversed(mut self) -> Self {
        self.reverse = true;
        self
    }

    pub fn with_filter(mut self, attr: impl Into<String>, value: Value) -> Self {
        self.filters.push((attr.into(), value));
        self
    }

    pub fn from_section(section: &SorterSection) -> Self {
        Self {
            attrs: if section.attr.is_empty() {
                vec!["relative_path".into()]
            } else {
                section.attr.clone()
            },
            reverse: section.reverse,
            filters: section
                .filters
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}

/// Comparable projection of an attribute value.
///
/// Missing values sort first; values of different types sort by type.
#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
    Missing,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl SortKey {
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            None => Self::Missing,
            Some(Value::Boolean(b)) => Self::Bool(*b),
            #[allow(clippy::cast_precision_loss)]
            Some(Value::Integer(i)) => Self::Number(*i as f64),
            Some(Value::Float(f)) => Self::Number(*f),
            Some(Value::String(s)) => Self::Text(s.clone()),
            Some(Value::Datetime(dt)) => Self::Text(dt.to_string()),
            Some(other) => Self::Text(other.to_string()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Missing => 0,
            Self::Bool(_) => 1,
            Self::Number(_) => 2,
            Self::Text(_) => 3,
        }
    }

    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// Compare two key lists lexicographically.
pub fn compare_keys(a: &[SortKey], b: &[SortKey]) -> Ordering {
    a.iter()
        .zip(b)
        .map(|(x, y)| x.compare(y))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_key_ordering() {
        let missing = SortKey::from_value(None);
        let one = SortKey::from_value(Some(&Value::Integer(1)));
        let half = SortKey::from_value(Some(&Value::Float(0.5)));
        let text = SortKey::from_value(Some(&Value::String("a".into())));
        assert_eq!(missing.compare(&one), Ordering::Less);
        assert_eq!(half.compare(&one), Ordering::Less);
        assert_eq!(one.compare(&text), Ordering::Less);
    }

    #[test]
    fn test_compare_keys_uses_later_keys_on_ties() {
        let a = [SortKey::Text("x".into()), SortKey::Number(2.0)];
        let b = [SortKey::Text("x".into()), SortKey::Number(1.0)];
        assert_eq!(compare_keys(&a, &b), Ordering::Greater);
        assert_eq!(compare_keys(&a, &a), Ordering::Equal);
    }

    #[test]
    fn test_from_section_defaults_to_path() {
        let strategy = SortStrategy::from_section(&SorterSection::default());
        assert_eq!(strategy.attrs, vec!["relative_path".to_string()]);
        assert!(!strategy.reverse);
    }
}
