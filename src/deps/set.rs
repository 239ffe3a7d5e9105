//! Dependency sets with an "unresolved" sentinel.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Sorted, deduplicated dependency paths.
///
/// `unresolved` marks a dependency that could not be determined (a dynamic
/// template reference, a missing template). A set with the flag is always
/// stale. On disk the flag is a `null` entry in the list:
///
/// ```json
/// { "about.html": ["base.html", "nav.html"], "feed.xml": ["base.html", null] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Option<String>>", into = "Vec<Option<String>>")]
pub struct DependencySet {
    paths: BTreeSet<String>,
    unresolved: bool,
}

impl DependencySet {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// A set holding only the unresolved sentinel.
    pub fn unresolved() -> Self {
        Self {
            paths: BTreeSet::new(),
            unresolved: true,
        }
    }

    #[inline]
    pub fn insert(&mut self, path: impl Into<String>) -> bool {
        self.paths.insert(path.into())
    }

    #[inline]
    pub fn mark_unresolved(&mut self) {
        self.unresolved = true;
    }

    #[inline]
    pub fn is_unresolved(&self) -> bool {
        self.unresolved
    }

    #[inline]
    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty() && !self.unresolved
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    /// Merge another set, carrying over its sentinel.
    pub fn extend(&mut self, other: &DependencySet) {
        self.paths.extend(other.paths.iter().cloned());
        self.unresolved |= other.unresolved;
    }

    /// Remove a path (used to drop self-references).
    pub fn remove(&mut self, path: &str) -> bool {
        self.paths.remove(path)
    }

    /// Paths only, sentinel stripped.
    pub fn to_vec(&self) -> Vec<String> {
        self.paths.iter().cloned().collect()
    }
}

impl From<Vec<Option<String>>> for DependencySet {
    fn from(items: Vec<Option<String>>) -> Self {
        let mut set = Self::new();
        for item in items {
            match item {
                Some(path) => {
                    set.insert(path);
                }
                None => set.mark_unresolved(),
            }
        }
        set
    }
}

impl From<DependencySet> for Vec<Option<String>> {
    fn from(set: DependencySet) -> Self {
        let mut items: Vec<Option<String>> = set.paths.into_iter().map(Some).collect();
        if set.unresolved {
            items.push(None);
        }
        items
    }
}

impl<S: Into<String>> FromIterator<S> for DependencySet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for path in iter {
            set.insert(path);
        }
        set
    }
}
