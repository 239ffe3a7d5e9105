//! Reverse dependency lookup for watch mode.

use rustc_hash::{FxHashMap, FxHashSet};

type PathSet = FxHashSet<String>;
type PathSetMap = FxHashMap<String, PathSet>;

/// Bidirectional dependency graph.
///
/// Maintains both forward (resource → deps) and reverse (dep → resources)
/// mappings, keyed by relative path.
///
/// # Invariants
/// - Forward and reverse mappings are always consistent
/// - Self-references are excluded
#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    forward: PathSetMap,
    reverse: PathSetMap,
}

impl DependencyGraph {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record dependencies for a resource, replacing any previous ones.
    pub fn record<'a>(&mut self, resource: &str, deps: impl IntoIterator<Item = &'a str>) {
        self.remove(resource);

        let deps: PathSet = deps
            .into_iter()
            .filter(|d| *d != resource)
            .map(str::to_string)
            .collect();

        for dep in &deps {
            self.reverse
                .entry(dep.clone())
                .or_default()
                .insert(resource.to_string());
        }
        self.forward.insert(resource.to_string(), deps);
    }

    /// Resources that depend on `path`.
    #[inline]
    pub fn used_by(&self, path: &str) -> Option<&PathSet> {
        self.reverse.get(path)
    }

    /// Remove a resource and clean up its reverse mappings.
    pub fn remove(&mut self, resource: &str) {
        let Some(old_deps) = self.forward.remove(resource) else {
            return;
        };

        for dep in old_deps {
            if let Some(dependents) = self.reverse.get_mut(&dep) {
                dependents.remove(resource);
                if dependents.is_empty() {
                    self.reverse.remove(&dep);
                }
            }
        }
    }
}
