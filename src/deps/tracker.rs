//! Persisted dependency map.
//!
//! One JSON file at the site root (`build.deps_file`, `.lode_deps` by default):
//!
//! ```json
//! {
//!   "about.html": ["base.html", "nav.html"],
//!   "feed.xml": ["base.html", null]
//! }
//! ```
//!
//! The file is read once when the tracker is created. A missing or malformed
//! file is an empty map. Entries never expire: staleness is always decided by
//! comparing file timestamps, never by a cached verdict.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{DependencyGraph, DependencySet};
use crate::{debug, log};

#[derive(Debug)]
pub struct DependencyTracker {
    path: PathBuf,
    entries: BTreeMap<String, DependencySet>,
    graph: DependencyGraph,
    dirty: bool,
}

impl DependencyTracker {
    /// Load the map stored at `path`.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = restore(&path);
        let mut graph = DependencyGraph::new();
        for (resource, deps) in &entries {
            graph.record(resource, deps.paths());
        }
        Self {
            path,
            entries,
            graph,
            dirty: false,
        }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn get(&self, resource: &str) -> Option<&DependencySet> {
        self.entries.get(resource)
    }

    /// Store the dependency set of `resource`, replacing any previous one.
    pub fn insert(&mut self, resource: impl Into<String>, deps: DependencySet) {
        let resource = resource.into();
        if self.entries.get(&resource) == Some(&deps) {
            return;
        }
        self.graph.record(&resource, deps.paths());
        self.entries.insert(resource, deps);
        self.dirty = true;
    }

    /// Resources whose recorded dependencies include `path`, sorted.
    pub fn dependents_of(&self, path: &str) -> Vec<String> {
        let mut out: Vec<String> = self
            .graph
            .used_by(path)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        out.sort();
        out
    }

    /// Write the map if anything changed since it was loaded or last saved.
    pub fn save(&mut self) -> io::Result<()> {
        if !self.dirty {
            debug!("deps"; "dependency map unchanged, skipping write");
            return Ok(());
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, json)?;
        self.dirty = false;
        debug!("deps"; "saved {} entries to {}", self.entries.len(), self.path.display());
        Ok(())
    }
}

impl Drop for DependencyTracker {
    fn drop(&mut self) {
        if let Err(e) = self.save() {
            log!("error"; "failed to save {}: {}", self.path.display(), e);
        }
    }
}

fn restore(path: &Path) -> BTreeMap<String, DependencySet> {
    let json = match fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) => {
            if e.kind() != io::ErrorKind::NotFound {
                debug!("deps"; "cannot read {}: {}", path.display(), e);
            }
            return BTreeMap::new();
        }
    };
    match serde_json::from_str::<BTreeMap<String, DependencySet>>(&json) {
        Ok(entries) => {
            debug!("deps"; "restored {} entries", entries.len());
            entries
        }
        Err(e) => {
            debug!("deps"; "ignoring malformed {}: {}", path.display(), e);
            BTreeMap::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn set(paths: &[&str]) -> DependencySet {
        paths.iter().copied().collect()
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".lode_deps");
        drop(DependencyTracker::load(&path));
        assert!(!path.exists(), "nothing to save");
    }

    #[test]
    fn test_malformed_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".lode_deps");
        fs::write(&path, "{ not json").unwrap();
        let tracker = DependencyTracker::load(&path);
        assert!(tracker.dependents_of("base.html").is_empty());
    }

    #[test]
    fn test_round_trip_through_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".lode_deps");
        {
            let mut tracker = DependencyTracker::load(&path);
            tracker.insert("about.html", set(&["base.html", "nav.html"]));
            let mut feed = set(&["base.html"]);
            feed.mark_unresolved();
            tracker.insert("feed.xml", feed);
            tracker.save().unwrap();
        }

        let text = fs::read_to_string(&path).unwrap();
        let about = text.find("about.html").unwrap();
        let feed = text.find("feed.xml").unwrap();
        assert!(about < feed, "keys are sorted");
        assert!(text.contains("null"));

        let tracker = DependencyTracker::load(&path);
        assert!(tracker.get("about.html").is_some());
        assert!(tracker.get("feed.xml").unwrap().is_unresolved());
        assert_eq!(
            tracker.dependents_of("base.html"),
            vec!["about.html".to_string(), "feed.xml".to_string()]
        );
    }

    #[test]
    fn test_drop_saves_dirty_map() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".lode_deps");
        {
            let mut tracker = DependencyTracker::load(&path);
            tracker.insert("about.html", set(&["base.html"]));
        }
        assert!(path.exists());
        assert!(DependencyTracker::load(&path).get("about.html").is_some());
    }

    #[test]
    fn test_unchanged_map_is_not_written() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".lode_deps");
        {
            let mut tracker = DependencyTracker::load(&path);
            tracker.insert("about.html", set(&["base.html"]));
        }
        {
            let mut tracker = DependencyTracker::load(&path);
            fs::remove_file(&path).unwrap();
            tracker.insert("about.html", set(&["base.html"]));
            tracker.save().unwrap();
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_replacing_entry_updates_reverse_lookup() {
        let dir = TempDir::new().unwrap();
        let mut tracker = DependencyTracker::load(dir.path().join(".lode_deps"));
        tracker.insert("about.html", set(&["base.html"]));
        tracker.insert("about.html", set(&["plain.html"]));
        assert!(tracker.dependents_of("base.html").is_empty());
        assert_eq!(tracker.dependents_of("plain.html"), vec!["about.html".to_string()]);
    }
}
