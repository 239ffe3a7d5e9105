//! Turning debounced changes into generator calls.
//!
//! | Change                                   | Action                           |
//! |------------------------------------------|----------------------------------|
//! | config file                              | full incremental pass            |
//! | file created/removed under content/layout| reload, full incremental pass    |
//! | layout file modified                     | reload, regenerate its dependents|
//! | content file modified                    | regenerate it and its dependents |
//! | anything else                            | ignored                          |

use std::path::{Path, PathBuf};

use super::debouncer::{ChangeKind, Changes};
use crate::config::SiteConfig;
use crate::fs::to_key;

#[derive(Debug, Default, PartialEq, Eq)]
pub(super) struct Plan {
    /// Template and site must be reloaded first
    pub reload: bool,
    /// Regenerate everything (incrementally)
    pub full: bool,
    /// Modified content files, absolute
    pub content: Vec<PathBuf>,
    /// Modified layout files, relative to the layout folder
    pub layouts: Vec<String>,
}

impl Plan {
    pub(super) fn classify(changes: &Changes, config: &SiteConfig) -> Self {
        let mut plan = Self::default();
        let mut paths: Vec<_> = changes.iter().collect();
        paths.sort_by(|a, b| a.0.cmp(b.0));

        for (path, &kind) in paths {
            if config.config_path.as_deref() == Some(path.as_path()) {
                plan.full = true;
                continue;
            }
            let Some(area) = Area::of(path, config) else {
                continue;
            };
            if kind != ChangeKind::Modified {
                plan.reload = true;
                plan.full = true;
                continue;
            }
            match area {
                Area::Content => plan.content.push(path.clone()),
                Area::Layout(relative) => {
                    plan.reload = true;
                    plan.layouts.push(relative);
                }
            }
        }

        if plan.full {
            plan.content.clear();
            plan.layouts.clear();
        }
        plan
    }

    pub(super) fn is_empty(&self) -> bool {
        !self.full && self.content.is_empty() && self.layouts.is_empty()
    }
}

enum Area {
    Content,
    Layout(String),
}

impl Area {
    fn of(path: &Path, config: &SiteConfig) -> Option<Self> {
        if path.starts_with(config.deploy_root()) {
            return None;
        }
        if let Ok(relative) = path.strip_prefix(config.layout_root()) {
            return Some(Self::Layout(to_key(relative)));
        }
        path.starts_with(config.content_root()).then_some(Self::Content)
    }
}
