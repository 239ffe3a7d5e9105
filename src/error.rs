//! Error taxonomy of the generation core.
//!
//! | Variant          | Raised by                                  | Recovery                    |
//! |------------------|--------------------------------------------|-----------------------------|
//! | `Configuration`  | config loading, missing source folder      | none, surfaced to caller    |
//! | `Structure`      | `add_node`/`add_resource` outside the root | none                        |
//! | `PluginProtocol` | unknown event name on the plugin bus       | none (programming error)    |
//! | `Generation`     | rendering, plugin hooks, output writes     | partial call → full rebuild |
//!
//! Only `Generation` is ever caught inside the crate: `generate_node` and
//! `generate_resource` retry once with `generate_all`.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Top-level error of the generation core.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error("`{}` is outside of `{}`", path.display(), root.display())]
    Structure { path: PathBuf, root: PathBuf },

    #[error("plugin protocol: {0}")]
    PluginProtocol(String),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("IO error at `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    #[inline]
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error may be recovered by a full rebuild.
    #[inline]
    pub fn is_generation(&self) -> bool {
        matches!(self, Self::Generation(_))
    }
}

/// Failures while producing output for a resource.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("failed to render `{path}`: {message}")]
    Template { path: String, message: String },

    #[error("plugin `{plugin}` failed in `{event}`")]
    Plugin {
        plugin: String,
        event: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to write `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl GenerationError {
    #[inline]
    pub fn template(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Template {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Render an error with its full `source()` chain on one line.
pub fn chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut current = err.source();
    while let Some(source) = current {
        let text = source.to_string();
        if !out.contains(&text) {
            out.push_str(": ");
            out.push_str(&text);
        }
        current = source.source();
    }
    out
}
