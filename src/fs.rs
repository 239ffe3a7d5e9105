//! Filesystem collaborator.
//!
//! Thin wrappers over `std::fs` used by the site model and the generator:
//!
//! | Operation        | Meaning                                              |
//! |------------------|------------------------------------------------------|
//! | `exists`         | path exists                                          |
//! | `read_all`       | read the whole file as UTF-8 text                    |
//! | `write`          | write text, creating parent folders                  |
//! | `copy_to`        | copy bytes, creating parent folders                  |
//! | `older_than`     | mtime strictly older than another file's mtime       |
//! | `Folder::make`   | `create_dir_all`, ignoring "already exists"          |

use std::fs;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

/// Number of leading bytes inspected when sniffing text vs binary.
const SNIFF_LEN: usize = 1024;

// ============================================================================
// Path helpers
// ============================================================================

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to lexical cleanup of a path joined with the current directory.
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        };
        clean(&absolute)
    })
}

/// Lexically remove `.` and `..` components.
fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// Relative path with `/` separators, used as index key.
///
/// `"posts\\hello.html"` and `"./posts/hello.html"` both become `"posts/hello.html"`.
pub fn to_key(path: &Path) -> String {
    let mut key = String::new();
    for component in path.components() {
        if let Component::Normal(part) = component {
            if !key.is_empty() {
                key.push('/');
            }
            key.push_str(&part.to_string_lossy());
        }
    }
    key
}

/// Normalize a relative path string: separators, `./` prefixes, duplicate slashes.
pub fn normalize_key(path: &str) -> String {
    path.split(['/', '\\'])
        .filter(|part| !part.is_empty() && *part != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Get the modification time of a file
///
/// Returns `None` if the file doesn't exist or mtime cannot be read
#[inline]
pub fn get_mtime(path: &Path) -> Option<SystemTime> {
    path.metadata().and_then(|m| m.modified()).ok()
}

// ============================================================================
// File
// ============================================================================

/// A file on disk, addressed by path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct File {
    path: PathBuf,
}

impl File {
    #[inline]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    #[inline]
    pub fn parent(&self) -> Folder {
        Folder::new(self.path.parent().unwrap_or_else(|| Path::new("")))
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.path.file_name().and_then(|n| n.to_str()).unwrap_or("")
    }

    #[inline]
    pub fn extension(&self) -> Option<&str> {
        self.path.extension().and_then(|e| e.to_str())
    }

    #[inline]
    pub fn mtime(&self) -> Option<SystemTime> {
        get_mtime(&self.path)
    }

    pub fn read_all(&self) -> io::Result<String> {
        fs::read_to_string(&self.path)
    }

    /// Write text, creating parent folders.
    pub fn write(&self, text: &str) -> io::Result<()> {
        self.parent().make()?;
        fs::write(&self.path, text)
    }

    /// Copy this file to `target`, creating parent folders.
    pub fn copy_to(&self, target: &File) -> io::Result<()> {
        target.parent().make()?;
        fs::copy(&self.path, &target.path).map(|_| ())
    }

    /// True if this file is strictly older than `other`.
    ///
    /// Missing files compare as older, so a missing target is always stale.
    pub fn older_than(&self, other: &File) -> bool {
        match (self.mtime(), other.mtime()) {
            (Some(mine), Some(theirs)) => mine < theirs,
            (None, _) => true,
            (Some(_), None) => false,
        }
    }

    /// Sniff the first bytes: NUL or invalid UTF-8 means binary.
    pub fn looks_binary(&self) -> io::Result<bool> {
        let mut buffer = [0u8; SNIFF_LEN];
        let mut file = fs::File::open(&self.path)?;
        let read = file.read(&mut buffer)?;
        let head = &buffer[..read];
        if head.contains(&0) {
            return Ok(true);
        }
        Ok(match std::str::from_utf8(head) {
            Ok(_) => false,
            // a multi-byte char cut at the sniff boundary is still text
            Err(e) => e.error_len().is_some(),
        })
    }
}

// ============================================================================
// Folder
// ============================================================================

/// A directory on disk, addressed by path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Folder {
    path: PathBuf,
}

impl Folder {
    #[inline]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }

    #[inline]
    pub fn child(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.path.join(relative)
    }

    /// Create the folder and all parents.
    pub fn make(&self) -> io::Result<()> {
        if self.path.as_os_str().is_empty() {
            return Ok(());
        }
        match fs::create_dir_all(&self.path) {
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
            other => other,
        }
    }

    /// Remove the folder and its contents. Missing folders are fine.
    pub fn delete(&self) -> io::Result<()> {
        match fs::remove_dir_all(&self.path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}
