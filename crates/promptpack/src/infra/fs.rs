//! File-system access returning typed results.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failure to read a selected file as UTF-8 text.
#[derive(Debug, Error)]
#[error("failed to read {}: {source}", path.display())]
pub struct FileReadError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

impl FileReadError {
    /// Human-readable description of the underlying failure, without the path.
    pub fn reason(&self) -> String {
        self.source.to_string()
    }
}

/// Read a whole file as UTF-8. The handle is closed before returning.
pub fn read_text(path: &Path) -> Result<String, FileReadError> {
    fs::read_to_string(path).map_err(|source| FileReadError {
        path: path.to_path_buf(),
        source,
    })
}

/// A single directory entry as seen by the tree renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub name: OsString,
    pub path: PathBuf,
    pub is_dir: bool,
}

impl Listing {
    pub fn display_name(&self) -> String {
        self.name.to_string_lossy().into_owned()
    }
}

/// List the immediate entries of `dir`, sorted by name.
///
/// Sorting compares raw names, which is code-point order for UTF-8 names and independent of the
/// order the OS reports entries in. Directory detection follows symlinks.
pub fn list_dir(dir: &Path) -> io::Result<Vec<Listing>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_dir = fs::metadata(&path).map(|meta| meta.is_dir()).unwrap_or(false);
        entries.push(Listing {
            name: entry.file_name(),
            path,
            is_dir,
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Final path segment for headers, falling back to the whole path (e.g. `/`).
pub fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
