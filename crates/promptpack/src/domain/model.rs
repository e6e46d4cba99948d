//! Domain models for the selected file list.

use std::path::{Path, PathBuf};

use crate::domain::errors::DomainError;

/// Ordered, duplicate-free list of files to include in the prompt.
///
/// Paths are not checked for existence; unreadable files surface when the prompt is assembled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectedFiles {
    paths: Vec<PathBuf>,
}

impl SelectedFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Path> {
        self.paths.get(index).map(PathBuf::as_path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.iter().any(|existing| existing == path)
    }

    /// Append `path`. Returns `false` without changes when it is already present.
    pub fn add(&mut self, path: impl Into<PathBuf>) -> bool {
        let path = path.into();
        if self.contains(&path) {
            return false;
        }
        self.paths.push(path);
        true
    }

    /// Replace the entry at `index` in place.
    ///
    /// Replacing an entry with itself is allowed; using a path held at another index is not.
    pub fn replace(
        &mut self,
        index: usize,
        path: impl Into<PathBuf>,
    ) -> Result<PathBuf, DomainError> {
        let path = path.into();
        let len = self.paths.len();
        if index >= len {
            return Err(DomainError::IndexOutOfRange { index, len });
        }
        if self
            .paths
            .iter()
            .enumerate()
            .any(|(idx, existing)| idx != index && *existing == path)
        {
            return Err(DomainError::DuplicatePath(path));
        }
        Ok(std::mem::replace(&mut self.paths[index], path))
    }

    /// Remove and return the entry at `index`, keeping the order of the rest.
    pub fn remove(&mut self, index: usize) -> Result<PathBuf, DomainError> {
        let len = self.paths.len();
        if index >= len {
            return Err(DomainError::IndexOutOfRange { index, len });
        }
        Ok(self.paths.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }
}

impl<P: Into<PathBuf>> FromIterator<P> for SelectedFiles {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        let mut files = Self::new();
        for path in iter {
            files.add(path);
        }
        files
    }
}
