//! Domain-specific errors.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("no selected file at index {index} (list has {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("{} is already selected", .0.display())]
    DuplicatePath(PathBuf),
    #[error("{} matches ignore pattern '{pattern}'", path.display())]
    IgnoredPath { path: PathBuf, pattern: String },
}
