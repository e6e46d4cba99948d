//! Caller-owned prompt inputs and the user actions that mutate them.

use std::path::{Path, PathBuf};

use crate::app::assemble::{AssembledPrompt, PromptAssembler};
use crate::app::ignore::IgnorePatterns;
use crate::app::tree::TreeOptions;
use crate::domain::errors::DomainError;
use crate::domain::model::SelectedFiles;

/// Everything a generation depends on, owned by the front-end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptState {
    instruction: String,
    files: SelectedFiles,
    patterns: IgnorePatterns,
    directory: Option<PathBuf>,
    include_directory: bool,
    tree_options: TreeOptions,
}

impl PromptState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn files(&self) -> &SelectedFiles {
        &self.files
    }

    pub fn patterns(&self) -> &IgnorePatterns {
        &self.patterns
    }

    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    pub fn include_directory(&self) -> bool {
        self.include_directory
    }

    pub fn set_instruction(&mut self, text: impl Into<String>) {
        self.instruction = text.into();
    }

    /// Replace the ignore patterns by re-parsing the full pattern text.
    pub fn set_ignore_text(&mut self, text: &str) {
        self.patterns = IgnorePatterns::parse(text);
        tracing::debug!(count = self.patterns.len(), "ignore patterns updated");
    }

    pub fn set_patterns(&mut self, patterns: IgnorePatterns) {
        self.patterns = patterns;
    }

    pub fn set_tree_options(&mut self, options: TreeOptions) {
        self.tree_options = options;
    }

    /// Add files in order, skipping ignored and already selected paths. Returns how many were
    /// added.
    pub fn add_files<I, P>(&mut self, paths: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut added = 0;
        for path in paths {
            let path = path.into();
            if let Some(pattern) = self.patterns.matching_pattern(&path) {
                tracing::debug!(path = %path.display(), pattern, "not adding ignored file");
                continue;
            }
            if self.files.add(path) {
                added += 1;
            }
        }
        added
    }

    /// Swap the file at `index` for `path`.
    pub fn replace_file(
        &mut self,
        index: usize,
        path: impl Into<PathBuf>,
    ) -> Result<PathBuf, DomainError> {
        let path = path.into();
        if let Some(pattern) = self.patterns.matching_pattern(&path) {
            return Err(DomainError::IgnoredPath {
                pattern: pattern.to_owned(),
                path,
            });
        }
        self.files.replace(index, path)
    }

    pub fn remove_file(&mut self, index: usize) -> Result<PathBuf, DomainError> {
        self.files.remove(index)
    }

    /// Record the chosen directory. An empty path (a cancelled picker) keeps the previous choice.
    pub fn choose_directory(&mut self, dir: impl Into<PathBuf>) {
        let dir = dir.into();
        if dir.as_os_str().is_empty() {
            return;
        }
        self.directory = Some(dir);
    }

    pub fn set_include_directory(&mut self, include: bool) {
        self.include_directory = include;
    }

    /// Assemble the prompt from the current state.
    ///
    /// The directory tree is rebuilt on every call when the directory block is enabled and a
    /// directory has been chosen.
    pub fn generate(&self) -> AssembledPrompt {
        let directory = self
            .directory
            .as_deref()
            .filter(|_| self.include_directory);
        PromptAssembler::new(&self.patterns)
            .with_tree_options(self.tree_options)
            .generate(&self.instruction, &self.files, directory)
    }
}
