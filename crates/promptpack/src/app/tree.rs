//! Directory tree rendering.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::app::ignore::IgnorePatterns;
use crate::infra::fs::{self, Listing};

const TEE: &str = "├── ";
const CORNER: &str = "└── ";
const PIPE: &str = "│   ";
const SPACE: &str = "    ";

/// Directory that could not be listed while rendering.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("failed to list directory {}: {source}", path.display())]
    Enumerate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl TreeError {
    pub fn path(&self) -> &Path {
        match self {
            TreeError::Enumerate { path, .. } => path,
        }
    }
}

/// Rendering limits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeOptions {
    /// Deepest level whose directories are still descended into. Top-level entries are depth 1.
    /// `None` walks the whole hierarchy.
    pub max_depth: Option<usize>,
}

impl TreeOptions {
    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }
}

/// Renders the descendants of a directory as an indented, glyph-annotated tree.
///
/// ```text
///     ├── a.txt
///     ├── b.txt
///     └── sub/
///         └── c.txt
/// ```
///
/// Entries are sorted by name at every level and ignored entries are dropped together with
/// their subtrees. The root itself is treated as a last sibling, so every line carries at least
/// one four-space indent; the root's own name is never printed. Each line ends with `\n`.
#[derive(Debug, Clone, Copy)]
pub struct TreeRenderer<'a> {
    patterns: &'a IgnorePatterns,
    options: TreeOptions,
}

impl<'a> TreeRenderer<'a> {
    pub fn new(patterns: &'a IgnorePatterns) -> Self {
        Self {
            patterns,
            options: TreeOptions::default(),
        }
    }

    pub fn with_options(mut self, options: TreeOptions) -> Self {
        self.options = options;
        self
    }

    /// Render the tree below `root`. Returns an empty string when nothing survives filtering.
    pub fn render(&self, root: &Path) -> Result<String, TreeError> {
        tracing::debug!(root = %root.display(), "rendering directory tree");
        let mut out = String::new();
        self.render_level(root, SPACE, 1, &mut out)?;
        Ok(out)
    }

    fn render_level(
        &self,
        dir: &Path,
        indent: &str,
        depth: usize,
        out: &mut String,
    ) -> Result<(), TreeError> {
        let entries: Vec<Listing> = fs::list_dir(dir)
            .map_err(|source| TreeError::Enumerate {
                path: dir.to_path_buf(),
                source,
            })?
            .into_iter()
            .filter(|entry| {
                let ignored = self.patterns.is_ignored(&entry.path);
                if ignored {
                    tracing::trace!(path = %entry.path.display(), "skipping ignored entry");
                }
                !ignored
            })
            .collect();

        let count = entries.len();
        for (index, entry) in entries.iter().enumerate() {
            let is_last = index + 1 == count;
            out.push_str(indent);
            out.push_str(if is_last { CORNER } else { TEE });
            out.push_str(&entry.display_name());
            if entry.is_dir {
                out.push('/');
            }
            out.push('\n');

            if !entry.is_dir {
                continue;
            }
            if self.options.max_depth.is_some_and(|max| depth >= max) {
                tracing::debug!(path = %entry.path.display(), depth, "depth limit reached");
                continue;
            }
            let child_indent = format!("{indent}{}", if is_last { SPACE } else { PIPE });
            self.render_level(&entry.path, &child_indent, depth + 1, out)?;
        }
        Ok(())
    }
}
