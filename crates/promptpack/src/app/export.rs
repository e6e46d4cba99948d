//! Handing the assembled prompt to a file or the clipboard.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::infra::clipboard::{Backend, Clipboard};

/// Extension appended to save paths that have none.
pub const DEFAULT_EXTENSION: &str = "txt";

/// Where a generated prompt should go besides being returned to the caller.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    pub output_path: Option<PathBuf>,
    pub copy_to_clipboard: bool,
}

/// Result of an export operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportResult {
    pub output_path: Option<PathBuf>,
    pub clipboard: Option<Backend>,
}

/// Write `text` as UTF-8 to `path`, adding `.txt` when the path has no extension.
///
/// Returns the path actually written.
pub fn save_prompt(text: &str, path: &Path) -> Result<PathBuf> {
    let path = with_default_extension(path);
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    fs::write(&path, text)
        .with_context(|| format!("failed to write prompt to {}", path.display()))?;
    tracing::info!(path = %path.display(), "prompt saved");
    Ok(path)
}

/// Save and/or copy the prompt according to `options`.
pub fn export(text: &str, options: &ExportOptions) -> Result<ExportResult> {
    let output_path = options
        .output_path
        .as_deref()
        .map(|path| save_prompt(text, path))
        .transpose()?;

    let clipboard = if options.copy_to_clipboard {
        let backend = Clipboard::new()
            .copy(text)
            .context("failed to copy prompt to clipboard")?;
        tracing::info!(%backend, chars = text.chars().count(), "prompt copied");
        Some(backend)
    } else {
        None
    };

    Ok(ExportResult {
        output_path,
        clipboard,
    })
}

fn with_default_extension(path: &Path) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension(DEFAULT_EXTENSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saves_with_default_extension() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let written = save_prompt("hello\n", &temp.path().join("out/prompt"))?;
        assert_eq!(written, temp.path().join("out/prompt.txt"));
        assert_eq!(fs::read_to_string(&written)?, "hello\n");
        Ok(())
    }

    #[test]
    fn keeps_explicit_extension() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let written = save_prompt("ü", &temp.path().join("prompt.md"))?;
        assert_eq!(written, temp.path().join("prompt.md"));
        assert_eq!(fs::read_to_string(written)?, "ü");
        Ok(())
    }

    #[test]
    fn export_without_targets_is_a_no_op() -> Result<()> {
        let result = export("text", &ExportOptions::default())?;
        assert_eq!(result, ExportResult::default());
        Ok(())
    }
}
