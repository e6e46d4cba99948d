//! Prompt assembly: instruction, optional directory tree, and file contents.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::app::ignore::IgnorePatterns;
use crate::app::tree::{TreeError, TreeOptions, TreeRenderer};
use crate::domain::model::SelectedFiles;
use crate::infra::fs;

/// Character count above which the assembled prompt is flagged as oversized.
pub const WARNING_THRESHOLD: usize = 400_000;

/// Whether a prompt of `char_count` characters should raise the size warning.
pub fn exceeds_threshold(char_count: usize) -> bool {
    char_count > WARNING_THRESHOLD
}

/// What happened to one selected file during assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum FileStatus {
    /// Contents were read and appended.
    Included { characters: usize },
    /// Skipped because an ignore pattern matched.
    Ignored { pattern: String },
    /// The read failed; an error block was appended instead.
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    pub path: PathBuf,
    #[serde(flatten)]
    pub status: FileStatus,
}

/// Result of a single generation. Each call produces a fresh value.
#[derive(Debug)]
pub struct AssembledPrompt {
    pub text: String,
    pub char_count: usize,
    pub warn: bool,
    pub files: Vec<FileOutcome>,
    /// Set when the directory block was requested but the tree could not be rendered.
    pub directory_error: Option<TreeError>,
}

impl AssembledPrompt {
    /// Status label text, e.g. `Prompt size: 12,345 characters`.
    pub fn status_line(&self) -> String {
        format!("Prompt size: {} characters", format_count(self.char_count))
    }

    /// Advisory message shown when the prompt exceeds [`WARNING_THRESHOLD`].
    pub fn warning_message(&self) -> Option<String> {
        self.warn.then(|| {
            format!(
                "Your final prompt is approximately {} characters long.\n\n\
                 This may exceed the input limit for some language models.\n\
                 Consider trimming your input.",
                format_count(self.char_count)
            )
        })
    }

    pub fn failed_files(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files
            .iter()
            .filter(|outcome| matches!(outcome.status, FileStatus::Failed { .. }))
    }

    /// Serializable summary without the prompt text.
    pub fn report(&self) -> PromptReport {
        PromptReport {
            char_count: self.char_count,
            warn: self.warn,
            directory_error: self.directory_error.as_ref().map(ToString::to_string),
            files: self.files.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PromptReport {
    pub char_count: usize,
    pub warn: bool,
    pub directory_error: Option<String>,
    pub files: Vec<FileOutcome>,
}

/// Builds prompt text from the current inputs.
///
/// Selected files matching an ignore pattern are skipped before reading, the same filter the
/// tree applies.
#[derive(Debug, Clone, Copy)]
pub struct PromptAssembler<'a> {
    patterns: &'a IgnorePatterns,
    tree_options: TreeOptions,
}

impl<'a> PromptAssembler<'a> {
    pub fn new(patterns: &'a IgnorePatterns) -> Self {
        Self {
            patterns,
            tree_options: TreeOptions::default(),
        }
    }

    pub fn with_tree_options(mut self, options: TreeOptions) -> Self {
        self.tree_options = options;
        self
    }

    /// Assemble the prompt.
    ///
    /// `directory` is the tree root when the directory block is wanted. A directory that cannot
    /// be listed only drops the tree block; it is reported through
    /// [`AssembledPrompt::directory_error`]. File read failures are written into the text as
    /// error blocks.
    pub fn generate(
        &self,
        instruction: &str,
        files: &SelectedFiles,
        directory: Option<&Path>,
    ) -> AssembledPrompt {
        let mut blocks = vec![format!("{}\n", instruction.trim())];
        let mut directory_error = None;

        if let Some(dir) = directory {
            match TreeRenderer::new(self.patterns)
                .with_options(self.tree_options)
                .render(dir)
            {
                Ok(tree) if !tree.is_empty() => blocks.push(format!(
                    "\n--- Below is the folder structure of {} ---\n{tree}\n",
                    fs::base_name(dir)
                )),
                Ok(_) => tracing::debug!(dir = %dir.display(), "directory tree is empty"),
                Err(err) => {
                    tracing::warn!(error = %err, "skipping directory block");
                    directory_error = Some(err);
                }
            }
        }

        let mut outcomes = Vec::with_capacity(files.len());
        for path in files.iter() {
            if let Some(pattern) = self.patterns.matching_pattern(path) {
                tracing::debug!(path = %path.display(), pattern, "skipping ignored file");
                outcomes.push(FileOutcome {
                    path: path.to_path_buf(),
                    status: FileStatus::Ignored {
                        pattern: pattern.to_owned(),
                    },
                });
                continue;
            }

            let status = match fs::read_text(path) {
                Ok(contents) => {
                    let characters = contents.chars().count();
                    blocks.push(format!(
                        "\n--- Below is my {} ---\n{contents}",
                        fs::base_name(path)
                    ));
                    FileStatus::Included { characters }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "recording unreadable file");
                    let message = err.reason();
                    blocks.push(format!(
                        "\n--- Below is my {} ---\n[Error reading file: {message}]",
                        path.display()
                    ));
                    FileStatus::Failed { message }
                }
            };
            outcomes.push(FileOutcome {
                path: path.to_path_buf(),
                status,
            });
        }

        let text = blocks.join("\n");
        let char_count = text.chars().count();
        let warn = exceeds_threshold(char_count);
        tracing::info!(char_count, warn, files = outcomes.len(), "assembled prompt");

        AssembledPrompt {
            text,
            char_count,
            warn,
            files: outcomes,
            directory_error,
        }
    }
}

/// Format an integer with `,` thousands separators.
pub fn format_count(value: usize) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use anyhow::Result;

    #[test]
    fn instruction_only() {
        let patterns = IgnorePatterns::new();
        let prompt = PromptAssembler::new(&patterns).generate(
            "  Explain this.\n\n",
            &SelectedFiles::new(),
            None,
        );
        assert_eq!(prompt.text, "Explain this.\n");
        assert_eq!(prompt.char_count, 14);
        assert!(!prompt.warn);
        assert!(prompt.files.is_empty());
    }

    #[test]
    fn missing_file_becomes_error_block() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let present = temp.path().join("x.py");
        let missing = temp.path().join("y.py");
        fs::write(&present, "print('x')\n")?;

        let files: SelectedFiles = [present.clone(), missing.clone()].into_iter().collect();
        let patterns = IgnorePatterns::new();
        let prompt = PromptAssembler::new(&patterns).generate("Review", &files, None);

        let expected_head = "Review\n\n\n--- Below is my x.py ---\nprint('x')\n\n\n--- Below is my ";
        assert!(prompt.text.starts_with(expected_head));
        assert!(prompt.text.contains(&format!(
            "--- Below is my {} ---\n[Error reading file: ",
            missing.display()
        )));
        assert!(prompt.text.ends_with(']'));

        assert_eq!(
            prompt.files[0].status,
            FileStatus::Included { characters: 11 }
        );
        assert!(matches!(prompt.files[1].status, FileStatus::Failed { .. }));
        assert_eq!(prompt.failed_files().count(), 1);
        Ok(())
    }

    #[test]
    fn file_contents_are_kept_verbatim() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("notes.md");
        fs::write(&path, "line\n\n  trailing  \n\n")?;
        let files: SelectedFiles = [path].into_iter().collect();
        let patterns = IgnorePatterns::new();
        let prompt = PromptAssembler::new(&patterns).generate("Go", &files, None);
        assert_eq!(
            prompt.text,
            "Go\n\n\n--- Below is my notes.md ---\nline\n\n  trailing  \n\n"
        );
        Ok(())
    }

    #[test]
    fn ignored_selected_files_are_skipped() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let kept = temp.path().join("main.rs");
        let skipped = temp.path().join("debug.log");
        fs::write(&kept, "fn main() {}")?;
        fs::write(&skipped, "noise")?;

        let files: SelectedFiles = [skipped.clone(), kept].into_iter().collect();
        let patterns = IgnorePatterns::parse("*.log");
        let prompt = PromptAssembler::new(&patterns).generate("Fix", &files, None);

        assert!(!prompt.text.contains("noise"));
        assert!(!prompt.text.contains("debug.log"));
        assert!(prompt.text.contains("--- Below is my main.rs ---\nfn main() {}"));
        assert_eq!(
            prompt.files[0],
            FileOutcome {
                path: skipped,
                status: FileStatus::Ignored {
                    pattern: "*.log".into()
                },
            }
        );
        Ok(())
    }

    #[test]
    fn directory_block_precedes_files() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let project = temp.path().join("project");
        fs::create_dir_all(project.join("src"))?;
        fs::write(project.join("src/lib.rs"), "pub fn f() {}")?;
        fs::write(project.join("README.md"), "readme")?;

        let files: SelectedFiles = [project.join("README.md")].into_iter().collect();
        let patterns = IgnorePatterns::new();
        let prompt =
            PromptAssembler::new(&patterns).generate("Summarize", &files, Some(project.as_path()));

        let expected = [
            "Summarize\n",
            "\n--- Below is the folder structure of project ---\n    ├── README.md\n    └── src/\n        └── lib.rs\n\n",
            "\n--- Below is my README.md ---\nreadme",
        ]
        .join("\n");
        assert_eq!(prompt.text, expected);
        assert!(prompt.directory_error.is_none());
        Ok(())
    }

    #[test]
    fn empty_tree_adds_no_block() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let patterns = IgnorePatterns::new();
        let prompt = PromptAssembler::new(&patterns).generate(
            "Hi",
            &SelectedFiles::new(),
            Some(temp.path()),
        );
        assert_eq!(prompt.text, "Hi\n");
        Ok(())
    }

    #[test]
    fn unreadable_directory_only_drops_the_tree() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let file = temp.path().join("a.txt");
        fs::write(&file, "alpha")?;
        let gone = temp.path().join("missing-dir");

        let files: SelectedFiles = [file].into_iter().collect();
        let patterns = IgnorePatterns::new();
        let prompt = PromptAssembler::new(&patterns).generate("Hi", &files, Some(gone.as_path()));

        assert_eq!(prompt.text, "Hi\n\n\n--- Below is my a.txt ---\nalpha");
        let err = prompt.directory_error.expect("directory error recorded");
        assert_eq!(err.path(), gone.as_path());
        Ok(())
    }

    #[test]
    fn char_count_counts_characters_not_bytes() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("u.txt");
        fs::write(&path, "héllo ✓")?;
        let files: SelectedFiles = [path].into_iter().collect();
        let patterns = IgnorePatterns::new();
        let prompt = PromptAssembler::new(&patterns).generate("ünï", &files, None);
        assert_eq!(prompt.char_count, prompt.text.chars().count());
        assert!(prompt.char_count < prompt.text.len());
        Ok(())
    }

    #[test]
    fn warning_threshold_boundaries() {
        let patterns = IgnorePatterns::new();
        let assembler = PromptAssembler::new(&patterns);

        // The instruction block adds one trailing newline.
        let at_limit = assembler.generate(&"a".repeat(399_999), &SelectedFiles::new(), None);
        assert_eq!(at_limit.char_count, 400_000);
        assert!(!at_limit.warn);
        assert!(at_limit.warning_message().is_none());

        let over = assembler.generate(&"a".repeat(400_000), &SelectedFiles::new(), None);
        assert_eq!(over.char_count, 400_001);
        assert!(over.warn);
        assert!(over.warning_message().unwrap().contains("400,001"));

        assert!(!exceeds_threshold(WARNING_THRESHOLD));
        assert!(exceeds_threshold(WARNING_THRESHOLD + 1));
    }

    #[test]
    fn generation_is_repeatable() -> Result<()> {
        let temp = tempfile::tempdir()?;
        fs::write(temp.path().join("a.txt"), "alpha")?;
        fs::create_dir(temp.path().join("nested"))?;
        fs::write(temp.path().join("nested/b.txt"), "beta")?;
        let files: SelectedFiles = [temp.path().join("a.txt"), temp.path().join("zzz.txt")]
            .into_iter()
            .collect();
        let patterns = IgnorePatterns::parse("*.tmp");
        let assembler = PromptAssembler::new(&patterns);

        let first = assembler.generate("Same", &files, Some(temp.path()));
        let second = assembler.generate("Same", &files, Some(temp.path()));
        assert_eq!(first.text, second.text);
        assert_eq!(first.char_count, second.char_count);
        Ok(())
    }

    #[test]
    fn status_line_uses_separators() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1_000), "1,000");
        assert_eq!(format_count(400_001), "400,001");
        assert_eq!(format_count(12_345_678), "12,345,678");

        let patterns = IgnorePatterns::new();
        let prompt = PromptAssembler::new(&patterns).generate("x", &SelectedFiles::new(), None);
        assert_eq!(prompt.status_line(), "Prompt size: 2 characters");
    }
}
