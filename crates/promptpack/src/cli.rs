//! Command-line front-end.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use crate::app::assemble::{AssembledPrompt, PromptReport};
use crate::app::export::{self, ExportOptions};
use crate::app::ignore::{self, IgnorePatterns};
use crate::app::state::PromptState;
use crate::infra::config::Config;

/// Per-directory ignore file picked up when a directory is given.
pub const IGNORE_FILE: &str = ".promptpackignore";

#[derive(Debug, Parser)]
#[command(
    name = "promptpack",
    author,
    version,
    about = "Assemble an LLM prompt from an instruction, a directory tree, and file contents",
    long_about = None
)]
pub struct Cli {
    /// Files to include, in order. Duplicates and ignored paths are dropped.
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Instruction placed at the top of the prompt.
    #[arg(short, long, value_name = "TEXT", conflicts_with = "instruction_file")]
    pub instruction: Option<String>,

    /// Read the instruction from a file, or `-` for stdin.
    #[arg(long, value_name = "PATH")]
    pub instruction_file: Option<PathBuf>,

    /// Include the folder structure of this directory.
    #[arg(short, long, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Ignore pattern (repeatable), matched against full paths and file names.
    #[arg(long = "ignore", value_name = "PATTERN")]
    pub ignore: Vec<String>,

    /// File with one ignore pattern per line (`#` starts a comment).
    #[arg(long, value_name = "PATH")]
    pub ignore_file: Option<PathBuf>,

    /// Save the prompt to this path (`.txt` is added when there is no extension).
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Copy the prompt to the clipboard.
    #[arg(short, long)]
    pub copy: bool,

    /// Print a JSON report with the prompt text instead of the raw prompt.
    #[arg(long)]
    pub json: bool,

    /// Do not descend below this many directory levels in the tree.
    #[arg(long, value_name = "N")]
    pub max_depth: Option<usize>,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    text: &'a str,
    #[serde(flatten)]
    report: PromptReport,
}

/// Parse arguments from the process and run.
pub fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;
    let stdout = io::stdout();
    let stderr = io::stderr();
    run(cli, &config, &mut stdout.lock(), &mut stderr.lock())
}

/// Build the prompt described by `cli` and hand it to the requested sinks.
pub fn run(cli: Cli, config: &Config, out: &mut impl Write, err: &mut impl Write) -> Result<()> {
    let state = build_state(&cli, config)?;
    let prompt = state.generate();

    if let Some(dir_err) = &prompt.directory_error {
        writeln!(err, "Failed to process directory: {dir_err}")?;
    }
    for failed in prompt.failed_files() {
        tracing::debug!(path = %failed.path.display(), "file block contains a read error");
    }

    let options = ExportOptions {
        output_path: cli.output.clone(),
        copy_to_clipboard: cli.copy || config.defaults.copy_to_clipboard,
    };
    let exported = export::export(&prompt.text, &options)?;

    if cli.json {
        write_json(&prompt, out)?;
    } else if exported.output_path.is_none() {
        out.write_all(prompt.text.as_bytes())?;
        out.flush()?;
    }

    writeln!(err, "{}", prompt.status_line())?;
    if let Some(path) = &exported.output_path {
        writeln!(err, "Prompt saved to {}", path.display())?;
    }
    if let Some(backend) = exported.clipboard {
        writeln!(err, "Copied to clipboard ({backend})")?;
    }
    if let Some(message) = prompt.warning_message() {
        writeln!(err, "Prompt Size Warning: {message}")?;
    }
    Ok(())
}

fn build_state(cli: &Cli, config: &Config) -> Result<PromptState> {
    let mut state = PromptState::new();
    state.set_instruction(read_instruction(cli)?);
    state.set_patterns(collect_patterns(cli, config)?);

    let mut tree_options = config.tree_options();
    if cli.max_depth.is_some() {
        tree_options = tree_options.with_max_depth(cli.max_depth);
    }
    state.set_tree_options(tree_options);

    if let Some(dir) = &cli.directory {
        state.choose_directory(absolute(dir));
        state.set_include_directory(true);
    }

    let requested = cli.files.len();
    let added = state.add_files(cli.files.iter().map(|path| absolute(path)));
    if added < requested {
        tracing::info!(requested, added, "some files were ignored or repeated");
    }
    Ok(state)
}

fn read_instruction(cli: &Cli) -> Result<String> {
    if let Some(text) = &cli.instruction {
        return Ok(text.clone());
    }
    match cli.instruction_file.as_deref() {
        Some(path) if path == Path::new("-") => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("failed to read instruction from stdin")?;
            Ok(text)
        }
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read instruction file {}", path.display())),
        None => Ok(String::new()),
    }
}

/// Config patterns, then the directory's ignore file, then `--ignore-file`, then `--ignore`.
fn collect_patterns(cli: &Cli, config: &Config) -> Result<IgnorePatterns> {
    let mut extra = Vec::new();
    if let Some(dir) = &cli.directory {
        let local = dir.join(IGNORE_FILE);
        if local.is_file() {
            extra.extend(read_pattern_file(&local)?);
        }
    }
    if let Some(path) = &cli.ignore_file {
        extra.extend(read_pattern_file(path)?);
    }
    extra.extend(cli.ignore.iter().cloned());

    Ok(config.ignore_patterns().extend(extra))
}

fn read_pattern_file(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read ignore file {}", path.display()))?;
    Ok(ignore::parse_lines(&text))
}

fn write_json(prompt: &AssembledPrompt, out: &mut impl Write) -> Result<()> {
    let payload = JsonOutput {
        text: &prompt.text,
        report: prompt.report(),
    };
    serde_json::to_writer_pretty(&mut *out, &payload).context("failed to serialize report")?;
    writeln!(out)?;
    Ok(())
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("promptpack").chain(args.iter().copied()))
            .expect("valid arguments")
    }

    fn run_to_strings(cli: Cli, config: &Config) -> Result<(String, String)> {
        let mut out = Vec::new();
        let mut err = Vec::new();
        run(cli, config, &mut out, &mut err)?;
        Ok((String::from_utf8(out)?, String::from_utf8(err)?))
    }

    #[test]
    fn prints_prompt_and_status() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let file = temp.path().join("main.rs");
        fs::write(&file, "fn main() {}")?;

        let cli = parse(&["-i", "Review this", file.to_str().unwrap()]);
        let (out, err) = run_to_strings(cli, &Config::default())?;

        assert_eq!(out, "Review this\n\n\n--- Below is my main.rs ---\nfn main() {}");
        assert!(err.contains("Prompt size: 54 characters"));
        Ok(())
    }

    #[test]
    fn directory_ignore_file_and_flags_combine() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let root = temp.path().join("demo");
        fs::create_dir_all(root.join("target"))?;
        fs::write(root.join("target/out.bin"), "x")?;
        fs::write(root.join("lib.rs"), "pub fn lib() {}")?;
        fs::write(root.join("notes.log"), "log")?;
        fs::write(root.join(IGNORE_FILE), "target\n# comment\n")?;

        let cli = parse(&[
            "-i",
            "Layout",
            "-d",
            root.to_str().unwrap(),
            "--ignore",
            "*.log",
            "--ignore",
            IGNORE_FILE,
        ]);
        let (out, _) = run_to_strings(cli, &Config::default())?;

        assert_eq!(
            out,
            "Layout\n\n\n--- Below is the folder structure of demo ---\n    └── lib.rs\n\n"
        );
        Ok(())
    }

    #[test]
    fn missing_directory_is_reported_separately() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let gone = temp.path().join("gone");
        let cli = parse(&["-i", "Hi", "-d", gone.to_str().unwrap()]);
        let (out, err) = run_to_strings(cli, &Config::default())?;
        assert_eq!(out, "Hi\n");
        assert!(err.contains("Failed to process directory"));
        Ok(())
    }

    #[test]
    fn output_file_replaces_stdout() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let target = temp.path().join("prompt");
        let cli = parse(&["-i", "Saved", "-o", target.to_str().unwrap()]);
        let (out, err) = run_to_strings(cli, &Config::default())?;

        assert!(out.is_empty());
        assert_eq!(fs::read_to_string(temp.path().join("prompt.txt"))?, "Saved\n");
        assert!(err.contains("Prompt saved to"));
        Ok(())
    }

    #[test]
    fn json_report_lists_file_outcomes() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let missing = temp.path().join("missing.py");
        let cli = parse(&["--json", "-i", "Check", missing.to_str().unwrap()]);
        let (out, _) = run_to_strings(cli, &Config::default())?;

        let value: serde_json::Value = serde_json::from_str(&out)?;
        assert_eq!(value["warn"], false);
        assert_eq!(value["files"][0]["status"], "failed");
        assert!(value["text"].as_str().unwrap().contains("[Error reading file:"));
        assert_eq!(
            value["char_count"].as_u64().unwrap() as usize,
            value["text"].as_str().unwrap().chars().count()
        );
        Ok(())
    }

    #[test]
    fn config_patterns_apply() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let lock = temp.path().join("Cargo.lock");
        fs::write(&lock, "lock")?;

        let mut config = Config::default();
        config.ignore.patterns.push("*.lock".into());
        let cli = parse(&["-i", "Deps", lock.to_str().unwrap()]);
        let (out, _) = run_to_strings(cli, &config)?;
        assert_eq!(out, "Deps\n");
        Ok(())
    }

    #[test]
    fn instruction_and_instruction_file_conflict() {
        let result = Cli::try_parse_from(["promptpack", "-i", "a", "--instruction-file", "b.txt"]);
        assert!(result.is_err());
    }
}
