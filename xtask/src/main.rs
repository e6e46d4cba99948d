use std::process::Command;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about = "Project automation commands", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the test suite with cargo nextest
    Nextest {
        #[arg(long)]
        profile: Option<String>,
        /// Only run tests whose name contains this filter
        filter: Option<String>,
    },
    /// Check formatting and clippy lints
    Lint,
    /// Lint, then test
    Ci,
}

fn main() -> Result<()> {
    match Cli::parse().command {
        Commands::Nextest { profile, filter } => nextest(profile.as_deref(), filter.as_deref()),
        Commands::Lint => lint(),
        Commands::Ci => {
            lint()?;
            nextest(Some("ci"), None)
        }
    }
}

fn nextest(profile: Option<&str>, filter: Option<&str>) -> Result<()> {
    let mut args = vec!["nextest", "run", "--workspace"];
    if let Some(profile) = profile {
        args.extend(["--profile", profile]);
    }
    args.extend(filter);
    cargo(&args)
}

fn lint() -> Result<()> {
    cargo(&["fmt", "--all", "--check"])?;
    cargo(&["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"])
}

fn cargo(args: &[&str]) -> Result<()> {
    let status = Command::new(env!("CARGO")).args(args).status()?;
    if !status.success() {
        bail!("cargo {} failed", args.join(" "));
    }
    Ok(())
}
