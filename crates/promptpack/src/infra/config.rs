//! Configuration management utilities.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::app::ignore::IgnorePatterns;
use crate::app::tree::TreeOptions;

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static DEFAULT_WORKSPACE_CONFIG_PATH: &str = ".promptpack/config.toml";

/// Layered configuration loaded from defaults, user, workspace, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub ignore: Ignore,
    #[serde(default)]
    pub tree: Tree,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defaults {
    /// Copy every generated prompt to the clipboard.
    #[serde(default)]
    pub copy_to_clipboard: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ignore {
    #[serde(default)]
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    #[serde(default)]
    pub max_depth: Option<usize>,
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    max_depth: Option<String>,
    copy_to_clipboard: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            max_depth: env::var("PROMPTPACK_MAX_DEPTH").ok(),
            copy_to_clipboard: env::var("PROMPTPACK_COPY").ok(),
        }
    }

    #[cfg(test)]
    fn for_tests(max_depth: &str, copy: &str) -> Self {
        Self {
            max_depth: Some(max_depth.to_owned()),
            copy_to_clipboard: Some(copy.to_owned()),
        }
    }
}

impl Config {
    /// Load configuration from defaults, user/global config, workspace config, and env overrides.
    pub fn load() -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let workspace = workspace_config_path()?;
        Self::load_with_layers(global, workspace, env)
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        workspace: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = vec![Self::from_str(&DEFAULT_CONFIG)?];

        for path in [global, workspace].into_iter().flatten() {
            if path.exists() {
                tracing::debug!(path = %path.display(), "loading config layer");
                layers.push(Self::from_file(&path)?);
            }
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        Ok(apply_env_overrides(merged, env_overrides))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data).with_context(|| format!("invalid config file: {}", path.display()))
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    fn merge(self, other: Self) -> Self {
        Self {
            defaults: Defaults {
                copy_to_clipboard: self.defaults.copy_to_clipboard
                    || other.defaults.copy_to_clipboard,
            },
            ignore: merge_ignore(self.ignore, other.ignore),
            tree: Tree {
                max_depth: other.tree.max_depth.or(self.tree.max_depth),
            },
        }
    }

    /// Configured ignore patterns as a matcher.
    pub fn ignore_patterns(&self) -> IgnorePatterns {
        IgnorePatterns::from_patterns(self.ignore.patterns.iter().cloned())
    }

    pub fn tree_options(&self) -> TreeOptions {
        TreeOptions::default().with_max_depth(self.tree.max_depth)
    }
}

/// Ordered union: earlier layers first, repeated patterns dropped.
fn merge_ignore(base: Ignore, overlay: Ignore) -> Ignore {
    let mut patterns = base.patterns;
    for pattern in overlay.patterns {
        if !patterns.contains(&pattern) {
            patterns.push(pattern);
        }
    }
    Ignore { patterns }
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("promptpack/config.toml"))
}

fn workspace_config_path() -> Result<Option<PathBuf>> {
    let cwd = env::current_dir()?;
    let root = find_repo_root(&cwd).unwrap_or(cwd);
    Ok(Some(root.join(DEFAULT_WORKSPACE_CONFIG_PATH)))
}

fn find_repo_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Config {
    if let Some(raw) = env.max_depth {
        match raw.trim().parse::<usize>() {
            Ok(depth) => config.tree.max_depth = Some(depth),
            Err(err) => tracing::warn!(value = %raw, error = %err, "ignoring PROMPTPACK_MAX_DEPTH"),
        }
    }
    if let Some(raw) = env.copy_to_clipboard {
        config.defaults.copy_to_clipboard = parse_flag(&raw);
    }
    config
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
