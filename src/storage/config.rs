//! Configuration handling for taskwerk
//!
//! Configuration is stored in `.taskwerk/config.toml` (project) and
//! `~/.config/taskwerk/config.toml` (global). `TASKWERK_CONFIG_DIR`
//! overrides the global directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::OutputFormat;
use crate::domain::ListOrder;

/// Name of the per-project data directory
pub const DATA_DIR: &str = ".taskwerk";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Project-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ProjectConfig {
    /// Order used by `list` when `--order` is not given
    pub default_order: ListOrder,

    /// Hide done and cancelled tasks from `list` unless `--all` is given
    pub hide_closed: bool,
}

/// Global user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct GlobalConfig {
    /// Default output format (text or json)
    pub default_format: OutputFormat,
}

impl ProjectConfig {
    /// Loads the configuration of the project rooted at `project_root`
    pub fn load(project_root: &Path) -> Result<Self> {
        read_toml(&project_root.join(DATA_DIR).join("config.toml"), "project")
    }
}

impl GlobalConfig {
    /// Loads global configuration; a missing file means defaults
    pub fn load() -> Result<Self> {
        match global_config_dir() {
            Some(dir) => read_toml(&dir.join("config.toml"), "global"),
            None => Ok(Self::default()),
        }
    }
}

/// Returns the global config directory
pub fn global_config_dir() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os("TASKWERK_CONFIG_DIR") {
        return Some(PathBuf::from(dir));
    }
    ProjectDirs::from("dev", "taskwerk", "taskwerk").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Finds the project root by looking for a `.taskwerk/` directory in
/// `start` or any of its parents
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        if current.join(DATA_DIR).is_dir() {
            return Some(current);
        }

        if !current.pop() {
            return None;
        }
    }
}

fn read_toml<T: Default + for<'de> Deserialize<'de>>(path: &Path, kind: &str) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} config: {}", kind, path.display()))?;

    toml::from_str(&content)
        .map_err(|e| ConfigError::Parse(e.to_string()))
        .with_context(|| format!("Failed to parse {} config: {}", kind, path.display()))
}
