//! Project management
//!
//! Handles project initialization and discovery, and provides access to the
//! task file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use super::config::{find_project_root, DATA_DIR};
use super::{ProjectConfig, TaskFile};

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Not in a taskwerk project. Run 'taskwerk init' first.")]
    NotInProject,

    #[error("No taskwerk project at {0}. Run 'taskwerk init' first.")]
    MissingAt(PathBuf),
}

/// A taskwerk project
pub struct Project {
    root: PathBuf,
    config: ProjectConfig,
}

impl Project {
    /// Opens an existing project at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        if !root.join(DATA_DIR).is_dir() {
            return Err(ProjectError::MissingAt(root).into());
        }

        let config = ProjectConfig::load(&root)?;

        Ok(Self { root, config })
    }

    /// Opens the project containing `start` (or one of its parents)
    pub fn discover(start: &Path) -> Result<Self> {
        let root = find_project_root(start).ok_or(ProjectError::NotInProject)?;

        Self::open(root)
    }

    /// Initializes a new project at the given path
    ///
    /// Existing files are left alone, so running it twice is harmless.
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let data_dir = root.join(DATA_DIR);

        fs::create_dir_all(&data_dir).with_context(|| {
            format!("Failed to create {} directory: {}", DATA_DIR, data_dir.display())
        })?;

        let config_path = data_dir.join("config.toml");
        if !config_path.exists() {
            let default_config = r#"# taskwerk configuration

# Order used by 'taskwerk list': "inserted", "title" or "updated"
default_order = "inserted"

# Hide done and cancelled tasks from 'taskwerk list' (override with --all)
hide_closed = false
"#;
            fs::write(&config_path, default_config)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        let gitignore_path = data_dir.join(".gitignore");
        if !gitignore_path.exists() {
            fs::write(&gitignore_path, "# Leftover from interrupted writes\n*.tmp\n")
                .with_context(|| {
                    format!("Failed to write .gitignore: {}", gitignore_path.display())
                })?;
        }

        Self::open(root)
    }

    /// Returns the project root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the .taskwerk directory path
    pub fn data_dir(&self) -> PathBuf {
        self.root.join(DATA_DIR)
    }

    /// Returns the project configuration
    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// Returns the task file
    pub fn task_file(&self) -> TaskFile {
        TaskFile::in_dir(&self.data_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn init_creates_structure() {
        let dir = TempDir::new().unwrap();
        let project = Project::init(dir.path()).unwrap();

        assert!(project.data_dir().is_dir());
        assert!(project.data_dir().join("config.toml").is_file());
        assert!(project.data_dir().join(".gitignore").is_file());
    }

    #[test]
    fn init_writes_parseable_config() {
        let dir = TempDir::new().unwrap();
        let project = Project::init(dir.path()).unwrap();

        assert_eq!(project.config(), &ProjectConfig::default());
    }

    #[test]
    fn init_is_idempotent() {
        let dir = TempDir::new().unwrap();

        Project::init(dir.path()).unwrap();
        Project::init(dir.path()).unwrap();

        assert!(dir.path().join(DATA_DIR).is_dir());
    }

    #[test]
    fn open_existing_project() {
        let dir = TempDir::new().unwrap();
        Project::init(dir.path()).unwrap();

        let project = Project::open(dir.path()).unwrap();
        assert_eq!(project.root(), dir.path());
    }

    #[test]
    fn open_non_project_fails() {
        let dir = TempDir::new().unwrap();
        let err = Project::open(dir.path()).err().unwrap();

        assert!(matches!(
            err.downcast_ref::<ProjectError>(),
            Some(ProjectError::MissingAt(_))
        ));
    }

    #[test]
    fn discover_from_subdirectory() {
        let dir = TempDir::new().unwrap();
        Project::init(dir.path()).unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        let project = Project::discover(&nested).unwrap();
        assert_eq!(project.root(), dir.path());
    }

    #[test]
    fn task_file_lives_in_data_dir() {
        let dir = TempDir::new().unwrap();
        let project = Project::init(dir.path()).unwrap();

        assert!(project.task_file().path().ends_with(".taskwerk/tasks.jsonl"));
    }
}
