//! # Storage Layer
//!
//! Persistence for taskwerk with git-friendly file formats.
//!
//! | Data   | Format                           | Location                 |
//! |--------|----------------------------------|--------------------------|
//! | Tasks  | JSONL (header + one task a line) | `.taskwerk/tasks.jsonl`  |
//! | Config | TOML                             | `.taskwerk/config.toml`  |
//!
//! ## Concurrency
//!
//! - [`TaskFile::load`] holds a shared `fs2` lock on the task file while reading
//! - [`TaskFile::save`] holds an exclusive lock on the current task file while
//!   it writes a temp file and renames it into place
//! - No lock spans load to commit, so two invocations racing on the same
//!   project are last-writer-wins
//!
//! ## Key Types
//!
//! - [`Project`] - Entry point for accessing a taskwerk project
//! - [`Session`] - Loads the task store and commits it back
//! - [`TaskFile`] - Reads/writes the JSONL task file
//! - [`ProjectConfig`] / [`GlobalConfig`] - Project and user configuration

mod config;
mod jsonl;
mod project;
mod session;

pub use config::{
    find_project_root, global_config_dir, ConfigError, GlobalConfig, ProjectConfig, DATA_DIR,
};
pub use jsonl::TaskFile;
pub use project::{Project, ProjectError};
pub use session::{CommitOutcome, Session};
