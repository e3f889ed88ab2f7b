//! taskwerk - A task management CLI
//!
//! Tasks live in `.taskwerk/tasks.jsonl` under a project root. Each
//! invocation loads the file, runs exactly one operation against the
//! in-memory [`TaskStore`], and writes the file back if anything changed.

pub mod domain;
pub mod storage;
pub mod cli;

pub use cli::AppInfo;
pub use domain::{Task, TaskError, TaskId, TaskStatus, TaskStore, ValidationError};
