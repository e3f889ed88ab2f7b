//! # Command-Line Interface
//!
//! User-facing commands, command resolution and output formatting.
//!
//! ## Commands
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Core | Program and project | `about`, `init` |
//! | Tasks | Work item management | `add`, `list`, `show`, `edit`, `meta`, `remove` |
//! | Status | Lifecycle changes | `status`, `start`, `pause`, `done`, `cancel` |
//!
//! ## Output Formats
//!
//! All commands support the `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`, or `TASKWERK_VERBOSE=1`) for debug output on stderr:
//! ```bash
//! taskwerk --verbose list
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments, execute the resolved operation and get
//! the process exit code.

mod app;
mod error;
mod info;
mod operation;
mod output;
mod task;

pub use app::{build_command, run, Cli, Commands};
pub use error::{
    exit_code_for, CliError, EXIT_FAILURE, EXIT_INVALID_TRANSITION, EXIT_NOT_FOUND,
    EXIT_SUCCESS, EXIT_USAGE,
};
pub use info::AppInfo;
pub use operation::{ListRequest, Operation, TaskOperation};
pub use output::{Output, OutputFormat};
pub use task::Report;
