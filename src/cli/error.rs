//! CLI errors and exit codes
//!
//! | Code | Meaning                                   |
//! |------|-------------------------------------------|
//! | 0    | Success                                   |
//! | 1    | Unknown command, storage or internal error|
//! | 2    | Usage or validation error                 |
//! | 3    | Task not found                            |
//! | 4    | Status change not allowed                 |

use std::process::ExitCode;

use thiserror::Error;

use crate::domain::{TaskError, ValidationError};

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_USAGE: u8 = 2;
pub const EXIT_NOT_FOUND: u8 = 3;
pub const EXIT_INVALID_TRANSITION: u8 = 4;

#[derive(Debug, Error, PartialEq)]
pub enum CliError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("Nothing to change: pass --title and/or --description")]
    EmptyEdit,
}

/// Picks the exit code for an error by looking through its cause chain
pub fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    ExitCode::from(code_for(err))
}

fn code_for(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if let Some(cli) = cause.downcast_ref::<CliError>() {
            return match cli {
                CliError::UnknownCommand(_) => EXIT_FAILURE,
                CliError::EmptyEdit => EXIT_USAGE,
            };
        }
        if let Some(task) = cause.downcast_ref::<TaskError>() {
            return match task {
                TaskError::Validation(_) => EXIT_USAGE,
                TaskError::NotFound(_) => EXIT_NOT_FOUND,
                TaskError::InvalidTransition { .. } => EXIT_INVALID_TRANSITION,
                TaskError::DuplicateId(_) | TaskError::IdsExhausted => EXIT_FAILURE,
            };
        }
        if cause.downcast_ref::<ValidationError>().is_some() {
            return EXIT_USAGE;
        }
    }
    EXIT_FAILURE
}
