//! Domain errors
//!
//! Every failure the task engine can report. None of these are fatal to the
//! process; the CLI turns them into a message and an exit code.

use thiserror::Error;

use super::id::{IdError, TaskId};
use super::task::TaskStatus;

/// Malformed input data
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("Task title must not be empty")]
    EmptyTitle,

    #[error("Unknown status '{0}' (expected one of: open, in_progress, done, cancelled)")]
    UnknownStatus(String),

    #[error("Metadata key must not be empty")]
    EmptyMetaKey,

    #[error("Task {id} was updated before it was created")]
    TimestampOrder { id: TaskId },

    #[error(transparent)]
    InvalidId(#[from] IdError),
}

/// Errors returned by task store operations
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TaskError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Task not found: {0}")]
    NotFound(TaskId),

    #[error("Cannot move task {id} from {from} to {to}{}", hint_for(.from, .to))]
    InvalidTransition {
        id: TaskId,
        from: TaskStatus,
        to: TaskStatus,
    },

    /// The store already holds a record with this ID. Indicates a corrupted
    /// task file or a bug in ID allocation, never user error.
    #[error("Internal error: duplicate task ID {0}")]
    DuplicateId(TaskId),

    #[error("Internal error: task ID space exhausted")]
    IdsExhausted,
}

fn hint_for(from: &TaskStatus, to: &TaskStatus) -> &'static str {
    if from.is_terminal() {
        " (task is closed)"
    } else if from == to {
        " (already in that state)"
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u64) -> TaskId {
        TaskId::new(n).unwrap()
    }

    #[test]
    fn invalid_transition_message_mentions_both_states() {
        let err = TaskError::InvalidTransition {
            id: id(3),
            from: TaskStatus::Open,
            to: TaskStatus::Done,
        };
        assert_eq!(err.to_string(), "Cannot move task TASK-003 from open to done");
    }

    #[test]
    fn invalid_transition_hints() {
        let closed = TaskError::InvalidTransition {
            id: id(1),
            from: TaskStatus::Done,
            to: TaskStatus::Open,
        };
        assert!(closed.to_string().ends_with("(task is closed)"));

        let same = TaskError::InvalidTransition {
            id: id(1),
            from: TaskStatus::Open,
            to: TaskStatus::Open,
        };
        assert!(same.to_string().ends_with("(already in that state)"));
    }

    #[test]
    fn id_errors_convert_to_validation() {
        let err: ValidationError = "nope".parse::<TaskId>().unwrap_err().into();
        assert!(matches!(err, ValidationError::InvalidId(_)));
    }
}
