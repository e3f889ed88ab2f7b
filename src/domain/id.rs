//! Task identifiers
//!
//! ID Format: `TASK-{sequence}` with the sequence zero-padded to three digits
//! (e.g., `TASK-001`, `TASK-042`, `TASK-1234`).
//!
//! Sequences come from the store's high-water mark, so an ID is never handed
//! out twice even after the task holding it is removed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const PREFIX: &str = "TASK-";

#[derive(Debug, Clone, Error, PartialEq)]
pub enum IdError {
    #[error("Invalid task ID format: expected 'TASK-{{number}}' or a number, got '{0}'")]
    InvalidTaskId(String),

    #[error("Invalid sequence number: {0}")]
    InvalidSequence(String),
}

/// Task ID in the format `TASK-{sequence}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskId(u64);

impl TaskId {
    /// Creates a task ID from a sequence number
    ///
    /// Returns `None` for zero, which is never a valid sequence.
    pub fn new(sequence: u64) -> Option<Self> {
        (sequence > 0).then_some(Self(sequence))
    }

    /// Returns the sequence number
    pub fn sequence(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", PREFIX, self.0)
    }
}

impl FromStr for TaskId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        let digits = match s.get(..PREFIX.len()) {
            Some(head) if head.eq_ignore_ascii_case(PREFIX) => &s[PREFIX.len()..],
            _ => s,
        };

        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(IdError::InvalidTaskId(s.to_string()));
        }

        let sequence: u64 = digits
            .parse()
            .map_err(|_| IdError::InvalidSequence(digits.to_string()))?;

        Self::new(sequence).ok_or_else(|| IdError::InvalidSequence(digits.to_string()))
    }
}

impl TryFrom<String> for TaskId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TaskId> for String {
    fn from(id: TaskId) -> Self {
        id.to_string()
    }
}
