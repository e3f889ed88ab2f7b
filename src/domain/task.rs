//! Task domain model
//!
//! A task is one unit of trackable work. Its status moves through a small
//! state machine:
//!
//! ```text
//!            start              done
//!   open ───────────▶ in_progress ───────▶ done
//!    │   ◀───────────     │
//!    │       pause        │ cancel
//!    │ cancel             ▼
//!    └──────────────▶ cancelled
//! ```
//!
//! `done` and `cancelled` are terminal. A transition to the current state is
//! rejected so that caller mistakes surface instead of passing silently.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::error::{TaskError, ValidationError};
use super::id::TaskId;

/// Status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Open,
    InProgress,
    Done,
    Cancelled,
}

impl TaskStatus {
    /// All statuses, in lifecycle order
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Open,
        TaskStatus::InProgress,
        TaskStatus::Done,
        TaskStatus::Cancelled,
    ];

    /// Returns the canonical lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Open => "open",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    /// Returns true if no further transition is allowed
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Cancelled)
    }

    /// Returns true if moving from this status to `next` is allowed
    pub fn can_transition_to(&self, next: &Self) -> bool {
        match self {
            TaskStatus::Open => matches!(next, TaskStatus::InProgress | TaskStatus::Cancelled),
            TaskStatus::InProgress => matches!(
                next,
                TaskStatus::Done | TaskStatus::Cancelled | TaskStatus::Open
            ),
            TaskStatus::Done | TaskStatus::Cancelled => false,
        }
    }

    /// Validates a transition for the given task
    pub fn validate_transition(&self, id: TaskId, next: &Self) -> Result<(), TaskError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(TaskError::InvalidTransition {
                id,
                from: *self,
                to: *next,
            })
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(TaskStatus::Open),
            "in_progress" | "in-progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            "cancelled" | "canceled" => Ok(TaskStatus::Cancelled),
            _ => Err(ValidationError::UnknownStatus(s.to_string())),
        }
    }
}

/// Metadata for a task - extensible key-value pairs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskMeta(BTreeMap<String, serde_json::Value>);

impl TaskMeta {
    /// Creates empty metadata
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Gets a value by key
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    /// Sets a value, returning the previous one
    pub fn set(
        &mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Option<serde_json::Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Returns true if empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over all key-value pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &serde_json::Value)> {
        self.0.iter()
    }
}

/// A single task record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: TaskId,

    /// Human-readable title
    pub title: String,

    /// Current status
    pub status: TaskStatus,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,

    /// When the task was completed (if done)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Extensible metadata
    #[serde(default, skip_serializing_if = "TaskMeta::is_empty")]
    pub meta: TaskMeta,
}

impl Task {
    /// Creates a new open task
    ///
    /// The title is trimmed; an empty title is rejected.
    pub fn new(
        id: TaskId,
        title: impl AsRef<str>,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            id,
            title: normalize_title(title.as_ref())?,
            status: TaskStatus::Open,
            created_at: now,
            updated_at: now,
            completed_at: None,
            description: None,
            meta: TaskMeta::new(),
        })
    }

    /// Checks the record's invariants
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }

        let completed_early = self
            .completed_at
            .is_some_and(|completed| completed < self.created_at);

        if self.updated_at < self.created_at || completed_early {
            return Err(ValidationError::TimestampOrder { id: self.id });
        }

        Ok(())
    }

    /// Moves the task to `next`, leaving it untouched if the move is not allowed
    pub fn transition_to(&mut self, next: TaskStatus, now: DateTime<Utc>) -> Result<(), TaskError> {
        self.status.validate_transition(self.id, &next)?;

        self.status = next;
        self.touch(now);
        if next == TaskStatus::Done {
            self.completed_at = Some(self.updated_at);
        }

        Ok(())
    }

    /// Sets the title
    pub fn set_title(&mut self, title: &str, now: DateTime<Utc>) -> Result<(), ValidationError> {
        self.title = normalize_title(title)?;
        self.touch(now);
        Ok(())
    }

    /// Sets or clears the description
    ///
    /// A blank description clears it.
    pub fn set_description(&mut self, description: &str, now: DateTime<Utc>) {
        let trimmed = description.trim();
        self.description = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self.touch(now);
    }

    /// Sets a metadata value
    pub fn set_meta(
        &mut self,
        key: &str,
        value: serde_json::Value,
        now: DateTime<Utc>,
    ) -> Result<(), ValidationError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(ValidationError::EmptyMetaKey);
        }
        self.meta.set(key, value);
        self.touch(now);
        Ok(())
    }

    // Clamped so a clock stepping backwards cannot break updated_at >= created_at.
    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.created_at);
    }
}

fn normalize_title(title: &str) -> Result<String, ValidationError> {
    let title = title.trim();
    if title.is_empty() {
        Err(ValidationError::EmptyTitle)
    } else {
        Ok(title.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn make_task(seq: u64) -> Task {
        Task::new(TaskId::new(seq).unwrap(), format!("Task {}", seq), Utc::now()).unwrap()
    }

    #[test]
    fn new_task_is_open() {
        let task = make_task(1);
        assert_eq!(task.status, TaskStatus::Open);
        assert_eq!(task.created_at, task.updated_at);
        assert!(task.completed_at.is_none());
    }

    #[test]
    fn new_task_trims_title() {
        let task = Task::new(TaskId::new(1).unwrap(), "  Write spec \n", Utc::now()).unwrap();
        assert_eq!(task.title, "Write spec");
    }

    #[test]
    fn empty_title_is_rejected() {
        let id = TaskId::new(1).unwrap();
        assert_eq!(Task::new(id, "", Utc::now()), Err(ValidationError::EmptyTitle));
        assert_eq!(Task::new(id, "   ", Utc::now()), Err(ValidationError::EmptyTitle));
    }

    #[test]
    fn transition_table() {
        use TaskStatus::*;

        let allowed = [
            (Open, InProgress),
            (Open, Cancelled),
            (InProgress, Done),
            (InProgress, Cancelled),
            (InProgress, Open),
        ];

        for from in TaskStatus::ALL {
            for to in TaskStatus::ALL {
                assert_eq!(
                    from.can_transition_to(&to),
                    allowed.contains(&(from, to)),
                    "{} -> {}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn self_transitions_are_rejected() {
        for status in TaskStatus::ALL {
            assert!(!status.can_transition_to(&status));
        }
    }

    #[test]
    fn terminal_states() {
        assert!(TaskStatus::Done.is_terminal());
        assert!(TaskStatus::Cancelled.is_terminal());
        assert!(!TaskStatus::Open.is_terminal());
        assert!(!TaskStatus::InProgress.is_terminal());
    }

    #[test]
    fn full_lifecycle() {
        let mut task = make_task(1);
        let now = Utc::now();

        task.transition_to(TaskStatus::InProgress, now).unwrap();
        assert_eq!(task.status, TaskStatus::InProgress);

        task.transition_to(TaskStatus::Done, now).unwrap();
        assert_eq!(task.status, TaskStatus::Done);
        assert_eq!(task.completed_at, Some(task.updated_at));

        let err = task.transition_to(TaskStatus::Open, now).unwrap_err();
        assert!(matches!(err, TaskError::InvalidTransition { .. }));
    }

    #[test]
    fn rejected_transition_leaves_task_unchanged() {
        let mut task = make_task(1);
        let before = task.clone();

        let later = task.created_at + Duration::seconds(5);
        assert!(task.transition_to(TaskStatus::Done, later).is_err());

        assert_eq!(task, before);
    }

    #[test]
    fn pause_returns_to_open() {
        let mut task = make_task(1);
        let now = Utc::now();

        task.transition_to(TaskStatus::InProgress, now).unwrap();
        task.transition_to(TaskStatus::Open, now).unwrap();

        assert_eq!(task.status, TaskStatus::Open);
    }

    #[test]
    fn updated_at_never_precedes_created_at() {
        let mut task = make_task(1);
        let earlier = task.created_at - Duration::hours(1);

        task.transition_to(TaskStatus::InProgress, earlier).unwrap();

        assert_eq!(task.updated_at, task.created_at);
        assert!(task.validate().is_ok());
    }

    #[test]
    fn validate_catches_bad_records() {
        let mut task = make_task(1);
        task.title = " ".to_string();
        assert_eq!(task.validate(), Err(ValidationError::EmptyTitle));

        let mut task = make_task(2);
        task.updated_at = task.created_at - Duration::seconds(1);
        assert!(matches!(
            task.validate(),
            Err(ValidationError::TimestampOrder { .. })
        ));
    }

    #[test]
    fn status_parsing() {
        assert_eq!("open".parse::<TaskStatus>().unwrap(), TaskStatus::Open);
        assert_eq!("In-Progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert_eq!("canceled".parse::<TaskStatus>().unwrap(), TaskStatus::Cancelled);
        assert_eq!(
            "finished".parse::<TaskStatus>(),
            Err(ValidationError::UnknownStatus("finished".to_string()))
        );
    }

    #[test]
    fn status_display_matches_serde() {
        for status in TaskStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status));
        }
    }

    #[test]
    fn description_and_meta() {
        let mut task = make_task(1);
        let now = Utc::now();

        task.set_description("Some details", now);
        assert_eq!(task.description.as_deref(), Some("Some details"));

        task.set_description("  ", now);
        assert!(task.description.is_none());

        task.set_meta("priority", serde_json::json!("high"), now).unwrap();
        assert_eq!(task.meta.get("priority"), Some(&serde_json::json!("high")));

        assert_eq!(
            task.set_meta(" ", serde_json::json!(1), now),
            Err(ValidationError::EmptyMetaKey)
        );
    }

    #[test]
    fn serde_skips_empty_optionals() {
        let task = make_task(1);
        let json = serde_json::to_string(&task).unwrap();

        assert!(!json.contains("completed_at"));
        assert!(!json.contains("description"));
        assert!(!json.contains("meta"));

        let parsed: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, task);
    }

    #[test]
    fn unknown_status_fails_to_deserialize() {
        let line = r#"{"id":"TASK-001","title":"x","status":"paused","created_at":"2025-01-01T00:00:00Z","updated_at":"2025-01-01T00:00:00Z"}"#;
        assert!(serde_json::from_str::<Task>(line).is_err());
    }
}
