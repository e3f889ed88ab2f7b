//! In-memory task store
//!
//! The store owns every task for the lifetime of one invocation. Tasks are
//! keyed by ID; because IDs are allocated from a monotonic high-water mark,
//! key order is insertion order.
//!
//! Each successful mutation bumps `revision`. A [`TaskSnapshot`] remembers
//! the revision it was taken at, so callers holding one can tell when it has
//! gone stale.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::error::TaskError;
use super::id::TaskId;
use super::task::{Task, TaskStatus};

/// Ordering for [`TaskStore::list`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ListOrder {
    /// Insertion order (oldest first)
    #[default]
    Inserted,
    /// Alphabetical by title, ties broken by insertion order
    Title,
    /// Most recently updated first
    Updated,
}

/// Filter for [`TaskStore::list`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListFilter {
    /// Only tasks with this status
    pub status: Option<TaskStatus>,
    /// Skip tasks in a terminal status
    pub hide_closed: bool,
    /// Result ordering
    pub order: ListOrder,
}

impl ListFilter {
    /// Filter that keeps only the given status
    pub fn with_status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    fn matches(&self, task: &Task) -> bool {
        if self.hide_closed && task.status.is_terminal() {
            return false;
        }
        self.status.map_or(true, |status| task.status == status)
    }
}

/// Changes applied by [`TaskStore::edit`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskEdit {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl TaskEdit {
    /// Returns true if the edit changes nothing
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none()
    }
}

/// Point-in-time copy of a filtered task list
///
/// Later mutations of the store are not reflected here.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSnapshot {
    revision: u64,
    tasks: Vec<Task>,
}

impl TaskSnapshot {
    /// Returns the number of tasks
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns true if empty
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Borrows the tasks
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }
}

impl IntoIterator for TaskSnapshot {
    type Item = Task;
    type IntoIter = std::vec::IntoIter<Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.into_iter()
    }
}

/// Authoritative collection of tasks
#[derive(Debug, Clone, PartialEq)]
pub struct TaskStore {
    tasks: BTreeMap<TaskId, Task>,
    next_id: u64,
    revision: u64,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self {
            tasks: BTreeMap::new(),
            next_id: 1,
            revision: 0,
        }
    }

    /// Rebuilds a store from persisted parts
    ///
    /// Every record is validated. Duplicate IDs are rejected; a high-water
    /// mark that lags behind the stored IDs is raised so IDs are never reused.
    pub fn from_parts(
        next_id: u64,
        revision: u64,
        tasks: impl IntoIterator<Item = Task>,
    ) -> Result<Self, TaskError> {
        let mut map = BTreeMap::new();
        let mut next_id = next_id.max(1);

        for task in tasks {
            task.validate()?;
            next_id = next_id.max(task.id.sequence().saturating_add(1));
            if map.insert(task.id, task.clone()).is_some() {
                return Err(TaskError::DuplicateId(task.id));
            }
        }

        Ok(Self {
            tasks: map,
            next_id,
            revision,
        })
    }

    /// Sequence number the next inserted task will get
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Current revision
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns the number of tasks
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns true if the store holds no tasks
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Iterates over tasks in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    /// Creates a new open task and returns its ID
    pub fn insert(&mut self, title: &str) -> Result<TaskId, TaskError> {
        self.insert_with(title, None)
    }

    /// Creates a new open task with an optional description
    ///
    /// Creation is a single mutation: one revision bump, and `updated_at`
    /// equals `created_at`.
    pub fn insert_with(
        &mut self,
        title: &str,
        description: Option<&str>,
    ) -> Result<TaskId, TaskError> {
        let id = TaskId::new(self.next_id).ok_or(TaskError::IdsExhausted)?;
        let next_id = self.next_id.checked_add(1).ok_or(TaskError::IdsExhausted)?;
        if self.tasks.contains_key(&id) {
            return Err(TaskError::DuplicateId(id));
        }

        let now = Utc::now();
        let mut task = Task::new(id, title, now)?;
        if let Some(description) = description {
            task.set_description(description, now);
        }
        self.tasks.insert(id, task);
        self.next_id = next_id;
        self.bump();

        Ok(id)
    }

    /// Looks up a task
    pub fn get(&self, id: TaskId) -> Result<&Task, TaskError> {
        self.tasks.get(&id).ok_or(TaskError::NotFound(id))
    }

    /// Returns a snapshot of the tasks matching `filter`
    pub fn list(&self, filter: &ListFilter) -> TaskSnapshot {
        let mut tasks: Vec<Task> = self
            .tasks
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();

        match filter.order {
            ListOrder::Inserted => {}
            ListOrder::Title => tasks.sort_by(|a, b| {
                a.title
                    .to_lowercase()
                    .cmp(&b.title.to_lowercase())
                    .then(a.id.cmp(&b.id))
            }),
            ListOrder::Updated => {
                tasks.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)))
            }
        }

        TaskSnapshot {
            revision: self.revision,
            tasks,
        }
    }

    /// Returns true if the store has changed since `snapshot` was taken
    pub fn is_stale(&self, snapshot: &TaskSnapshot) -> bool {
        snapshot.revision != self.revision
    }

    /// Moves a task to a new status
    ///
    /// Returns the previous status.
    pub fn set_status(&mut self, id: TaskId, status: TaskStatus) -> Result<TaskStatus, TaskError> {
        let task = self.tasks.get_mut(&id).ok_or(TaskError::NotFound(id))?;
        let previous = task.status;

        task.transition_to(status, Utc::now())?;
        self.bump();

        Ok(previous)
    }

    /// Changes a task's title and/or description
    ///
    /// Nothing is applied if the new title is invalid.
    pub fn edit(&mut self, id: TaskId, edit: &TaskEdit) -> Result<(), TaskError> {
        let task = self.tasks.get_mut(&id).ok_or(TaskError::NotFound(id))?;
        if edit.is_empty() {
            return Ok(());
        }

        let now = Utc::now();
        let mut updated = task.clone();
        if let Some(title) = &edit.title {
            updated.set_title(title, now)?;
        }
        if let Some(description) = &edit.description {
            updated.set_description(description, now);
        }

        *task = updated;
        self.bump();
        Ok(())
    }

    /// Sets a metadata value on a task
    pub fn set_meta(
        &mut self,
        id: TaskId,
        key: &str,
        value: serde_json::Value,
    ) -> Result<(), TaskError> {
        let task = self.tasks.get_mut(&id).ok_or(TaskError::NotFound(id))?;

        task.set_meta(key, value, Utc::now())?;
        self.bump();

        Ok(())
    }

    /// Removes a task and returns it
    pub fn remove(&mut self, id: TaskId) -> Result<Task, TaskError> {
        let task = self.tasks.remove(&id).ok_or(TaskError::NotFound(id))?;
        self.bump();
        Ok(task)
    }

    fn bump(&mut self) {
        self.revision += 1;
    }
}
