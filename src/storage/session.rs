//! Load/commit scope around one invocation
//!
//! A session loads the task file once, hands out the in-memory store, and
//! writes it back on [`Session::commit`] only if the store's revision moved.
//! Dropping a session without committing discards every change, which is
//! what makes a failed operation leave the file untouched.

use anyhow::{Context, Result};

use super::{Project, TaskFile};
use crate::domain::TaskStore;

/// Outcome of [`Session::commit`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The store changed and was written
    Saved { revision: u64 },
    /// Nothing changed; the file was not touched
    Unchanged,
}

/// One invocation's view of the task file
pub struct Session {
    file: TaskFile,
    store: TaskStore,
    loaded_revision: u64,
}

impl Session {
    /// Loads the project's tasks
    pub fn open(project: &Project) -> Result<Self> {
        Self::load(project.task_file())
    }

    /// Loads tasks from an explicit file
    pub fn load(file: TaskFile) -> Result<Self> {
        let store = file
            .load()
            .with_context(|| format!("Failed to load tasks from {}", file.path().display()))?;
        let loaded_revision = store.revision();

        Ok(Self {
            file,
            store,
            loaded_revision,
        })
    }

    /// Borrows the store
    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    /// Mutably borrows the store
    pub fn store_mut(&mut self) -> &mut TaskStore {
        &mut self.store
    }

    /// Returns true if the store changed since it was loaded
    pub fn is_dirty(&self) -> bool {
        self.store.revision() != self.loaded_revision
    }

    /// Writes the store back if it changed
    pub fn commit(self) -> Result<CommitOutcome> {
        if !self.is_dirty() {
            return Ok(CommitOutcome::Unchanged);
        }

        self.file
            .save(&self.store)
            .with_context(|| format!("Failed to save tasks to {}", self.file.path().display()))?;

        Ok(CommitOutcome::Saved {
            revision: self.store.revision(),
        })
    }
}
