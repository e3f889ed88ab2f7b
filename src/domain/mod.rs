//! Domain models for taskwerk
//!
//! Contains the task-state engine without any I/O concerns.

mod error;
mod id;
mod store;
mod task;

pub use error::{TaskError, ValidationError};
pub use id::{IdError, TaskId};
pub use store::{ListFilter, ListOrder, TaskEdit, TaskSnapshot, TaskStore};
pub use task::{Task, TaskMeta, TaskStatus};
