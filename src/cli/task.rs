//! Task commands
//!
//! Each command runs against the session's store and returns a [`Report`].
//! Nothing is printed here: the dispatcher emits the report only after the
//! session has been committed, so a failed save never looks like success.

use anyhow::Result;
use serde_json::json;

use super::operation::{ListRequest, TaskOperation};
use super::output::Output;
use crate::domain::{ListFilter, Task, TaskEdit, TaskId, TaskStatus};
use crate::storage::{ProjectConfig, Session};

/// Rendered result of a task command, in both output formats
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    text: String,
    json: serde_json::Value,
}

impl Report {
    fn new(text: impl Into<String>, json: serde_json::Value) -> Self {
        Self {
            text: text.into(),
            json,
        }
    }

    /// Prints the report in the output's format
    pub fn emit(&self, output: &Output) {
        output.emit(&self.text, &self.json);
    }
}

pub fn run(
    op: TaskOperation,
    session: &mut Session,
    config: &ProjectConfig,
    output: &Output,
) -> Result<Report> {
    output.verbose_ctx("task", &format!("Running {}", op.name()));

    match op {
        TaskOperation::Create { title, description } => {
            add_task(session, &title, description)
        }
        TaskOperation::List(request) => Ok(list_tasks(session, &request, config)),
        TaskOperation::Show { id } => show_task(session, id),
        TaskOperation::SetStatus { id, status } => set_status(session, id, status),
        TaskOperation::Edit { id, edit } => edit_task(session, id, &edit),
        TaskOperation::SetMeta { id, key, value } => set_meta(session, id, &key, value),
        TaskOperation::Remove { id } => remove_task(session, id),
    }
}

fn add_task(session: &mut Session, title: &str, description: Option<String>) -> Result<Report> {
    let store = session.store_mut();
    let id = store.insert_with(title, description.as_deref())?;
    let task = store.get(id)?;
    Ok(Report::new(
        format!("Created task: {} - {}\n", task.id, task.title),
        json!({
            "id": task.id,
            "title": task.title,
            "status": task.status,
        }),
    ))
}

fn list_tasks(session: &Session, request: &ListRequest, config: &ProjectConfig) -> Report {
    // An explicit status filter shows that status even if closed tasks are hidden
    let hide_closed = request
        .hide_closed
        .unwrap_or(request.status.is_none() && config.hide_closed);

    let filter = ListFilter {
        status: request.status,
        hide_closed,
        order: request.order.unwrap_or(config.default_order),
    };

    let snapshot = session.store().list(&filter);
    let json = json!(snapshot.tasks());

    let text = if snapshot.is_empty() {
        match request.status {
            Some(status) => format!("No tasks with status {}\n", status),
            None => "No tasks\n".to_string(),
        }
    } else {
        let mut text = format!("{:<12} {:<12} TITLE\n", "ID", "STATUS");
        text.push_str(&"-".repeat(60));
        text.push('\n');
        for task in snapshot {
            text.push_str(&format!(
                "{:<12} {:<12} {}\n",
                task.id.to_string(),
                task.status.as_str(),
                task.title
            ));
        }
        text
    };

    Report::new(text, json)
}

fn show_task(session: &Session, id: TaskId) -> Result<Report> {
    let task = session.store().get(id)?;
    Ok(Report::new(render_details(task), json!(task)))
}

fn render_details(task: &Task) -> String {
    let mut lines = vec![
        format!("Task: {}", task.id),
        format!("Title: {}", task.title),
        format!("Status: {}", task.status),
        format!("Created: {}", task.created_at.format("%Y-%m-%d %H:%M")),
        format!("Updated: {}", task.updated_at.format("%Y-%m-%d %H:%M")),
    ];

    if let Some(completed) = task.completed_at {
        lines.push(format!("Completed: {}", completed.format("%Y-%m-%d %H:%M")));
    }

    if let Some(desc) = &task.description {
        lines.push(String::new());
        lines.push("Description:".to_string());
        lines.push(desc.clone());
    }

    if !task.meta.is_empty() {
        lines.push(String::new());
        lines.push("Metadata:".to_string());
        for (key, value) in task.meta.iter() {
            lines.push(format!("  {}: {}", key, value));
        }
    }

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

fn set_status(session: &mut Session, id: TaskId, status: TaskStatus) -> Result<Report> {
    let store = session.store_mut();
    let previous = store.set_status(id, status)?;
    let task = store.get(id)?;

    Ok(Report::new(
        format!("{}: {} -> {}\n", task.id, previous, task.status),
        json!({
            "id": task.id,
            "from": previous,
            "to": task.status,
            "updated_at": task.updated_at,
            "completed_at": task.completed_at,
        }),
    ))
}

fn edit_task(session: &mut Session, id: TaskId, edit: &TaskEdit) -> Result<Report> {
    let store = session.store_mut();
    store.edit(id, edit)?;
    let task = store.get(id)?;

    Ok(Report::new(
        format!("Updated task: {} - {}\n", task.id, task.title),
        json!({
            "id": task.id,
            "title": task.title,
            "description": task.description,
        }),
    ))
}

fn set_meta(
    session: &mut Session,
    id: TaskId,
    key: &str,
    value: serde_json::Value,
) -> Result<Report> {
    let store = session.store_mut();
    store.set_meta(id, key, value.clone())?;

    Ok(Report::new(
        format!("Set {} = {} on {}\n", key, value, id),
        json!({
            "id": id,
            "key": key,
            "value": value,
        }),
    ))
}

fn remove_task(session: &mut Session, id: TaskId) -> Result<Report> {
    let task = session.store_mut().remove(id)?;

    Ok(Report::new(
        format!("Removed task: {} - {}\n", task.id, task.title),
        json!({
            "id": task.id,
            "removed": true,
        }),
    ))
}
