//! Command resolution
//!
//! Turns a parsed command line into exactly one [`Operation`]. clap has
//! already checked arity; this is where IDs, statuses and titles are
//! validated, so a bad argument is rejected before any task file is opened.

use std::path::PathBuf;

use super::app::{build_command, Commands};
use super::error::CliError;
use super::info::AppInfo;
use crate::domain::{ListOrder, TaskEdit, TaskId, TaskStatus, ValidationError};

/// A resolved, validated intent
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Print the rendered usage text
    Help(String),
    Version,
    About,
    Init { path: Option<PathBuf> },
    Task(TaskOperation),
    Unknown { name: String },
}

/// Operations that run against the task store
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOperation {
    Create {
        title: String,
        description: Option<String>,
    },
    List(ListRequest),
    Show {
        id: TaskId,
    },
    SetStatus {
        id: TaskId,
        status: TaskStatus,
    },
    Edit {
        id: TaskId,
        edit: TaskEdit,
    },
    SetMeta {
        id: TaskId,
        key: String,
        value: serde_json::Value,
    },
    Remove {
        id: TaskId,
    },
}

/// What `list` was asked for; unset fields fall back to project config
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListRequest {
    pub status: Option<TaskStatus>,
    pub order: Option<ListOrder>,
    pub hide_closed: Option<bool>,
}

impl Operation {
    /// Resolves the parsed command line
    ///
    /// `--help` wins over `--version`, which wins over any command. No
    /// command at all shows help.
    pub fn resolve(
        command: Option<Commands>,
        help: bool,
        version: bool,
        info: &AppInfo,
    ) -> Result<Self, anyhow::Error> {
        if help {
            return Ok(Self::help(info));
        }
        if version {
            return Ok(Operation::Version);
        }
        let Some(command) = command else {
            return Ok(Self::help(info));
        };

        let operation = match command {
            Commands::About => Operation::About,
            Commands::Init { path } => Operation::Init { path },

            Commands::Add { title, description } => Operation::Task(TaskOperation::Create {
                title: title_arg(&title)?,
                description,
            }),

            Commands::List {
                status,
                order,
                open,
                all,
            } => Operation::Task(TaskOperation::List(ListRequest {
                status: status.as_deref().map(str::parse).transpose()?,
                order,
                hide_closed: match (open, all) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                },
            })),

            Commands::Show { id } => Operation::Task(TaskOperation::Show { id: id_arg(&id)? }),

            Commands::Status { id, status } => Operation::Task(TaskOperation::SetStatus {
                id: id_arg(&id)?,
                status: status.parse()?,
            }),
            Commands::Start { id } => set_status(&id, TaskStatus::InProgress)?,
            Commands::Pause { id } => set_status(&id, TaskStatus::Open)?,
            Commands::Done { id } => set_status(&id, TaskStatus::Done)?,
            Commands::Cancel { id } => set_status(&id, TaskStatus::Cancelled)?,

            Commands::Edit {
                id,
                title,
                description,
            } => {
                let edit = TaskEdit {
                    title: title.as_deref().map(title_arg).transpose()?,
                    description,
                };
                if edit.is_empty() {
                    return Err(CliError::EmptyEdit.into());
                }
                Operation::Task(TaskOperation::Edit {
                    id: id_arg(&id)?,
                    edit,
                })
            }

            Commands::Meta { id, key, value } => {
                let key = key.trim();
                if key.is_empty() {
                    return Err(ValidationError::EmptyMetaKey.into());
                }
                // Try to parse value as JSON, fall back to string
                let value = serde_json::from_str(&value)
                    .unwrap_or_else(|_| serde_json::Value::String(value));
                Operation::Task(TaskOperation::SetMeta {
                    id: id_arg(&id)?,
                    key: key.to_string(),
                    value,
                })
            }

            Commands::Remove { id } => Operation::Task(TaskOperation::Remove { id: id_arg(&id)? }),

            Commands::External(args) => Operation::Unknown {
                name: args.into_iter().next().unwrap_or_default(),
            },
        };

        Ok(operation)
    }

    fn help(info: &AppInfo) -> Self {
        Operation::Help(build_command(info).render_help().to_string())
    }

    /// Returns true if the operation opens or creates a project
    pub fn uses_project(&self) -> bool {
        matches!(self, Operation::Init { .. } | Operation::Task(_))
    }

    /// Short name used in verbose logs
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Help(_) => "help",
            Operation::Version => "version",
            Operation::About => "about",
            Operation::Init { .. } => "init",
            Operation::Task(op) => op.name(),
            Operation::Unknown { .. } => "unknown",
        }
    }
}

impl TaskOperation {
    /// Short name used in verbose logs
    pub fn name(&self) -> &'static str {
        match self {
            TaskOperation::Create { .. } => "create",
            TaskOperation::List(_) => "list",
            TaskOperation::Show { .. } => "show",
            TaskOperation::SetStatus { .. } => "set-status",
            TaskOperation::Edit { .. } => "edit",
            TaskOperation::SetMeta { .. } => "set-meta",
            TaskOperation::Remove { .. } => "remove",
        }
    }
}

fn id_arg(raw: &str) -> Result<TaskId, ValidationError> {
    Ok(raw.parse()?)
}

fn title_arg(raw: &str) -> Result<String, ValidationError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    Ok(title.to_string())
}

fn set_status(id: &str, status: TaskStatus) -> Result<Operation, ValidationError> {
    Ok(Operation::Task(TaskOperation::SetStatus {
        id: id_arg(id)?,
        status,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{CommandFactory, FromArgMatches};

    use crate::cli::app::Cli;

    fn info() -> AppInfo {
        AppInfo::new("taskwerk", "1.4.0", "A task management CLI")
    }

    fn resolve(args: &[&str]) -> Result<Operation, anyhow::Error> {
        let argv = std::iter::once("taskwerk").chain(args.iter().copied());
        let matches = Cli::command().try_get_matches_from(argv).unwrap();
        let cli = Cli::from_arg_matches(&matches).unwrap();
        Operation::resolve(cli.command, cli.help, cli.version, &info())
    }

    fn id(n: u64) -> TaskId {
        TaskId::new(n).unwrap()
    }

    #[test]
    fn no_command_is_help() {
        let op = resolve(&[]).unwrap();
        match op {
            Operation::Help(text) => {
                assert!(text.contains("Usage: taskwerk"));
                assert!(text.contains("A task management CLI"));
                assert!(text.contains("Commands:"));
            }
            other => panic!("expected help, got {:?}", other),
        }
    }

    #[test]
    fn help_lists_every_command() {
        let Operation::Help(text) = resolve(&["--help"]).unwrap() else {
            panic!("expected help");
        };
        for name in [
            "about", "init", "add", "list", "show", "status", "start", "pause", "done",
            "cancel", "edit", "meta", "remove",
        ] {
            assert!(text.contains(name), "help is missing '{}'", name);
        }
    }

    #[test]
    fn help_wins_over_version() {
        assert!(matches!(
            resolve(&["--version", "--help"]).unwrap(),
            Operation::Help(_)
        ));
        assert_eq!(resolve(&["--version"]).unwrap(), Operation::Version);
        assert_eq!(resolve(&["-V", "about"]).unwrap(), Operation::Version);
    }

    #[test]
    fn unknown_command() {
        assert_eq!(
            resolve(&["bogus", "--flag", "x"]).unwrap(),
            Operation::Unknown {
                name: "bogus".to_string()
            }
        );
    }

    #[test]
    fn add_trims_title() {
        assert_eq!(
            resolve(&["add", "  Write spec  "]).unwrap(),
            Operation::Task(TaskOperation::Create {
                title: "Write spec".to_string(),
                description: None,
            })
        );
    }

    #[test]
    fn add_rejects_empty_title() {
        let err = resolve(&["add", "   "]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::EmptyTitle)
        );
    }

    #[test]
    fn status_shortcuts() {
        let cases = [
            ("start", TaskStatus::InProgress),
            ("pause", TaskStatus::Open),
            ("done", TaskStatus::Done),
            ("cancel", TaskStatus::Cancelled),
        ];
        for (command, status) in cases {
            assert_eq!(
                resolve(&[command, "TASK-002"]).unwrap(),
                Operation::Task(TaskOperation::SetStatus { id: id(2), status })
            );
        }
    }

    #[test]
    fn status_command_parses_names() {
        assert_eq!(
            resolve(&["status", "3", "in_progress"]).unwrap(),
            Operation::Task(TaskOperation::SetStatus {
                id: id(3),
                status: TaskStatus::InProgress,
            })
        );

        let err = resolve(&["status", "3", "finished"]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ValidationError>(),
            Some(ValidationError::UnknownStatus(_))
        ));
    }

    #[test]
    fn bad_ids_are_validation_errors() {
        let err = resolve(&["show", "TASK-abc"]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ValidationError>(),
            Some(ValidationError::InvalidId(_))
        ));
    }

    #[test]
    fn list_flags() {
        assert_eq!(
            resolve(&["list", "--status", "done", "--order", "title", "--all"]).unwrap(),
            Operation::Task(TaskOperation::List(ListRequest {
                status: Some(TaskStatus::Done),
                order: Some(ListOrder::Title),
                hide_closed: Some(false),
            }))
        );
        assert_eq!(
            resolve(&["list"]).unwrap(),
            Operation::Task(TaskOperation::List(ListRequest::default()))
        );
    }

    #[test]
    fn edit_requires_a_change() {
        let err = resolve(&["edit", "1"]).unwrap_err();
        assert_eq!(err.downcast_ref::<CliError>(), Some(&CliError::EmptyEdit));

        let err = resolve(&["edit", "1", "--title", ""]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::EmptyTitle)
        );
    }

    #[test]
    fn meta_value_parsing() {
        assert_eq!(
            resolve(&["meta", "1", "estimate", "5"]).unwrap(),
            Operation::Task(TaskOperation::SetMeta {
                id: id(1),
                key: "estimate".to_string(),
                value: serde_json::json!(5),
            })
        );
        assert_eq!(
            resolve(&["meta", "1", "owner", "sam"]).unwrap(),
            Operation::Task(TaskOperation::SetMeta {
                id: id(1),
                key: "owner".to_string(),
                value: serde_json::json!("sam"),
            })
        );
    }

    #[test]
    fn remove_alias() {
        assert_eq!(
            resolve(&["rm", "4"]).unwrap(),
            Operation::Task(TaskOperation::Remove { id: id(4) })
        );
    }

    #[test]
    fn only_init_and_task_operations_use_a_project() {
        assert!(resolve(&["init"]).unwrap().uses_project());
        assert!(resolve(&["list"]).unwrap().uses_project());
        for args in [&["about"][..], &["--version"], &[], &["bogus"]] {
            assert!(!resolve(args).unwrap().uses_project(), "{:?}", args);
        }
    }

    #[test]
    fn operation_names() {
        assert_eq!(resolve(&["about"]).unwrap().name(), "about");
        assert_eq!(resolve(&["list"]).unwrap().name(), "list");
        assert_eq!(resolve(&["nope"]).unwrap().name(), "unknown");
    }
}
