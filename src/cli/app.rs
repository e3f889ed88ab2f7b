//! Main CLI application structure
//!
//! [`run`] is the dispatcher: parse with clap, resolve into an
//! [`Operation`], execute it, and map the result to an exit code.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::builder::FalseyValueParser;
use clap::error::ErrorKind;
use clap::{Arg, ArgAction, CommandFactory, FromArgMatches, Parser, Subcommand};

use super::error::{exit_code_for, CliError, EXIT_SUCCESS, EXIT_USAGE};
use super::info::AppInfo;
use super::operation::Operation;
use super::output::{Output, OutputFormat};
use super::task;
use crate::domain::ListOrder;
use crate::storage::{CommitOutcome, GlobalConfig, Project, Session};

#[derive(Parser)]
#[command(name = "taskwerk")]
#[command(disable_help_flag = true, disable_version_flag = true)]
#[command(allow_external_subcommands = true)]
pub struct Cli {
    /// Print help
    #[arg(long, short = 'h', action = ArgAction::SetTrue)]
    pub help: bool,

    /// Print version
    #[arg(long, short = 'V', action = ArgAction::SetTrue)]
    pub version: bool,

    /// Output format
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output for debugging
    #[arg(
        long,
        short = 'v',
        global = true,
        env = "TASKWERK_VERBOSE",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new()
    )]
    pub verbose: bool,

    /// Project root (defaults to the nearest directory containing .taskwerk)
    #[arg(long, global = true, env = "TASKWERK_DIR", value_name = "PATH")]
    pub dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show program name and version
    About,

    /// Initialize a new taskwerk project
    Init {
        /// Path to initialize (defaults to --dir, then the current directory)
        path: Option<PathBuf>,
    },

    /// Add a task
    Add {
        /// Task title
        title: String,

        /// Longer description
        #[arg(long, short)]
        description: Option<String>,
    },

    /// List tasks
    List {
        /// Only show tasks with this status (open, in_progress, done, cancelled)
        #[arg(long, short)]
        status: Option<String>,

        /// Sort order (defaults to the project's default_order)
        #[arg(long)]
        order: Option<ListOrder>,

        /// Hide done and cancelled tasks
        #[arg(long, conflicts_with = "all")]
        open: bool,

        /// Show done and cancelled tasks even if the project hides them
        #[arg(long)]
        all: bool,
    },

    /// Show task details
    Show {
        /// Task ID
        id: String,
    },

    /// Change a task's status
    Status {
        /// Task ID
        id: String,

        /// New status (open, in_progress, done, cancelled)
        status: String,
    },

    /// Mark task as in progress
    Start {
        /// Task ID
        id: String,
    },

    /// Move an in-progress task back to open
    Pause {
        /// Task ID
        id: String,
    },

    /// Mark task as done
    Done {
        /// Task ID
        id: String,
    },

    /// Cancel a task
    Cancel {
        /// Task ID
        id: String,
    },

    /// Change a task's title or description
    Edit {
        /// Task ID
        id: String,

        /// New title
        #[arg(long, short)]
        title: Option<String>,

        /// New description (empty clears it)
        #[arg(long, short)]
        description: Option<String>,
    },

    /// Set task metadata
    Meta {
        /// Task ID
        id: String,

        /// Metadata key
        key: String,

        /// Metadata value (JSON, or plain text)
        value: String,
    },

    /// Remove a task
    #[command(visible_alias = "rm")]
    Remove {
        /// Task ID
        id: String,
    },

    #[command(external_subcommand)]
    External(Vec<String>),
}

/// Builds the clap command carrying this program's identity
///
/// The root's `--help` is an ordinary flag so it can be resolved like any
/// other operation. Subcommands get clap's generated help back.
pub fn build_command(info: &AppInfo) -> clap::Command {
    let mut command = Cli::command()
        .name(info.name.clone())
        .bin_name(info.name.clone())
        .version(info.version.clone())
        .about(info.description.clone());

    let names: Vec<String> = command
        .get_subcommands()
        .map(|sub| sub.get_name().to_string())
        .collect();
    for name in names {
        command = command.mut_subcommand(name, |sub| {
            sub.arg(
                Arg::new("help")
                    .short('h')
                    .long("help")
                    .action(ArgAction::Help)
                    .help("Print help"),
            )
        });
    }

    command
}

/// Main entry point for the CLI
///
/// Never panics on bad input; every failure becomes a message on stderr and
/// a non-zero exit code.
pub fn run<I, T>(args: I, info: &AppInfo) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = match build_command(info).try_get_matches_from(args) {
        Ok(matches) => matches,
        Err(e) => return clap_exit(e),
    };
    let cli = match Cli::from_arg_matches(&matches) {
        Ok(cli) => cli,
        Err(e) => return clap_exit(e),
    };

    let global = GlobalConfig::load();
    let format = cli
        .format
        .or_else(|| global.as_ref().ok().map(|g| g.default_format))
        .unwrap_or_default();
    let output = Output::new(format, cli.verbose);

    output.verbose(&format!("{} {} starting", info.name, info.version));

    let invocation = Invocation {
        info,
        output: &output,
        dir: cli.dir,
    };

    let result = Operation::resolve(cli.command, cli.help, cli.version, info).and_then(|operation| {
        output.verbose_ctx("dispatch", &format!("Resolved operation: {}", operation.name()));
        // A broken global config only blocks operations that touch a project
        if let Err(e) = global {
            if operation.uses_project() {
                return Err(e);
            }
            output.verbose_ctx("config", &format!("Ignoring global config: {:#}", e));
        }
        execute(operation, &invocation)
    });

    match result {
        Ok(()) => {
            output.verbose("Command completed successfully");
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            report_failure(&output, &e);
            exit_code_for(&e)
        }
    }
}

fn report_failure(output: &Output, err: &anyhow::Error) {
    // Same plain line in every output format
    if let Some(unknown @ CliError::UnknownCommand(_)) = err.downcast_ref::<CliError>() {
        eprintln!("error: {}", unknown);
        return;
    }
    output.failure(err);
}

fn clap_exit(e: clap::Error) -> ExitCode {
    let code = match e.kind() {
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => EXIT_SUCCESS,
        _ => EXIT_USAGE,
    };
    // Printing can only fail if stdout/stderr are gone
    let _ = e.print();
    ExitCode::from(code)
}

struct Invocation<'a> {
    info: &'a AppInfo,
    output: &'a Output,
    dir: Option<PathBuf>,
}

fn execute(operation: Operation, ctx: &Invocation<'_>) -> Result<()> {
    let output = ctx.output;

    match operation {
        Operation::Help(text) => {
            print!("{}", text);
        }

        Operation::Version => {
            if output.is_json() {
                output.data(&serde_json::json!({ "version": ctx.info.version }));
            } else {
                println!("{}", ctx.info.version);
            }
        }

        Operation::About => about(ctx.info, output),

        Operation::Init { path } => {
            let path = path
                .or_else(|| ctx.dir.clone())
                .unwrap_or_else(|| PathBuf::from("."));
            output.verbose_ctx("init", &format!("Initializing project at: {}", path.display()));
            let project = Project::init(&path)?;
            output.verbose_ctx(
                "init",
                &format!("Created data directory at: {}", project.data_dir().display()),
            );
            output.success(&format!(
                "Initialized taskwerk project at {}",
                project.root().display()
            ));
        }

        Operation::Task(op) => {
            let project = open_project(ctx.dir.as_deref())?;
            output.verbose_ctx("project", &format!("Using project at: {}", project.root().display()));

            let mut session = Session::open(&project)?;
            output.verbose_ctx(
                "store",
                &format!(
                    "Loaded {} task(s) at revision {}",
                    session.store().len(),
                    session.store().revision()
                ),
            );

            let report = task::run(op, &mut session, project.config(), output)?;

            match session.commit()? {
                CommitOutcome::Saved { revision } => {
                    output.verbose_ctx("store", &format!("Saved revision {}", revision))
                }
                CommitOutcome::Unchanged => output.verbose_ctx("store", "No changes to save"),
            }

            report.emit(output);
        }

        Operation::Unknown { name } => return Err(CliError::UnknownCommand(name).into()),
    }

    Ok(())
}

fn about(info: &AppInfo, output: &Output) {
    if output.is_json() {
        output.data(info);
    } else {
        println!("{} {}", info.name, info.version);
        println!("{}", info.description);
    }
}

fn open_project(dir: Option<&Path>) -> Result<Project> {
    match dir {
        Some(dir) => Project::open(dir),
        None => {
            let cwd = std::env::current_dir().context("Failed to read current directory")?;
            Project::discover(&cwd)
        }
    }
}
