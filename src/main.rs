//! taskwerk - A task management CLI

use std::process::ExitCode;

use taskwerk::AppInfo;

fn main() -> ExitCode {
    let info = AppInfo::from_build();
    taskwerk::cli::run(std::env::args_os(), &info)
}
