//! Output formatting for CLI commands
//!
//! Results go to stdout, diagnostics to stderr. In JSON mode every stdout
//! write is a single line of JSON so scripts can parse it directly.

use serde::{Deserialize, Serialize};

/// Output format
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Writes results and diagnostics in the selected format
pub struct Output {
    format: OutputFormat,
    verbose: bool,
}

impl Output {
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        Self { format, verbose }
    }

    /// Prints a one-line confirmation
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Text => println!("{}", message),
            OutputFormat::Json => self.data(&serde_json::json!({
                "success": true,
                "message": message,
            })),
        }
    }

    /// Prints a rendered result: `text` verbatim, or `json` as one line
    pub fn emit(&self, text: &str, json: &serde_json::Value) {
        match self.format {
            OutputFormat::Text => print!("{}", text),
            OutputFormat::Json => self.data(json),
        }
    }

    /// Reports a failed command on stderr, including its cause chain
    pub fn failure(&self, err: &anyhow::Error) {
        let message = format!("{:#}", err);
        match self.format {
            OutputFormat::Text => eprintln!("error: {}", message),
            OutputFormat::Json => eprintln!(
                "{}",
                serde_json::json!({
                    "success": false,
                    "error": message,
                })
            ),
        }
    }

    /// Prints structured data as compact JSON
    pub fn data<T: Serialize>(&self, data: &T) {
        // Serializing our own types cannot fail
        if let Ok(json) = serde_json::to_string(data) {
            println!("{}", json);
        }
    }

    /// Returns true if using JSON format
    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Prints a verbose debug message (only when --verbose is set)
    pub fn verbose(&self, message: &str) {
        self.log(None, message);
    }

    /// Prints a verbose debug message tagged with the subsystem it came from
    pub fn verbose_ctx(&self, context: &str, message: &str) {
        self.log(Some(context), message);
    }

    fn log(&self, context: Option<&str>, message: &str) {
        if !self.verbose {
            return;
        }
        match context {
            Some(context) => eprintln!("[verbose:{}] {}", context, message),
            None => eprintln!("[verbose] {}", message),
        }
    }
}
