pub mod config;
pub mod doctor;
pub mod migrate;
pub mod recommend;
pub mod seed;

use std::future::Future;

use serde::Serialize;
use serde_json::json;

use tia_core::config::{AppConfig, LoadOptions};

/// What a subcommand hands back to `main`: one JSON line for stdout and the
/// process exit code.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

/// A classified failure inside a command body. The class lands in the JSON
/// envelope so scripts can branch on it; the code becomes the exit status.
#[derive(Debug)]
pub struct CommandError {
    pub class: &'static str,
    pub message: String,
    pub exit_code: u8,
}

impl CommandError {
    pub fn new(class: &'static str, message: impl Into<String>, exit_code: u8) -> Self {
        Self { class, message: message.into(), exit_code }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum Envelope<'a> {
    Ok { command: &'a str, message: &'a str },
    Error { command: &'a str, error_class: &'a str, message: &'a str },
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        Self { exit_code: 0, output: render(&Envelope::Ok { command, message: &message }) }
    }

    pub fn failure(command: &str, error: CommandError) -> Self {
        let envelope = Envelope::Error {
            command,
            error_class: error.class,
            message: &error.message,
        };
        Self { exit_code: error.exit_code, output: render(&envelope) }
    }
}

fn render(envelope: &Envelope<'_>) -> String {
    serde_json::to_string(envelope).unwrap_or_else(|error| {
        json!({
            "status": "error",
            "error_class": "serialization",
            "message": error.to_string(),
        })
        .to_string()
    })
}

/// Loads and validates configuration; failures map to exit code 2.
pub(crate) fn load_config(command: &str) -> Result<AppConfig, CommandResult> {
    AppConfig::load(LoadOptions::default()).map_err(|error| {
        let error =
            CommandError::new("config_validation", format!("configuration issue: {error}"), 2);
        CommandResult::failure(command, error)
    })
}

/// Commands stay synchronous at the clap boundary; each one spins up a
/// current-thread runtime for its database work.
pub(crate) fn run_async<T>(
    command: &str,
    work: impl Future<Output = Result<T, CommandError>>,
) -> Result<T, CommandResult> {
    let runtime =
        tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
            let error = CommandError::new(
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
            CommandResult::failure(command, error)
        })?;
    runtime.block_on(work).map_err(|error| CommandResult::failure(command, error))
}
