//! cnctl - run shell commands and tasks against local and remote agents

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cnctl::cli::Cli;
use cnctl::domain::{AgentError, RegistryError, TaskError};
use cnctl::output::json;

#[tokio::main]
async fn main() -> ExitCode {
    // stdout carries the tag stream; diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json_mode = cli.json;
    match cli.run().await {
        Ok(code) => code,
        Err(e) => {
            if json_mode {
                match json::format_error(&format!("{e:#}"), error_code(&e)) {
                    Ok(doc) => println!("{doc}"),
                    Err(_) => eprintln!("Error: {e:#}"),
                }
            } else {
                eprintln!("Error: {e:#}");
            }
            ExitCode::FAILURE
        }
    }
}

/// Stable machine-readable code for the JSON error object.
fn error_code(e: &anyhow::Error) -> &'static str {
    for cause in e.chain() {
        if let Some(err) = cause.downcast_ref::<AgentError>() {
            return match err {
                AgentError::Timeout { .. } => "TIMEOUT",
                AgentError::Connection { .. }
                | AgentError::Transmit { .. }
                | AgentError::Receive { .. } => "CONNECTION",
                AgentError::UnimplementedCapability(_) => "UNIMPLEMENTED",
                _ => "AGENT",
            };
        }
        if let Some(err) = cause.downcast_ref::<TaskError>() {
            return match err {
                TaskError::UnknownTask(_) | TaskError::UnknownAgent(_) => "NOT_FOUND",
                TaskError::DependencyCycle(_) => "DEPENDENCY_CYCLE",
                TaskError::Failed { .. } => "TASK_FAILED",
                _ => "TASK",
            };
        }
        if let Some(err) = cause.downcast_ref::<RegistryError>() {
            return match err {
                RegistryError::NotFound { .. } => "NOT_FOUND",
                RegistryError::DuplicateEntry { .. } => "DUPLICATE",
            };
        }
    }
    "ERROR"
}
