//! Command implementations

pub mod agents;
pub mod check;
pub mod run;
pub mod shell;
pub mod tasks;
pub mod version;

use std::process::ExitCode;

use crate::application::{AgentReport, aggregate_exit_code};

/// Process exit status for a batch: the first non-zero agent exit code,
/// clamped into `1..=255`.
#[must_use]
pub fn batch_exit_code(reports: &[AgentReport]) -> ExitCode {
    match aggregate_exit_code(reports) {
        None | Some(0) => ExitCode::SUCCESS,
        Some(code) => ExitCode::from(u8::try_from(code).ok().filter(|c| *c != 0).unwrap_or(1)),
    }
}
