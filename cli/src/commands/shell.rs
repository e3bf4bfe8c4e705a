//! Shell command: one ad-hoc command on an agent or group.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use crate::app::AppContext;
use crate::application::Operation;
use crate::commands::batch_exit_code;
use crate::output::human::HumanRenderer;
use crate::output::json;

/// Arguments for the shell command.
#[derive(Args)]
pub struct ShellArgs {
    /// Agent or group to run on
    pub target: String,

    /// Command to run; `<(attr)>` tokens are replaced per agent
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

/// Run `args.command` as one batch on `args.target`.
///
/// # Errors
///
/// Returns an error if the target is unknown or a session fails.
pub async fn run(app: &AppContext, args: &ShellArgs) -> Result<ExitCode> {
    let inventory = app.inventory()?;
    let agent = inventory.agent(&args.target)?;
    let command = args.command.join(" ");

    let reports = agent
        .serialize(&[Operation::shell(command)], app.quiet())
        .await
        .with_context(|| format!("shell on {}", args.target))?;

    if app.is_json() {
        println!("{}", json::format_value(&reports)?);
    } else {
        HumanRenderer::new(&app.output).render_reports(&reports);
    }
    Ok(batch_exit_code(&reports))
}
