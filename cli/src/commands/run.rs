//! Run command: a task and its dependencies.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::AgentReport;
use crate::commands::batch_exit_code;
use crate::output::human::HumanRenderer;
use crate::output::json;

/// Arguments for the run command.
#[derive(Args)]
pub struct RunArgs {
    /// Task to run
    pub task: String,

    /// Agent or group to run it on
    #[arg(default_value = crate::domain::LOCAL_AGENT)]
    pub target: String,
}

/// Plan and run `args.task` on `args.target`.
///
/// # Errors
///
/// Returns an error if planning fails or a step fails.
pub async fn run(app: &AppContext, args: &RunArgs) -> Result<ExitCode> {
    let inventory = app.inventory()?;
    let steps = inventory
        .dispatcher(app.quiet())
        .dispatch(&args.task, &args.target)
        .await?;

    if app.is_json() {
        println!("{}", json::format_value(&steps)?);
    } else {
        HumanRenderer::new(&app.output).render_steps(&steps);
    }
    let reports: Vec<AgentReport> = steps.into_iter().flat_map(|s| s.reports).collect();
    Ok(batch_exit_code(&reports))
}
