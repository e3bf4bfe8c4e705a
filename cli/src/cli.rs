//! CLI argument parsing with clap derive

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags, InventoryFlags, OutputFlags};
use crate::commands;

/// Run shell commands and tasks against local and remote agents
#[derive(Parser)]
#[command(
    name = "cnctl",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress the command and output channels (errors and exit codes still print)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Inventory file [default: $CNCTL_INVENTORY or ~/.cnctl/inventory.yaml]
    #[arg(short, long, global = true, value_name = "FILE")]
    pub inventory: Option<PathBuf>,

    /// Log and template commands without sending them
    #[arg(short = 'n', long, global = true)]
    pub dry_run: bool,

    /// Per-session deadline in seconds (0 disables)
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List agents and groups
    Agents,

    /// List tasks
    Tasks,

    /// Run a shell command on an agent or group
    Shell(commands::shell::ShellArgs),

    /// Run a task, after its dependencies, on an agent or group
    Run(commands::run::RunArgs),

    /// Validate the inventory
    Check,

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the inventory is invalid or the command fails.
    pub async fn run(self) -> Result<ExitCode> {
        let Cli {
            json,
            quiet,
            no_color,
            inventory,
            dry_run,
            timeout,
            command,
        } = self;
        let app = AppContext::new(&AppFlags {
            output: OutputFlags {
                no_color,
                quiet,
                json,
            },
            inventory: InventoryFlags {
                path: inventory,
                dry_run,
                timeout_secs: timeout,
            },
        });

        match command {
            Command::Version => commands::version::run(&app).map(|()| ExitCode::SUCCESS),
            Command::Agents => commands::agents::run(&app).map(|()| ExitCode::SUCCESS),
            Command::Tasks => commands::tasks::run(&app).map(|()| ExitCode::SUCCESS),
            Command::Check => commands::check::run(&app).map(|()| ExitCode::SUCCESS),
            Command::Shell(args) => commands::shell::run(&app, &args).await,
            Command::Run(args) => commands::run::run(&app, &args).await,
        }
    }
}
