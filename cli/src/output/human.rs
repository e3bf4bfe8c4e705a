//! Human-readable terminal renderer.

use std::path::Path;

use owo_colors::OwoColorize as _;

use crate::application::{AgentRegistry, AgentReport, Inventory, StepReport, TaskRegistry};
use crate::output::OutputContext;

/// Renders registries and batch results as terminal output.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the CLI version.
    pub fn render_version(&self, version: &str) {
        if self.ctx.quiet {
            return;
        }
        println!("cnctl {version}");
    }

    /// One `"%16s:\t%s"` line per agent, in registration order.
    pub fn render_agents(&self, agents: &AgentRegistry) {
        for agent in agents.iter() {
            println!("{agent}");
        }
    }

    /// One `"%16s:\t%s"` line per task, followed by its dependencies and
    /// limit when it has any.
    pub fn render_tasks(&self, tasks: &TaskRegistry) {
        for task in tasks.iter() {
            println!("{task}");
            if !task.depends_on().is_empty() {
                let deps: Vec<String> = task.depends_on().iter().map(ToString::to_string).collect();
                println!("{:>16} \t{} {}", "", "after".style(self.ctx.styles.dim), deps.join(", "));
            }
            if !task.limit().is_empty() {
                println!(
                    "{:>16} \t{} {}",
                    "",
                    "only".style(self.ctx.styles.dim),
                    task.limit().join(", ")
                );
            }
        }
    }

    /// Per-agent exit summary after a batch. Skipped for a single agent,
    /// whose `???` line already says it all.
    pub fn render_reports(&self, reports: &[AgentReport]) {
        if reports.len() < 2 {
            return;
        }
        println!();
        self.ctx.section("Summary:");
        for report in reports {
            self.render_exit(&report.agent, report.exit_code);
        }
    }

    /// One line per dispatched step.
    pub fn render_steps(&self, steps: &[StepReport]) {
        if self.ctx.quiet || steps.is_empty() {
            return;
        }
        println!();
        self.ctx.section("Steps:");
        for step in steps {
            let label = format!("{} on {}", step.task, step.agent);
            if !step.invoked {
                self.ctx.field(&label, "not targeted");
                continue;
            }
            if step.reports.is_empty() {
                self.ctx.passed(&label);
            }
            for report in &step.reports {
                self.render_exit(&format!("{} on {}", step.task, report.agent), report.exit_code);
            }
        }
    }

    fn render_exit(&self, label: &str, code: Option<i32>) {
        match code {
            Some(0) => self.ctx.passed(label),
            Some(code) => self.ctx.exited(label, code),
            None => self.ctx.field(label, "no session"),
        }
    }

    /// Result of `cnctl check`.
    pub fn render_check(&self, path: &Path, inventory: &Inventory) {
        self.ctx.field("Inventory:", &path.display().to_string());
        self.ctx.field("Agents:", &inventory.agents.len().to_string());
        self.ctx.field("Tasks:", &inventory.tasks.len().to_string());
        let timeout = match inventory.settings.session_timeout_secs {
            0 => "none".to_string(),
            secs => format!("{secs}s"),
        };
        self.ctx.field("Timeout:", &timeout);
        self.ctx.passed("inventory is valid");
    }
}
