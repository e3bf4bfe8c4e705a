//! JSON output helpers.
//!
//! Every `--json` code path prints one pretty-printed document on stdout;
//! failures print the error object from [`format_error`].

use anyhow::{Context, Result};
use serde::Serialize;

use crate::application::{Agent, AgentKind, AgentRegistry, Endpoint, Task, TaskRegistry};

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = serde_json::json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Pretty-prints any serializable value.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_value<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("JSON serialization failed")
}

/// Serializable view of an agent.
#[derive(Debug, Serialize)]
pub struct AgentView {
    pub name: String,
    pub description: String,
    pub kind: &'static str,
    pub dry_run: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<String>,
}

impl From<&Agent> for AgentView {
    fn from(agent: &Agent) -> Self {
        let (kind, members) = match agent.kind() {
            AgentKind::Group(g) => ("group", g.member_names()),
            AgentKind::Leaf(leaf) => match leaf.endpoint() {
                Endpoint::Local { .. } => ("local", Vec::new()),
                Endpoint::Remote(_) => ("remote", Vec::new()),
                Endpoint::Unbound => ("unbound", Vec::new()),
            },
        };
        Self {
            name: agent.name().to_string(),
            description: agent.description().to_string(),
            kind,
            dry_run: agent.dry_run(),
            members,
        }
    }
}

/// Serializable view of a task.
#[derive(Debug, Serialize)]
pub struct TaskView {
    pub name: String,
    pub description: String,
    pub depends_on: Vec<String>,
    pub limit: Vec<String>,
    pub background: bool,
    pub verbose: bool,
}

impl From<&Task> for TaskView {
    fn from(task: &Task) -> Self {
        Self {
            name: task.name().to_string(),
            description: task.description().to_string(),
            depends_on: task.depends_on().iter().map(ToString::to_string).collect(),
            limit: task.limit().to_vec(),
            background: task.background(),
            verbose: task.verbose(),
        }
    }
}

#[must_use]
pub fn agent_views(agents: &AgentRegistry) -> Vec<AgentView> {
    agents.iter().map(|a| AgentView::from(a.as_ref())).collect()
}

#[must_use]
pub fn task_views(tasks: &TaskRegistry) -> Vec<TaskView> {
    tasks.iter().map(|t| TaskView::from(t.as_ref())).collect()
}
