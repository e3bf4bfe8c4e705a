//! Inventory schema and validators.
//!
//! The inventory is the static topology the controller works against: the
//! agents, the groups built from them, and scripted tasks. It is loaded once
//! at startup and never mutated while dispatching.
//!
//! Pure functions only: no I/O, no async, no filesystem access.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::dependency::Dependency;
use crate::domain::error::InventoryError;

// ── Constants ────────────────────────────────────────────────────────────────

/// Name of the built-in local agent.
pub const LOCAL_AGENT: &str = "local";

/// Description of the built-in local agent.
pub const LOCAL_AGENT_DESC: &str = "the localhost";

pub const DEFAULT_SESSION_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_SHELL: &str = "/bin/sh";
pub const DEFAULT_SSH: &str = "ssh";
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Agent, group and task names.
pub static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Safety: this is a compile-time constant pattern and cannot fail.
    #[allow(clippy::expect_used)]
    Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_-]{0,63}$").expect("valid regex")
});

// ── Schema ───────────────────────────────────────────────────────────────────

/// How an agent transmits commands to its session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransmitMode {
    /// Each command is written as soon as it is issued.
    #[default]
    Immediate,
    /// Commands are wrapped in sentinels and written as one block on flush.
    Buffered,
}

/// Top-level inventory document, usually `~/.cnctl/inventory.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct InventoryConfig {
    pub settings: Settings,
    pub agents: Vec<AgentSpec>,
    pub groups: Vec<GroupSpec>,
    pub tasks: Vec<TaskSpec>,
}

/// Defaults applied to every agent unless the agent overrides them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Per-session deadline in seconds; `0` disables it.
    pub session_timeout_secs: u64,
    pub mode: TransmitMode,
    pub dry_run: bool,
    /// Interpreter spawned by local agents.
    pub shell: String,
    /// Client spawned by remote agents.
    pub ssh: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            session_timeout_secs: DEFAULT_SESSION_TIMEOUT_SECS,
            mode: TransmitMode::default(),
            dry_run: false,
            shell: DEFAULT_SHELL.to_string(),
            ssh: DEFAULT_SSH.to_string(),
        }
    }
}

/// Kind of leaf agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKindSpec {
    #[default]
    Local,
    Remote,
    /// Declared but without a connection strategy.
    Unbound,
}

/// One leaf agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSpec {
    pub name: String,
    #[serde(default)]
    pub kind: AgentKindSpec,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub user: Option<String>,
    /// Extra arguments passed to the ssh client before the host.
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub start_path: String,
    #[serde(default)]
    pub mode: Option<TransmitMode>,
    #[serde(default)]
    pub dry_run: Option<bool>,
    #[serde(default)]
    pub session_timeout_secs: Option<u64>,
}

fn default_port() -> u16 {
    DEFAULT_SSH_PORT
}

/// A named group of agents or other groups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSpec {
    pub name: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub dry_run: Option<bool>,
}

/// A scripted task: a list of commands run through `shell`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSpec {
    pub name: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub commands: Vec<String>,
    #[serde(default)]
    pub limit: Vec<String>,
    #[serde(default)]
    pub depends: Vec<String>,
    #[serde(default)]
    pub background: bool,
    #[serde(default)]
    pub verbose: bool,
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Validates an agent, group or task name.
///
/// # Errors
///
/// Returns [`InventoryError::InvalidName`] if the name does not match [`NAME_RE`].
pub fn validate_name(name: &str) -> Result<(), InventoryError> {
    if NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(InventoryError::InvalidName(name.to_string()))
    }
}

/// Validates a whole inventory document.
///
/// Duplicate names are not reported here; the registries reject them when
/// the inventory is built.
///
/// # Errors
///
/// Returns the first violation found.
pub fn validate_inventory(inv: &InventoryConfig) -> Result<(), InventoryError> {
    for agent in &inv.agents {
        validate_name(&agent.name)?;
        if agent.kind == AgentKindSpec::Remote && (agent.host.is_none() || agent.user.is_none()) {
            return Err(InventoryError::IncompleteRemote(agent.name.clone()));
        }
    }

    let mut known: HashSet<&str> = inv.agents.iter().map(|a| a.name.as_str()).collect();
    known.insert(LOCAL_AGENT);
    for group in &inv.groups {
        validate_name(&group.name)?;
        known.insert(group.name.as_str());
    }
    for group in &inv.groups {
        if let Some(member) = group.members.iter().find(|m| !known.contains(m.as_str())) {
            return Err(InventoryError::UnknownMember {
                group: group.name.clone(),
                member: member.clone(),
            });
        }
    }
    check_group_cycles(&inv.groups)?;

    for task in &inv.tasks {
        validate_name(&task.name)?;
        if let Some(target) = task.limit.iter().find(|t| !known.contains(t.as_str())) {
            return Err(InventoryError::UnknownLimit {
                task: task.name.clone(),
                target: target.clone(),
            });
        }
        for dep in &task.depends {
            Dependency::parse(dep).map_err(|_| InventoryError::BadDependency {
                task: task.name.clone(),
                dependency: dep.clone(),
            })?;
        }
    }
    Ok(())
}

/// Rejects groups that reach themselves through their members.
fn check_group_cycles(groups: &[GroupSpec]) -> Result<(), InventoryError> {
    let edges: HashMap<&str, &[String]> = groups
        .iter()
        .map(|g| (g.name.as_str(), g.members.as_slice()))
        .collect();

    for group in groups {
        let mut stack: Vec<&str> = group.members.iter().map(String::as_str).collect();
        let mut seen: HashSet<&str> = HashSet::new();
        while let Some(name) = stack.pop() {
            if name == group.name {
                return Err(InventoryError::GroupCycle(group.name.clone()));
            }
            if !seen.insert(name) {
                continue;
            }
            if let Some(members) = edges.get(name) {
                stack.extend(members.iter().map(String::as_str));
            }
        }
    }
    Ok(())
}

// ── Unit tests ───────────────────────────────────────────────────────────────
