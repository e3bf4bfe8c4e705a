//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use std::time::Duration;

use thiserror::Error;

// ── Registry errors ───────────────────────────────────────────────────────────

/// Errors raised by the append-only registries (agents and tasks).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("duplicate {kind} '{name}': a {kind} with this name is already registered")]
    DuplicateEntry { kind: &'static str, name: String },

    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },
}

impl RegistryError {
    /// Name of the entry the error is about.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::DuplicateEntry { name, .. } | Self::NotFound { name, .. } => name,
        }
    }
}

// ── Agent errors ──────────────────────────────────────────────────────────────

/// Errors related to agents, groups and their sessions.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("agent '{0}' defines no connection strategy")]
    UnimplementedCapability(String),

    #[error("cannot open session for agent '{agent}': {source}")]
    Connection {
        agent: String,
        #[source]
        source: std::io::Error,
    },

    #[error("session for agent '{agent}' rejected input: {source}")]
    Transmit {
        agent: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read output of agent '{agent}': {source}")]
    Receive {
        agent: String,
        #[source]
        source: std::io::Error,
    },

    #[error("session for agent '{agent}' exceeded its {limit:?} deadline and was killed")]
    Timeout { agent: String, limit: Duration },

    #[error("adding '{member}' to group '{group}' would create a cycle")]
    Cycle { group: String, member: String },

    #[error("invalid agent name '{0}': must match ^[A-Za-z0-9_][A-Za-z0-9_-]{{0,63}}$")]
    InvalidName(String),

    #[error("agent '{0}' is not a group")]
    NotAGroup(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

// ── Task errors ───────────────────────────────────────────────────────────────

/// Errors related to task declaration and dispatch.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("invalid dependency '{0}': expected 'agent.task' or 'task'")]
    InvalidDependency(String),

    #[error("invalid task name '{0}': must match ^[A-Za-z0-9_][A-Za-z0-9_-]{{0,63}}$")]
    InvalidName(String),

    #[error("dependency cycle through task '{0}'")]
    DependencyCycle(String),

    #[error("task '{0}' is not registered")]
    UnknownTask(String),

    #[error("agent '{0}' is not registered")]
    UnknownAgent(String),

    #[error("task '{task}' failed on '{agent}': {source:#}")]
    Failed {
        task: String,
        agent: String,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Agent(#[from] AgentError),
}

// ── Inventory errors ──────────────────────────────────────────────────────────

/// Errors raised while validating an inventory document.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InventoryError {
    #[error("group '{group}' references unknown member '{member}'")]
    UnknownMember { group: String, member: String },

    #[error("remote agent '{0}' needs both 'host' and 'user'")]
    IncompleteRemote(String),

    #[error("group '{0}' (directly or transitively) contains itself")]
    GroupCycle(String),

    #[error("task '{task}' limits to unknown agent or group '{target}'")]
    UnknownLimit { task: String, target: String },

    #[error("invalid name '{0}': must match ^[A-Za-z0-9_][A-Za-z0-9_-]{{0,63}}$")]
    InvalidName(String),

    #[error("task '{task}' has invalid dependency '{dependency}'")]
    BadDependency { task: String, dependency: String },
}
