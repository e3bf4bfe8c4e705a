//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use crate::domain::{InventoryConfig, Tag};

// ── Session Port ──────────────────────────────────────────────────────────────

/// Spawns the long-lived process behind an agent's session.
///
/// The production implementation pipes stdin, stdout and stderr and sets
/// `kill_on_drop(true)`, so dropping the child always reaps the process.
/// Test doubles substitute local programs for `ssh`.
#[cfg_attr(test, mockall::automock)]
pub trait Connector: Send + Sync {
    /// Spawn `program` with `args` and return the child handle.
    ///
    /// # Errors
    ///
    /// Returns the spawn error unchanged so callers can wrap it in a typed
    /// connection error.
    fn spawn(&self, program: &str, args: &[String]) -> std::io::Result<tokio::process::Child>;
}

// ── Tag Reporting Port ────────────────────────────────────────────────────────

/// Receives tagged lines reported by agents (`>>>`, `<<<`, `!!!`, `???`).
///
/// Sync trait; no async needed. Implementations must tolerate concurrent
/// calls from agents running in parallel.
pub trait TagSink: Send + Sync {
    /// Report one message for `agent` on channel `tag`. `message` may span
    /// several lines (grouped stderr).
    fn emit(&self, agent: &str, tag: Tag, message: &str);
}

/// A sink that drops every message.
pub struct NullSink;

impl TagSink for NullSink {
    fn emit(&self, _: &str, _: Tag, _: &str) {}
}

/// The infrastructure an agent needs to open and report on sessions.
#[derive(Clone)]
pub struct Wiring {
    /// Process launcher for sessions.
    pub connector: Arc<dyn Connector>,
    /// Destination for tagged output.
    pub sink: Arc<dyn TagSink>,
    /// Value of the `<(local)>` template attribute on remote agents.
    pub local_hostname: String,
}

// ── Inventory Port ────────────────────────────────────────────────────────────

/// Abstracts loading the inventory document.
pub trait InventoryStore {
    /// Load the inventory, falling back to the built-in one when no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    fn load(&self) -> Result<InventoryConfig>;

    /// Location of the inventory file.
    ///
    /// # Errors
    ///
    /// Returns an error if the location cannot be determined.
    fn path(&self) -> Result<PathBuf>;
}
