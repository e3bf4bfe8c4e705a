//! Application context: unified state passed to every command handler.
//!
//! Adding a new cross-cutting flag requires one field change here; command
//! signatures stay `fn run(app: &AppContext, ...)`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use crate::application::{InventoryStore, Inventory, NullSink, TagSink, Wiring};
use crate::domain::InventoryConfig;
use crate::infra::config::YamlInventoryStore;
use crate::infra::connector::{TokioConnector, local_hostname};
use crate::output::{OutputContext, TerminalTagSink};

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress the `>>>` and `<<<` channels.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

/// Flags overriding the inventory's settings.
#[derive(Debug, Default, Clone)]
pub struct InventoryFlags {
    /// Explicit inventory file.
    pub path: Option<PathBuf>,
    /// Force dry-run on every agent.
    pub dry_run: bool,
    /// Session deadline in seconds for every agent; `0` disables it.
    pub timeout_secs: Option<u64>,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    pub output: OutputFlags,
    pub inventory: InventoryFlags,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    /// Where the inventory comes from.
    pub store: YamlInventoryStore,
    overrides: InventoryFlags,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    #[must_use]
    pub fn new(flags: &AppFlags) -> Self {
        let mode = if flags.output.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };
        let store = match &flags.inventory.path {
            Some(path) => YamlInventoryStore::with_path(path),
            None => YamlInventoryStore::new(),
        };
        Self {
            output: OutputContext::new(flags.output.no_color, flags.output.quiet),
            mode,
            store,
            overrides: flags.inventory.clone(),
        }
    }

    /// Returns `true` when JSON output mode is active.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    /// Whether the input and output tag channels are suppressed.
    #[must_use]
    pub fn quiet(&self) -> bool {
        self.output.quiet
    }

    /// Production wiring. In JSON mode the tag stream is dropped; results go
    /// into the JSON document instead.
    #[must_use]
    pub fn wiring(&self) -> Wiring {
        let sink: Arc<dyn TagSink> = if self.is_json() {
            Arc::new(NullSink)
        } else {
            Arc::new(TerminalTagSink::new(&self.output))
        };
        Wiring {
            connector: Arc::new(TokioConnector),
            sink,
            local_hostname: local_hostname(),
        }
    }

    /// Loads the inventory document and applies command-line overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the inventory file cannot be read or parsed.
    pub fn load_config(&self) -> Result<InventoryConfig> {
        let mut config = self.store.load()?;
        apply_overrides(&mut config, &self.overrides);
        Ok(config)
    }

    /// Loads, validates and builds the inventory.
    ///
    /// # Errors
    ///
    /// Returns an error if the inventory cannot be loaded or is invalid.
    pub fn inventory(&self) -> Result<Inventory> {
        let config = self.load_config()?;
        Inventory::build(&config, &self.wiring(), self.quiet())
    }
}

fn apply_overrides(config: &mut InventoryConfig, flags: &InventoryFlags) {
    if flags.dry_run {
        config.settings.dry_run = true;
        for agent in &mut config.agents {
            agent.dry_run = Some(true);
        }
    }
    if let Some(secs) = flags.timeout_secs {
        config.settings.session_timeout_secs = secs;
        for agent in &mut config.agents {
            agent.session_timeout_secs = None;
        }
    }
}
