//! Builds the agent and task registries from an inventory document.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::application::ports::Wiring;
use crate::application::services::agent::{Agent, AgentBuilder, AgentRef};
use crate::application::services::agents::AgentRegistry;
use crate::application::services::dispatch::Dispatcher;
use crate::application::services::task::{TaskBuilder, TaskRegistry, scripted};
use crate::domain::config::LOCAL_AGENT_DESC;
use crate::domain::{
    AgentKindSpec, AgentSpec, InventoryConfig, LOCAL_AGENT, RegistryError, Settings,
    validate_inventory,
};

/// The static topology: frozen registries shared by every dispatch.
pub struct Inventory {
    pub settings: Settings,
    pub agents: Arc<AgentRegistry>,
    pub tasks: Arc<TaskRegistry>,
}

impl Inventory {
    /// Validates `config` and registers, in order: the built-in `local`
    /// agent (unless the document defines its own), declared agents, groups,
    /// then scripted tasks. `quiet` applies to the commands scripted tasks
    /// issue.
    ///
    /// # Errors
    ///
    /// Returns an error on validation failures and duplicate names.
    pub fn build(config: &InventoryConfig, wiring: &Wiring, quiet: bool) -> Result<Self> {
        validate_inventory(config).context("invalid inventory")?;
        let settings = &config.settings;

        let mut agents = AgentRegistry::new();
        if !config.agents.iter().any(|a| a.name == LOCAL_AGENT) {
            let local = Agent::local(LOCAL_AGENT)
                .description(LOCAL_AGENT_DESC)
                .shell(&settings.shell)
                .dry_run(settings.dry_run)
                .mode(settings.mode)
                .timeout(deadline(settings.session_timeout_secs))
                .build(wiring)?;
            agents.add(local)?;
        }
        for spec in &config.agents {
            let agent = leaf_builder(spec, settings)
                .build(wiring)
                .with_context(|| format!("agent '{}'", spec.name))?;
            agents.add(agent)?;
        }

        for spec in &config.groups {
            let dry_run = spec.dry_run.unwrap_or(settings.dry_run);
            agents.add(Agent::group(&spec.name, &spec.desc, dry_run)?)?;
        }
        for spec in &config.groups {
            for member in &spec.members {
                agents
                    .attach(&spec.name, member)
                    .with_context(|| format!("group '{}'", spec.name))?;
            }
        }

        let mut tasks = TaskRegistry::new();
        for spec in &config.tasks {
            let task = TaskBuilder::new(&spec.name)
                .description(&spec.desc)
                .depends_on(&spec.depends)
                .limit(&spec.limit)
                .background(spec.background)
                .verbose(spec.verbose)
                .build(scripted(spec.commands.clone(), quiet))
                .with_context(|| format!("task '{}'", spec.name))?;
            tasks.add(task)?;
        }

        tracing::debug!(agents = agents.len(), tasks = tasks.len(), "inventory built");
        Ok(Self {
            settings: settings.clone(),
            agents: Arc::new(agents),
            tasks: Arc::new(tasks),
        })
    }

    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] for an unknown agent or group.
    pub fn agent(&self, name: &str) -> Result<&AgentRef, RegistryError> {
        self.agents.require(name)
    }

    #[must_use]
    pub fn dispatcher(&self, quiet: bool) -> Dispatcher {
        Dispatcher::new(Arc::clone(&self.agents), Arc::clone(&self.tasks)).quiet(quiet)
    }
}

fn deadline(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

fn leaf_builder(spec: &AgentSpec, settings: &Settings) -> AgentBuilder {
    let builder = match spec.kind {
        AgentKindSpec::Local => Agent::local(&spec.name).shell(&settings.shell),
        AgentKindSpec::Remote => Agent::remote(
            &spec.name,
            spec.user.as_deref().unwrap_or_default(),
            spec.host.as_deref().unwrap_or_default(),
        )
        .client(&settings.ssh)
        .port(spec.port)
        .flags(&spec.flags),
        AgentKindSpec::Unbound => Agent::unbound(&spec.name),
    };
    builder
        .description(&spec.desc)
        .id(spec.id)
        .start_path(&spec.start_path)
        .dry_run(spec.dry_run.unwrap_or(settings.dry_run))
        .mode(spec.mode.unwrap_or(settings.mode))
        .timeout(deadline(
            spec.session_timeout_secs
                .unwrap_or(settings.session_timeout_secs),
        ))
}
