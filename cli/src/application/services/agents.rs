//! The agent registry: every agent and group known to the process.

use std::collections::BTreeSet;

use crate::application::services::agent::AgentRef;
use crate::domain::{AgentError, Registry, RegistryError};

/// Process-wide agents, keyed by name, in registration order.
///
/// Populated during setup and only read while dispatching.
pub struct AgentRegistry {
    inner: Registry<String, AgentRef>,
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Registry::new("agent"),
        }
    }

    /// Registers `agent` under its own name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateEntry`] if the name is taken.
    pub fn add(&mut self, agent: AgentRef) -> Result<(), RegistryError> {
        tracing::trace!(agent = agent.name(), "registered");
        self.inner.add(agent.name().to_string(), agent)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AgentRef> {
        self.inner.get(name)
    }

    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] for an unknown name.
    pub fn require(&self, name: &str) -> Result<&AgentRef, RegistryError> {
        self.inner.require(name)
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        self.inner.names()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AgentRef> {
        self.inner.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Adds the registered agent `member` to the registered group `group`.
    ///
    /// # Errors
    ///
    /// Fails if either name is unknown, `group` is a leaf, or the addition
    /// would create a cycle.
    pub fn attach(&self, group: &str, member: &str) -> Result<bool, AgentError> {
        let g = self.inner.require(group)?;
        let m = self.inner.require(member)?;
        g.add(AgentRef::clone(m))
    }

    /// Removes `name` and purges it from every group that lists it.
    pub fn remove(&mut self, name: &str) -> Option<AgentRef> {
        let removed = self.inner.remove(name)?;
        for group in self.inner.iter().filter_map(|a| a.as_group()) {
            group.remove(name);
        }
        tracing::debug!(agent = name, "removed");
        Some(removed)
    }

    /// Expands targeting names: a group contributes itself and its recursive
    /// members, a leaf contributes itself. Unknown names are skipped.
    #[must_use]
    pub fn expand<S: AsRef<str>>(&self, names: &[S]) -> BTreeSet<String> {
        names
            .iter()
            .filter_map(|n| self.inner.get(n.as_ref()))
            .flat_map(|a| a.expand_names())
            .collect()
    }
}
