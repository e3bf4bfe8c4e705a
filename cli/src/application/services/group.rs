//! Composite agents: ordered member sets and concurrent fan-out.

use std::future::Future;
use std::sync::{PoisonError, RwLock};

use crate::application::services::agent::{AgentRef, AgentReport};
use crate::domain::AgentError;

/// Member set of a group agent. Insertion order is preserved and names are
/// unique; cycle checks happen in [`crate::application::services::agent::Agent::add`].
#[derive(Default)]
pub struct AgentGroup {
    members: RwLock<Vec<AgentRef>>,
}

impl AgentGroup {
    /// Appends `member` unless a member with the same name exists.
    pub(crate) fn insert(&self, member: AgentRef) -> bool {
        let mut members = self.members.write().unwrap_or_else(PoisonError::into_inner);
        if members.iter().any(|m| m.name() == member.name()) {
            return false;
        }
        members.push(member);
        true
    }

    /// Drops the direct member called `name`.
    pub(crate) fn remove(&self, name: &str) -> bool {
        let mut members = self.members.write().unwrap_or_else(PoisonError::into_inner);
        let before = members.len();
        members.retain(|m| m.name() != name);
        members.len() != before
    }

    /// Snapshot of the direct members, in insertion order.
    #[must_use]
    pub fn members(&self) -> Vec<AgentRef> {
        self.members
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn member_names(&self) -> Vec<String> {
        self.members().iter().map(|m| m.name().to_string()).collect()
    }

    pub(crate) fn collect_leaves(&self, inherited_dry: bool, out: &mut Vec<(AgentRef, bool)>) {
        for member in self.members() {
            match member.as_group() {
                Some(nested) => nested.collect_leaves(inherited_dry || member.dry_run(), out),
                None => {
                    if !out.iter().any(|(seen, _)| seen.name() == member.name()) {
                        out.push((member, inherited_dry));
                    }
                }
            }
        }
    }

    pub(crate) fn collect_names(&self, out: &mut Vec<String>) {
        for member in self.members() {
            if !out.iter().any(|n| n == member.name()) {
                out.push(member.name().to_string());
            }
            if let Some(nested) = member.as_group() {
                nested.collect_names(out);
            }
        }
    }

    /// Runs `op` once per flattened leaf of `group`, each on its own tokio
    /// task, and joins them all. Reports come back in flattened order; the
    /// first failing leaf (in that order) decides the error.
    pub(crate) async fn fan_out<F, Fut>(
        group: &AgentRef,
        op: F,
    ) -> Result<Vec<AgentReport>, AgentError>
    where
        F: Fn(AgentRef, bool) -> Fut,
        Fut: Future<Output = Result<Vec<AgentReport>, AgentError>> + Send + 'static,
    {
        let handles: Vec<_> = group
            .leaves()
            .into_iter()
            .map(|(leaf, dry)| {
                let name = leaf.name().to_string();
                (name, tokio::spawn(op(leaf, dry)))
            })
            .collect();
        tracing::debug!(group = group.name(), leaves = handles.len(), "fan-out");

        let mut reports = Vec::new();
        let mut first_error = None;
        for (name, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(e) => Err(AgentError::Transmit {
                    agent: name,
                    source: std::io::Error::other(e),
                }),
            };
            match outcome {
                Ok(mut r) => reports.append(&mut r),
                Err(e) => {
                    tracing::warn!(group = group.name(), error = %e, "member failed");
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(reports),
        }
    }
}
