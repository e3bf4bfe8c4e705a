//! Dependency-ordered task dispatch.
//!
//! The registries only record `depends_on`; the dispatcher turns a requested
//! `(task, agent)` into an ordered plan and runs it, committing each step
//! (`end`, `flush`, `reset`) before the next one starts.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;

use crate::application::services::agent::{AgentRef, AgentReport};
use crate::application::services::agents::AgentRegistry;
use crate::application::services::task::{Task, TaskRegistry};
use crate::domain::TaskError;

/// One `(agent, task)` pair in a plan.
#[derive(Clone)]
pub struct Step {
    pub agent: AgentRef,
    pub task: Arc<Task>,
}

impl Step {
    fn key(&self) -> (String, String) {
        (self.agent.name().to_string(), self.task.name().to_string())
    }

    /// Keys of the steps this one depends on directly.
    fn dependency_keys(&self) -> HashSet<(String, String)> {
        self.task
            .depends_on()
            .iter()
            .map(|dep| {
                let agent = dep.agent.as_deref().unwrap_or_else(|| self.agent.name());
                (agent.to_string(), dep.task.clone())
            })
            .collect()
    }
}

/// A spawned background step.
struct Pending {
    key: (String, String),
    leaves: BTreeSet<String>,
    handle: JoinHandle<Result<StepReport, TaskError>>,
}

impl std::fmt::Debug for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.agent.name(), self.task.name())
    }
}

/// Result of one committed step.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub agent: String,
    pub task: String,
    /// `false` when the agent was not targeted by the task.
    pub invoked: bool,
    pub background: bool,
    pub reports: Vec<AgentReport>,
}

/// Plans and runs tasks against the registries built at startup.
#[derive(Clone)]
pub struct Dispatcher {
    agents: Arc<AgentRegistry>,
    tasks: Arc<TaskRegistry>,
    quiet: bool,
}

impl Dispatcher {
    #[must_use]
    pub fn new(agents: Arc<AgentRegistry>, tasks: Arc<TaskRegistry>) -> Self {
        Self {
            agents,
            tasks,
            quiet: false,
        }
    }

    /// Suppresses the input and output tag channels for every step.
    #[must_use]
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Orders `task` on `agent` after all of its dependencies.
    ///
    /// Agent-qualified dependencies run on the named agent; bare ones on the
    /// same agent as their dependent. Each `(agent, task)` pair appears once.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::UnknownTask`], [`TaskError::UnknownAgent`] or
    /// [`TaskError::DependencyCycle`].
    pub fn plan(&self, task: &str, agent: &str) -> Result<Vec<Step>, TaskError> {
        let agent = self
            .agents
            .get(agent)
            .ok_or_else(|| TaskError::UnknownAgent(agent.to_string()))?;
        let mut plan = Vec::new();
        let mut done = HashSet::new();
        let mut visiting = Vec::new();
        self.visit(task, agent, &mut visiting, &mut done, &mut plan)?;
        tracing::debug!(?plan, "planned");
        Ok(plan)
    }

    fn visit(
        &self,
        task: &str,
        agent: &AgentRef,
        visiting: &mut Vec<(String, String)>,
        done: &mut HashSet<(String, String)>,
        plan: &mut Vec<Step>,
    ) -> Result<(), TaskError> {
        let task = self
            .tasks
            .get(task)
            .ok_or_else(|| TaskError::UnknownTask(task.to_string()))?;
        let step = Step {
            agent: AgentRef::clone(agent),
            task: Arc::clone(task),
        };
        let key = step.key();
        if done.contains(&key) {
            return Ok(());
        }
        if visiting.contains(&key) {
            return Err(TaskError::DependencyCycle(format!("{}.{}", key.0, key.1)));
        }

        visiting.push(key.clone());
        for dep in task.depends_on() {
            let target = match &dep.agent {
                Some(name) => self
                    .agents
                    .get(name)
                    .ok_or_else(|| TaskError::UnknownAgent(name.clone()))?,
                None => agent,
            };
            self.visit(&dep.task, target, visiting, done, plan)?;
        }
        visiting.pop();

        done.insert(key);
        plan.push(step);
        Ok(())
    }

    /// Plans and runs `task` on `agent`.
    ///
    /// # Errors
    ///
    /// Fails on planning errors or the first failing step.
    pub async fn dispatch(&self, task: &str, agent: &str) -> Result<Vec<StepReport>, TaskError> {
        let plan = self.plan(task, agent)?;
        self.run(&plan).await
    }

    /// Runs `steps` in order. Background steps are spawned and joined before
    /// returning. A later step waits for the background steps it depends on
    /// and for those touching the same leaves.
    ///
    /// # Errors
    ///
    /// Returns the first step failure. Outstanding background steps are still
    /// joined.
    pub async fn run(&self, steps: &[Step]) -> Result<Vec<StepReport>, TaskError> {
        let mut reports = Vec::new();
        let mut pending: Vec<Pending> = Vec::new();

        let mut outcome = Ok(());
        for step in steps {
            let touched = leaf_names(&step.agent);
            let deps = step.dependency_keys();
            let (blocking, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut pending)
                .into_iter()
                .partition(|p| deps.contains(&p.key) || !p.leaves.is_disjoint(&touched));
            pending = rest;
            if !blocking.is_empty() {
                tracing::debug!(?step, waiting = blocking.len(), "joining background steps");
                outcome = join_all(blocking, &mut reports).await;
                if outcome.is_err() {
                    break;
                }
            }

            if step.task.background() {
                tracing::debug!(?step, "spawning background step");
                let this = self.clone();
                let spawned = step.clone();
                pending.push(Pending {
                    key: step.key(),
                    leaves: touched,
                    handle: tokio::spawn(async move { this.commit(&spawned).await }),
                });
                continue;
            }

            match self.commit(step).await {
                Ok(report) => reports.push(report),
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            }
        }

        let joined = join_all(pending, &mut reports).await;
        outcome.and(joined).map(|()| reports)
    }

    async fn commit(&self, step: &Step) -> Result<StepReport, TaskError> {
        let Step { agent, task } = step;
        let called = task.call(agent, &self.agents).await;
        let invoked = matches!(called, Ok(true));
        let committed = match called {
            Ok(true) => match agent.end(self.quiet).await {
                Ok(()) => agent.flush(self.quiet).await.map_err(TaskError::from),
                Err(e) => Err(e.into()),
            },
            Ok(false) => Ok(Vec::new()),
            Err(e) => Err(e),
        };
        agent.reset().await;
        Ok(StepReport {
            agent: agent.name().to_string(),
            task: task.name().to_string(),
            invoked,
            background: task.background(),
            reports: committed?,
        })
    }
}

fn leaf_names(agent: &AgentRef) -> BTreeSet<String> {
    if agent.is_group() {
        agent
            .leaves()
            .iter()
            .map(|(l, _)| l.name().to_string())
            .collect()
    } else {
        BTreeSet::from([agent.name().to_string()])
    }
}

async fn join_all(pending: Vec<Pending>, reports: &mut Vec<StepReport>) -> Result<(), TaskError> {
    let mut first_error = None;
    for Pending { key, handle, .. } in pending {
        match handle.await {
            Ok(Ok(report)) => reports.push(report),
            Ok(Err(e)) => {
                first_error.get_or_insert(e);
            }
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => {
                let (agent, task) = key;
                first_error.get_or_insert(TaskError::Failed {
                    task,
                    agent,
                    source: e.into(),
                });
            }
        }
    }
    first_error.map_or(Ok(()), Err)
}
