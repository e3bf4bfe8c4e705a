//! Tasks: named procedures bound to dependency and targeting metadata.
//!
//! A task is registered once and then called against any number of agents.
//! `limit` restricts which agents are eligible; calling an ineligible agent
//! is a silent no-op. Dependencies are recorded, not scheduled; see
//! [`crate::application::services::dispatch`].

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::Context;

use crate::application::services::agent::{Agent, AgentRef};
use crate::application::services::agents::AgentRegistry;
use crate::domain::{Dependency, Registry, TaskError, validate_name};

/// Future returned by a task procedure.
pub type TaskFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

/// Type-erased task body.
pub type Procedure = Arc<dyn Fn(AgentRef) -> TaskFuture + Send + Sync>;

/// Wraps an async function or closure taking an agent into a [`Procedure`].
pub fn procedure<F, Fut>(f: F) -> Procedure
where
    F: Fn(AgentRef) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |agent: AgentRef| -> TaskFuture { Box::pin(f(agent)) })
}

/// Procedure that issues `commands` through `shell`, in order.
#[must_use]
pub fn scripted(commands: Vec<String>, quiet: bool) -> Procedure {
    let commands: Arc<[String]> = commands.into();
    procedure(move |agent: AgentRef| {
        let commands = Arc::clone(&commands);
        async move {
            for command in commands.iter() {
                agent
                    .shell(command, quiet)
                    .await
                    .with_context(|| format!("running '{command}' on {}", agent.name()))?;
            }
            Ok(())
        }
    })
}

// ── Task ──────────────────────────────────────────────────────────────────────

pub struct Task {
    name: String,
    description: String,
    depends_on: Vec<Dependency>,
    limit: Vec<String>,
    background: bool,
    verbose: bool,
    procedure: Procedure,
}

impl Task {
    #[must_use]
    pub fn builder(name: &str) -> TaskBuilder {
        TaskBuilder::new(name)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn depends_on(&self) -> &[Dependency] {
        &self.depends_on
    }

    #[must_use]
    pub fn limit(&self) -> &[String] {
        &self.limit
    }

    #[must_use]
    pub fn background(&self) -> bool {
        self.background
    }

    #[must_use]
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Whether `agent` is a valid target.
    ///
    /// With an empty `limit` every agent is. Otherwise `limit` is expanded
    /// through `agents` and the agent must be named in the expansion; a group
    /// also qualifies when every one of its leaves is.
    #[must_use]
    pub fn is_eligible(&self, agent: &Agent, agents: &AgentRegistry) -> bool {
        if self.limit.is_empty() {
            return true;
        }
        let targets = agents.expand(&self.limit);
        if targets.contains(agent.name()) {
            return true;
        }
        let leaves = agent.leaves();
        !leaves.is_empty() && leaves.iter().all(|(l, _)| targets.contains(l.name()))
    }

    /// Invokes the procedure with `agent` if it is eligible. Returns whether
    /// the procedure ran. Does not commit the batch.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Failed`] when the procedure fails.
    pub async fn call(&self, agent: &AgentRef, agents: &AgentRegistry) -> Result<bool, TaskError> {
        if !self.is_eligible(agent, agents) {
            tracing::debug!(task = %self.name, agent = agent.name(), "not targeted, skipping");
            return Ok(false);
        }
        if self.verbose {
            tracing::info!(task = %self.name, agent = agent.name(), "calling task");
        }
        (self.procedure)(AgentRef::clone(agent))
            .await
            .map_err(|source| TaskError::Failed {
                task: self.name.clone(),
                agent: agent.name().to_string(),
                source,
            })?;
        Ok(true)
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>16}:\t{}", self.name, self.description)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("depends_on", &self.depends_on)
            .field("limit", &self.limit)
            .field("background", &self.background)
            .finish_non_exhaustive()
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

/// Keyword-style task declaration, applied to a procedure with
/// [`TaskBuilder::register`].
#[derive(Debug, Clone, Default)]
pub struct TaskBuilder {
    name: String,
    description: String,
    depends_on: Vec<String>,
    limit: Vec<String>,
    background: bool,
    verbose: bool,
}

impl TaskBuilder {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// `"agent.task"` or bare `"task"` entries.
    #[must_use]
    pub fn depends_on<S: AsRef<str>>(mut self, deps: &[S]) -> Self {
        self.depends_on = deps.iter().map(|d| d.as_ref().to_string()).collect();
        self
    }

    #[must_use]
    pub fn limit<S: AsRef<str>>(mut self, targets: &[S]) -> Self {
        self.limit = targets.iter().map(|t| t.as_ref().to_string()).collect();
        self
    }

    #[must_use]
    pub fn background(mut self, background: bool) -> Self {
        self.background = background;
        self
    }

    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Builds the task without registering it.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::InvalidName`] or [`TaskError::InvalidDependency`].
    pub fn build(self, procedure: Procedure) -> Result<Task, TaskError> {
        validate_name(&self.name).map_err(|_| TaskError::InvalidName(self.name.clone()))?;
        Ok(Task {
            depends_on: Dependency::parse_all(&self.depends_on)?,
            name: self.name,
            description: self.description,
            limit: self.limit,
            background: self.background,
            verbose: self.verbose,
            procedure,
        })
    }

    /// Builds the task around `f` and registers it.
    ///
    /// # Errors
    ///
    /// Fails on a malformed declaration or a duplicate task name.
    pub fn register<F, Fut>(self, registry: &mut TaskRegistry, f: F) -> Result<Arc<Task>, TaskError>
    where
        F: Fn(AgentRef) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        registry.add(self.build(procedure(f))?)
    }
}

/// First paragraph of a doc comment, as one line.
#[doc(hidden)]
#[must_use]
pub fn doc_summary(lines: &[&str]) -> String {
    lines
        .iter()
        .map(|l| l.trim())
        .skip_while(|l| l.is_empty())
        .take_while(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Registers an async function as a task named after the function.
///
/// Given a function name, keyword arguments configure the builder. Given the
/// function itself, its doc comment becomes the task description and an
/// optional `#[task(...)]` line carries the keywords.
///
/// ```ignore
/// async fn uptime(agent: AgentRef) -> anyhow::Result<()> { /* ... */ }
///
/// task!(&mut tasks, uptime)?;
/// task!(&mut tasks, deploy, depends_on = &["build"], limit = &["web"])?;
/// task!(
///     &mut tasks,
///     /// Restarts the web tier.
///     #[task(depends_on = &["deploy"])]
///     async fn restart(agent: AgentRef) -> anyhow::Result<()> { /* ... */ }
/// )?;
/// ```
#[macro_export]
macro_rules! task {
    (
        $registry:expr,
        $(#[doc = $doc:literal])*
        $(#[task($($key:ident = $value:expr),* $(,)?)])?
        async fn $proc:ident($agent:ident: $agent_ty:ty) -> $ret:ty $body:block
    ) => {{
        $(#[doc = $doc])*
        async fn $proc($agent: $agent_ty) -> $ret $body
        $crate::application::services::task::TaskBuilder::new(stringify!($proc))
            .description(&$crate::application::services::task::doc_summary(&[$($doc),*]))
            $($(.$key($value))*)?
            .register($registry, $proc)
    }};
    ($registry:expr, $proc:ident $(,)?) => {
        $crate::application::services::task::TaskBuilder::new(stringify!($proc))
            .register($registry, $proc)
    };
    ($registry:expr, $proc:ident, $($key:ident = $value:expr),+ $(,)?) => {
        $crate::application::services::task::TaskBuilder::new(stringify!($proc))
            $(.$key($value))+
            .register($registry, $proc)
    };
}

// ── Registry ──────────────────────────────────────────────────────────────────

/// Process-wide tasks, keyed by name, in registration order.
pub struct TaskRegistry {
    inner: Registry<String, Arc<Task>>,
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Registry::new("task"),
        }
    }

    /// # Errors
    ///
    /// Returns [`TaskError::Registry`] if the name is already taken.
    pub fn add(&mut self, task: Task) -> Result<Arc<Task>, TaskError> {
        let task = Arc::new(task);
        self.inner.add(task.name.clone(), Arc::clone(&task))?;
        Ok(task)
    }

    /// Registers `procedure` under `name` with no dependencies or limit.
    ///
    /// # Errors
    ///
    /// Fails on an invalid or duplicate name.
    pub fn task(&mut self, name: &str, procedure: Procedure) -> Result<Arc<Task>, TaskError> {
        self.add(TaskBuilder::new(name).build(procedure)?)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<Task>> {
        self.inner.get(name)
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        self.inner.names()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Task>> {
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

    /// Dispatch entrypoint: calls task `name` with `agent`. An unknown task
    /// is a no-op returning `false`.
    ///
    /// # Errors
    ///
    /// Propagates [`Task::call`] failures.
    pub async fn call(
        &self,
        name: &str,
        agent: &AgentRef,
        agents: &AgentRegistry,
    ) -> Result<bool, TaskError> {
        match self.inner.get(name) {
            Some(task) => task.call(agent, agents).await,
            None => {
                tracing::debug!(task = name, "no such task");
                Ok(false)
            }
        }
    }
}
