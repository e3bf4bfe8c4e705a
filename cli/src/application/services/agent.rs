//! Agents: named execution targets and their session lifecycle.
//!
//! An [`Agent`] is either a leaf (local shell, remote shell, or an unbound
//! placeholder with no connection strategy) or a group of other agents. All
//! operations take `&self`; a leaf keeps its session and buffers behind a
//! `tokio::sync::Mutex`, so agents are shared as [`AgentRef`] between the
//! registry, groups and spawned fan-out tasks.
//!
//! Lifecycle of one batch on a leaf:
//!
//! ```text
//! shell()* ──► end() ──► flush() ──► reset()
//!   │ lazily connects       │ drains output, reports exit status
//!   └ immediate: writes now / buffered: queues behind sentinels
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::application::ports::{Connector, TagSink, Wiring};
use crate::application::services::group::AgentGroup;
use crate::application::services::session::{Session, SessionHandle, stderr_messages};
use crate::domain::config::{DEFAULT_SHELL, DEFAULT_SSH, DEFAULT_SSH_PORT};
use crate::domain::{
    AgentError, Attributes, CommandOutcome, Tag, TransmitMode, sentinel, template, validate_name,
};

/// Shared handle to an agent.
pub type AgentRef = Arc<Agent>;

/// Termination command written by `end`.
const EXIT_COMMAND: &str = "exit";

// ── Value types ───────────────────────────────────────────────────────────────

/// One step of a batch passed to [`Agent::serialize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Connect,
    Shell(String),
    /// Transmit queued buffered commands without closing the session.
    Execute,
    End,
}

impl Operation {
    #[must_use]
    pub fn shell(command: impl Into<String>) -> Self {
        Self::Shell(command.into())
    }
}

/// What one leaf produced during `flush`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AgentReport {
    pub agent: String,
    /// Raw stdout lines, in order.
    pub stdout: Vec<String>,
    /// Grouped stderr messages.
    pub stderr: Vec<String>,
    /// Per-command attribution (buffered mode only).
    pub outcomes: Vec<CommandOutcome>,
    /// Session exit status; `None` if the session never started or was
    /// terminated by a signal.
    pub exit_code: Option<i32>,
}

/// Point-in-time view of a leaf's buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeafSnapshot {
    pub connected: bool,
    pub pending_commands: usize,
    pub buffered_output: usize,
    pub executed: bool,
}

/// "Any non-zero" policy: the first non-zero exit code wins, looking at each
/// report's per-command outcomes before its session status. `0` if anything
/// reported, otherwise `None`.
#[must_use]
pub fn aggregate_exit_code(reports: &[AgentReport]) -> Option<i32> {
    let mut seen = None;
    let codes = reports.iter().flat_map(|r| {
        r.outcomes
            .iter()
            .filter_map(|o| o.exit_code)
            .chain(r.exit_code)
    });
    for code in codes {
        if code != 0 {
            return Some(code);
        }
        seen = Some(0);
    }
    seen
}

// ── Endpoints ─────────────────────────────────────────────────────────────────

/// Parameters of a remote shell session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub flags: Vec<String>,
    /// Hostname of the controlling machine, exposed as `<(local)>`.
    pub local_hostname: String,
    /// Remote-shell client program.
    pub client: String,
}

/// How a leaf opens its session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// A local command interpreter.
    Local { shell: String },
    Remote(RemoteTarget),
    /// No connection strategy; connecting fails with
    /// [`AgentError::UnimplementedCapability`].
    Unbound,
}

impl Endpoint {
    /// Program and arguments to spawn, if this endpoint can connect.
    #[must_use]
    pub fn command_line(&self) -> Option<(String, Vec<String>)> {
        match self {
            Self::Local { shell } => Some((shell.clone(), Vec::new())),
            Self::Remote(r) => {
                let mut args = r.flags.clone();
                args.extend([
                    r.host.clone(),
                    "-p".to_string(),
                    r.port.to_string(),
                    "-l".to_string(),
                    r.user.clone(),
                ]);
                Some((r.client.clone(), args))
            }
            Self::Unbound => None,
        }
    }
}

// ── Leaf ──────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct LeafState {
    session: Option<Session>,
    /// Commands queued in buffered mode, already templated.
    command_buffer: Vec<String>,
    /// Stdout lines captured by the last flush.
    output_buffer: Vec<String>,
    executed: bool,
}

/// A single execution target owning at most one session.
pub struct Leaf {
    endpoint: Endpoint,
    id: u32,
    start_path: String,
    mode: TransmitMode,
    timeout: Option<Duration>,
    connector: Arc<dyn Connector>,
    sink: Arc<dyn TagSink>,
    state: Mutex<LeafState>,
}

impl Leaf {
    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    #[must_use]
    pub fn mode(&self) -> TransmitMode {
        self.mode
    }

    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

// ── Agent ─────────────────────────────────────────────────────────────────────

/// Leaf or composite execution target.
pub enum AgentKind {
    Leaf(Leaf),
    Group(AgentGroup),
}

/// A named execution target.
pub struct Agent {
    name: String,
    description: String,
    dry_run: bool,
    kind: AgentKind,
}

impl Agent {
    /// Starts building a leaf that runs a local command interpreter.
    #[must_use]
    pub fn local(name: &str) -> AgentBuilder {
        AgentBuilder::new(
            name,
            Endpoint::Local {
                shell: DEFAULT_SHELL.to_string(),
            },
        )
    }

    /// Starts building a leaf reached over a remote shell.
    #[must_use]
    pub fn remote(name: &str, user: &str, host: &str) -> AgentBuilder {
        AgentBuilder::new(
            name,
            Endpoint::Remote(RemoteTarget {
                host: host.to_string(),
                port: DEFAULT_SSH_PORT,
                user: user.to_string(),
                flags: Vec::new(),
                local_hostname: String::new(),
                client: DEFAULT_SSH.to_string(),
            }),
        )
    }

    /// Starts building a leaf without a connection strategy.
    #[must_use]
    pub fn unbound(name: &str) -> AgentBuilder {
        AgentBuilder::new(name, Endpoint::Unbound)
    }

    /// Creates an empty group.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidName`] if `name` is not a valid name.
    pub fn group(name: &str, description: &str, dry_run: bool) -> Result<AgentRef, AgentError> {
        validate_name(name).map_err(|_| AgentError::InvalidName(name.to_string()))?;
        Ok(Arc::new(Self {
            name: name.to_string(),
            description: description.to_string(),
            dry_run,
            kind: AgentKind::Group(AgentGroup::default()),
        }))
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
    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    #[must_use]
    pub fn kind(&self) -> &AgentKind {
        &self.kind
    }

    #[must_use]
    pub fn is_group(&self) -> bool {
        matches!(self.kind, AgentKind::Group(_))
    }

    #[must_use]
    pub fn as_group(&self) -> Option<&AgentGroup> {
        match &self.kind {
            AgentKind::Group(g) => Some(g),
            AgentKind::Leaf(_) => None,
        }
    }

    #[must_use]
    pub fn as_leaf(&self) -> Option<&Leaf> {
        match &self.kind {
            AgentKind::Leaf(l) => Some(l),
            AgentKind::Group(_) => None,
        }
    }

    /// Template attributes: `name`, `desc`, `id`, `startPath`, plus `host`,
    /// `port`, `user` and `local` for remote agents. `start_path` and
    /// `localHostname` are accepted as aliases. Groups expose only `name` and
    /// `desc`.
    #[must_use]
    pub fn attributes(&self) -> Attributes {
        let mut attrs = Attributes::new()
            .with("name", &self.name)
            .with("desc", &self.description);
        if let AgentKind::Leaf(leaf) = &self.kind {
            attrs.insert("id", leaf.id);
            attrs.insert("startPath", &leaf.start_path);
            attrs.insert("start_path", &leaf.start_path);
            if let Endpoint::Remote(r) = &leaf.endpoint {
                attrs.insert("host", &r.host);
                attrs.insert("port", r.port);
                attrs.insert("user", &r.user);
                attrs.insert("local", &r.local_hostname);
                attrs.insert("localHostname", &r.local_hostname);
            }
        }
        attrs
    }

    // ── Composite queries ────────────────────────────────────────────────────

    /// Adds `member` to this group. Re-adding a name already present is a
    /// silent no-op and returns `Ok(false)`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::NotAGroup`] on a leaf and [`AgentError::Cycle`]
    /// if `member` is this group or (transitively) contains it.
    pub fn add(&self, member: AgentRef) -> Result<bool, AgentError> {
        let group = self
            .as_group()
            .ok_or_else(|| AgentError::NotAGroup(self.name.clone()))?;
        if member.name == self.name || member.contains(&self.name) {
            return Err(AgentError::Cycle {
                group: self.name.clone(),
                member: member.name.clone(),
            });
        }
        Ok(group.insert(member))
    }

    /// Whether `name` is a direct or nested member of this agent.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.as_group().is_some_and(|g| {
            g.members()
                .iter()
                .any(|m| m.name == name || m.contains(name))
        })
    }

    /// The leaves reached from this agent, in registration order, each paired
    /// with the dry-run flag inherited from the groups above it. A leaf
    /// reached through several paths appears once, at its first position.
    #[must_use]
    pub fn leaves(&self) -> Vec<(AgentRef, bool)> {
        let mut out: Vec<(AgentRef, bool)> = Vec::new();
        if let AgentKind::Group(g) = &self.kind {
            g.collect_leaves(self.dry_run, &mut out);
        }
        out
    }

    /// Names this agent expands to when used as a task `limit` entry: itself
    /// plus, for a group, every nested member (groups and leaves).
    #[must_use]
    pub fn expand_names(&self) -> Vec<String> {
        let mut names = vec![self.name.clone()];
        if let AgentKind::Group(g) = &self.kind {
            g.collect_names(&mut names);
        }
        names
    }

    /// Session handles in flattened order: a singleton for a connected leaf,
    /// nothing for an unconnected one, and the concatenation over members for
    /// a group.
    pub async fn flatten(&self) -> Vec<SessionHandle> {
        match &self.kind {
            AgentKind::Leaf(_) => self.leaf_handle().await.into_iter().collect(),
            AgentKind::Group(_) => {
                let mut out = Vec::new();
                for (leaf, _) in self.leaves() {
                    out.extend(leaf.leaf_handle().await);
                }
                out
            }
        }
    }

    async fn leaf_handle(&self) -> Option<SessionHandle> {
        let leaf = self.as_leaf()?;
        let state = leaf.state.lock().await;
        state.session.as_ref().map(|s| SessionHandle {
            agent: self.name.clone(),
            pid: s.pid(),
        })
    }

    /// Buffer state of a leaf; `None` for groups.
    pub async fn snapshot(&self) -> Option<LeafSnapshot> {
        let leaf = self.as_leaf()?;
        let state = leaf.state.lock().await;
        Some(LeafSnapshot {
            connected: state.session.is_some(),
            pending_commands: state.command_buffer.len(),
            buffered_output: state.output_buffer.len(),
            executed: state.executed,
        })
    }

    // ── Capability set ───────────────────────────────────────────────────────

    /// Opens the session (for a group: every member's session, concurrently).
    /// Idempotent while a session is live. A dry-run agent never connects.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::UnimplementedCapability`] for an unbound leaf and
    /// [`AgentError::Connection`] if the process cannot be spawned.
    pub async fn connect(self: &Arc<Self>) -> Result<(), AgentError> {
        match &self.kind {
            AgentKind::Leaf(_) => self.leaf_connect(false).await,
            AgentKind::Group(_) => {
                AgentGroup::fan_out(self, |leaf, dry| async move {
                    leaf.leaf_connect(dry).await.map(|()| Vec::new())
                })
                .await
                .map(|_| ())
            }
        }
    }

    /// Sends `command` after `<(attr)>` substitution, connecting first if
    /// needed. Groups substitute per leaf and fan out concurrently.
    ///
    /// # Errors
    ///
    /// Propagates connection failures and [`AgentError::Transmit`] when the
    /// session rejects the write.
    pub async fn shell(self: &Arc<Self>, command: &str, quiet: bool) -> Result<(), AgentError> {
        match &self.kind {
            AgentKind::Leaf(_) => self.leaf_shell(command, quiet, false).await,
            AgentKind::Group(_) => {
                let command: Arc<str> = Arc::from(command);
                AgentGroup::fan_out(self, move |leaf, dry| {
                    let command = Arc::clone(&command);
                    async move {
                        leaf.leaf_shell(&command, quiet, dry)
                            .await
                            .map(|()| Vec::new())
                    }
                })
                .await
                .map(|_| ())
            }
        }
    }

    /// Transmits queued buffered commands. No-op in immediate mode, when
    /// nothing is queued, or when the batch was already executed.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Transmit`] if the session rejects the block.
    pub async fn execute(self: &Arc<Self>) -> Result<(), AgentError> {
        match &self.kind {
            AgentKind::Leaf(_) => self.leaf_execute().await,
            AgentKind::Group(_) => AgentGroup::fan_out(self, |leaf, _| async move {
                leaf.leaf_execute().await.map(|()| Vec::new())
            })
            .await
            .map(|_| ()),
        }
    }

    /// Asks the session to terminate cleanly. Does not kill the process.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Transmit`] if the session rejects the write for
    /// any reason other than having already closed its input.
    pub async fn end(self: &Arc<Self>, quiet: bool) -> Result<(), AgentError> {
        match &self.kind {
            AgentKind::Leaf(_) => self.leaf_end(quiet).await,
            AgentKind::Group(_) => AgentGroup::fan_out(self, move |leaf, _| async move {
                leaf.leaf_end(quiet).await.map(|()| Vec::new())
            })
            .await
            .map(|_| ()),
        }
    }

    /// Drains session output, reports it through the tag channels and returns
    /// one report per leaf, in flattened order. `quiet` mutes the output
    /// channel; errors and exit codes are always reported.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Timeout`] if a session outlives its deadline.
    pub async fn flush(self: &Arc<Self>, quiet: bool) -> Result<Vec<AgentReport>, AgentError> {
        match &self.kind {
            AgentKind::Leaf(_) => self.leaf_flush(quiet).await.map(|r| vec![r]),
            AgentKind::Group(_) => {
                AgentGroup::fan_out(self, move |leaf, _| async move {
                    leaf.leaf_flush(quiet).await.map(|r| vec![r])
                })
                .await
            }
        }
    }

    /// Clears buffers and the executed flag and discards the session. Does not
    /// call `end`; a discarded process is killed when dropped.
    pub async fn reset(&self) {
        match &self.kind {
            AgentKind::Leaf(_) => self.leaf_reset().await,
            AgentKind::Group(_) => {
                for (leaf, _) in self.leaves() {
                    leaf.leaf_reset().await;
                }
            }
        }
    }

    /// Runs one batch to completion: applies `ops` in order, then always
    /// `end`, `flush` and `reset`. For a group every leaf runs its whole
    /// sequence on its own task; all are joined before returning.
    ///
    /// # Errors
    ///
    /// Returns the first error raised; the agent is reset regardless.
    pub async fn serialize(
        self: &Arc<Self>,
        ops: &[Operation],
        quiet: bool,
    ) -> Result<Vec<AgentReport>, AgentError> {
        match &self.kind {
            AgentKind::Leaf(_) => self.leaf_serialize(ops, quiet, false).await,
            AgentKind::Group(_) => {
                let ops: Arc<[Operation]> = Arc::from(ops);
                AgentGroup::fan_out(self, move |leaf, dry| {
                    let ops = Arc::clone(&ops);
                    async move { leaf.leaf_serialize(&ops, quiet, dry).await }
                })
                .await
            }
        }
    }

    // ── Leaf implementation ──────────────────────────────────────────────────

    fn open_session(&self, leaf: &Leaf, state: &mut LeafState) -> Result<(), AgentError> {
        if state.session.is_some() {
            return Ok(());
        }
        let (program, args) = leaf
            .endpoint
            .command_line()
            .ok_or_else(|| AgentError::UnimplementedCapability(self.name.clone()))?;
        let child = leaf
            .connector
            .spawn(&program, &args)
            .map_err(|source| AgentError::Connection {
                agent: self.name.clone(),
                source,
            })?;
        tracing::debug!(agent = %self.name, %program, ?args, pid = ?child.id(), "session opened");
        state.session = Some(Session::new(&self.name, child, leaf.timeout));
        Ok(())
    }

    async fn leaf_connect(&self, inherited_dry: bool) -> Result<(), AgentError> {
        if self.dry_run || inherited_dry {
            tracing::debug!(agent = %self.name, "dry run, not connecting");
            return Ok(());
        }
        let Some(leaf) = self.as_leaf() else {
            return Ok(());
        };
        let mut state = leaf.state.lock().await;
        self.open_session(leaf, &mut state)
    }

    async fn leaf_shell(
        &self,
        command: &str,
        quiet: bool,
        inherited_dry: bool,
    ) -> Result<(), AgentError> {
        let Some(leaf) = self.as_leaf() else {
            return Ok(());
        };
        let dry = self.dry_run || inherited_dry;
        let mut state = leaf.state.lock().await;
        if !dry {
            self.open_session(leaf, &mut state)?;
        }

        let command = template::render(command, &self.attributes());
        if !quiet {
            leaf.sink.emit(&self.name, Tag::Input, &command);
        }
        if dry {
            return Ok(());
        }

        match leaf.mode {
            TransmitMode::Buffered => {
                state.command_buffer.push(command);
                Ok(())
            }
            TransmitMode::Immediate => {
                let Some(session) = state.session.as_mut() else {
                    return Ok(());
                };
                let sent = session.send_line(&command).await;
                discard_expired(&mut state, sent)
            }
        }
    }

    async fn leaf_execute(&self) -> Result<(), AgentError> {
        let Some(leaf) = self.as_leaf() else {
            return Ok(());
        };
        let mut state = leaf.state.lock().await;
        self.transmit_buffer(&mut state).await
    }

    async fn transmit_buffer(&self, state: &mut LeafState) -> Result<(), AgentError> {
        if state.executed || state.command_buffer.is_empty() {
            return Ok(());
        }
        let block = state
            .command_buffer
            .iter()
            .map(|c| sentinel::wrap(c))
            .collect::<Vec<_>>()
            .join("\n");
        let Some(session) = state.session.as_mut() else {
            return Ok(());
        };
        let sent = session.send_line(&block).await;
        discard_expired(state, sent)?;
        state.executed = true;
        Ok(())
    }

    async fn leaf_end(&self, quiet: bool) -> Result<(), AgentError> {
        let Some(leaf) = self.as_leaf() else {
            return Ok(());
        };
        let mut state = leaf.state.lock().await;
        if state.session.is_none() {
            return Ok(());
        }
        self.transmit_buffer(&mut state).await?;
        let Some(session) = state.session.as_mut() else {
            return Ok(());
        };
        if !quiet {
            tracing::debug!(agent = %self.name, "ending session");
        }
        match session.send_line(EXIT_COMMAND).await {
            // The interpreter already exited, e.g. after an explicit `exit`.
            Err(AgentError::Transmit { source, .. })
                if source.kind() == std::io::ErrorKind::BrokenPipe =>
            {
                Ok(())
            }
            sent => discard_expired(&mut state, sent),
        }
    }

    async fn leaf_flush(&self, quiet: bool) -> Result<AgentReport, AgentError> {
        let mut report = AgentReport {
            agent: self.name.clone(),
            ..AgentReport::default()
        };
        let Some(leaf) = self.as_leaf() else {
            return Ok(report);
        };
        let mut state = leaf.state.lock().await;
        if state.session.is_none() {
            return Ok(report);
        }
        self.transmit_buffer(&mut state).await?;

        let collected = match state.session.as_mut() {
            Some(session) => session.collect().await,
            None => return Ok(report),
        };
        let output = discard_expired(&mut state, collected)?;

        state.output_buffer = output.stdout.lines().map(str::to_string).collect();
        report.stdout.clone_from(&state.output_buffer);
        report.stderr = stderr_messages(&output.stderr);
        report.exit_code = output.exit_code;
        if leaf.mode == TransmitMode::Buffered && state.executed {
            report.outcomes = sentinel::split(&state.command_buffer, &output.stdout);
        }

        self.replay(&leaf.sink, &report, quiet);
        Ok(report)
    }

    /// Reports a flushed batch. `quiet` mutes the output channel only; errors
    /// and exit codes are always reported.
    fn replay(&self, sink: &Arc<dyn TagSink>, report: &AgentReport, quiet: bool) {
        if report.outcomes.is_empty() {
            for line in report.stdout.iter().filter(|_| !quiet) {
                sink.emit(&self.name, Tag::Output, line);
            }
        } else {
            for outcome in &report.outcomes {
                for line in outcome.output.iter().filter(|_| !quiet) {
                    sink.emit(&self.name, Tag::Output, line);
                }
                sink.emit(&self.name, Tag::Return, &format_code(outcome.exit_code));
            }
        }
        for message in &report.stderr {
            sink.emit(&self.name, Tag::Error, message);
        }
        sink.emit(&self.name, Tag::Return, &format_code(report.exit_code));
    }

    async fn leaf_reset(&self) {
        let Some(leaf) = self.as_leaf() else {
            return;
        };
        let mut state = leaf.state.lock().await;
        *state = LeafState::default();
        tracing::trace!(agent = %self.name, "reset");
    }

    async fn leaf_serialize(
        &self,
        ops: &[Operation],
        quiet: bool,
        inherited_dry: bool,
    ) -> Result<Vec<AgentReport>, AgentError> {
        let mut result = Ok(());
        for op in ops {
            result = match op {
                Operation::Connect => self.leaf_connect(inherited_dry).await,
                Operation::Shell(cmd) => self.leaf_shell(cmd, quiet, inherited_dry).await,
                Operation::Execute => self.leaf_execute().await,
                Operation::End => self.leaf_end(quiet).await,
            };
            if result.is_err() {
                break;
            }
        }
        let ended = self.leaf_end(quiet).await;
        let flushed = self.leaf_flush(quiet).await;
        self.leaf_reset().await;
        result?;
        ended?;
        flushed.map(|r| vec![r])
    }
}

/// Drops a session that was killed at its deadline so the next operation
/// reconnects instead of writing to a dead process.
fn discard_expired<T>(
    state: &mut LeafState,
    result: Result<T, AgentError>,
) -> Result<T, AgentError> {
    if matches!(result, Err(AgentError::Timeout { .. })) {
        state.session = None;
    }
    result
}

fn format_code(code: Option<i32>) -> String {
    code.map_or_else(|| "-".to_string(), |c| c.to_string())
}

impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            AgentKind::Leaf(_) => write!(f, "{:>16}:\t{}", self.name, self.description),
            AgentKind::Group(g) => {
                let names: Vec<String> = g.members().iter().map(|m| m.name.clone()).collect();
                write!(f, "{:>16}:\t{}", self.name, names.join(", "))
            }
        }
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("group", &self.is_group())
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

/// Configures a leaf agent before it is shared.
pub struct AgentBuilder {
    name: String,
    description: String,
    dry_run: bool,
    endpoint: Endpoint,
    id: u32,
    start_path: String,
    mode: TransmitMode,
    timeout: Option<Duration>,
}

impl AgentBuilder {
    fn new(name: &str, endpoint: Endpoint) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            dry_run: false,
            endpoint,
            id: 0,
            start_path: String::new(),
            mode: TransmitMode::default(),
            timeout: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    #[must_use]
    pub fn id(mut self, id: u32) -> Self {
        self.id = id;
        self
    }

    #[must_use]
    pub fn start_path(mut self, path: &str) -> Self {
        self.start_path = path.to_string();
        self
    }

    #[must_use]
    pub fn mode(mut self, mode: TransmitMode) -> Self {
        self.mode = mode;
        self
    }

    /// Session deadline; `None` waits forever.
    #[must_use]
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Interpreter for a local agent. Ignored for other kinds.
    #[must_use]
    pub fn shell(mut self, program: &str) -> Self {
        if let Endpoint::Local { shell } = &mut self.endpoint {
            *shell = program.to_string();
        }
        self
    }

    /// Remote-shell client program. Ignored for non-remote agents.
    #[must_use]
    pub fn client(mut self, program: &str) -> Self {
        if let Endpoint::Remote(r) = &mut self.endpoint {
            r.client = program.to_string();
        }
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        if let Endpoint::Remote(r) = &mut self.endpoint {
            r.port = port;
        }
        self
    }

    /// Extra client arguments placed before the host.
    #[must_use]
    pub fn flags<S: AsRef<str>>(mut self, flags: &[S]) -> Self {
        if let Endpoint::Remote(r) = &mut self.endpoint {
            r.flags = flags.iter().map(|f| f.as_ref().to_string()).collect();
        }
        self
    }

    /// Finishes the agent, taking its connector, sink and local hostname from
    /// `wiring`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidName`] if the name is not valid.
    pub fn build(mut self, wiring: &Wiring) -> Result<AgentRef, AgentError> {
        validate_name(&self.name).map_err(|_| AgentError::InvalidName(self.name.clone()))?;
        if let Endpoint::Remote(r) = &mut self.endpoint {
            r.local_hostname.clone_from(&wiring.local_hostname);
        }
        Ok(Arc::new(Agent {
            name: self.name,
            description: self.description,
            dry_run: self.dry_run,
            kind: AgentKind::Leaf(Leaf {
                endpoint: self.endpoint,
                id: self.id,
                start_path: self.start_path,
                mode: self.mode,
                timeout: self.timeout,
                connector: Arc::clone(&wiring.connector),
                sink: Arc::clone(&wiring.sink),
                state: Mutex::new(LeafState::default()),
            }),
        }))
    }
}
