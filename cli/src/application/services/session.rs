//! A live command session: one child process with piped stdio.
//!
//! Stdout and stderr are drained by background readers from the moment the
//! process starts, so a chatty command can never block the writes that feed
//! it. Every write and the final [`Session::collect`] share one deadline,
//! counted from when the session was opened.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::domain::AgentError;

type Reader = JoinHandle<std::io::Result<Vec<u8>>>;

/// Everything a session produced once its input was closed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

/// Handle describing a connected session, as returned by `flatten`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SessionHandle {
    /// Agent owning the session.
    pub agent: String,
    /// OS process id, if the process is still known to the OS.
    pub pid: Option<u32>,
}

/// Owns the child process behind an agent.
pub struct Session {
    agent: String,
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: Option<Reader>,
    stderr: Option<Reader>,
    deadline: Option<(Instant, Duration)>,
    finished: Option<SessionOutput>,
}

impl Session {
    /// Takes over `child` on behalf of `agent`. Must be called inside a tokio
    /// runtime: the output readers are spawned here. `timeout` bounds the
    /// whole session; `None` waits forever.
    #[must_use]
    pub fn new(agent: &str, mut child: Child, timeout: Option<Duration>) -> Self {
        let stdin = child.stdin.take();
        let stdout = child.stdout.take().map(read_all);
        let stderr = child.stderr.take().map(read_all);
        Self {
            agent: agent.to_string(),
            child,
            stdin,
            stdout,
            stderr,
            deadline: timeout.map(|limit| (Instant::now() + limit, limit)),
            finished: None,
        }
    }

    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    /// Writes `line` followed by a newline and flushes.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Transmit`] if the input pipe is closed or broken,
    /// and [`AgentError::Timeout`] (after killing the process) if the write is
    /// still blocked when the deadline passes.
    pub async fn send_line(&mut self, line: &str) -> Result<(), AgentError> {
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(AgentError::Transmit {
                agent: self.agent.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "session input is closed",
                ),
            });
        };
        let write = async {
            stdin.write_all(line.as_bytes()).await?;
            stdin.write_all(b"\n").await?;
            stdin.flush().await
        };
        let written = match self.deadline {
            Some((at, _)) => tokio::time::timeout_at(at, write).await.ok(),
            None => Some(write.await),
        };
        match written {
            Some(result) => result.map_err(|source| AgentError::Transmit {
                agent: self.agent.clone(),
                source,
            }),
            None => Err(self.expire().await),
        }
    }

    /// Closes the input pipe; the interpreter sees end-of-file.
    pub fn close_input(&mut self) {
        self.stdin = None;
    }

    /// Closes input, then waits for exit and for both output readers.
    ///
    /// A session that was already collected returns its exit code with empty
    /// output.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Timeout`] (after killing the process) when the
    /// deadline passes first, [`AgentError::Receive`] if an output pipe
    /// fails, and [`AgentError::Connection`] if waiting on the process fails.
    pub async fn collect(&mut self) -> Result<SessionOutput, AgentError> {
        if let Some(done) = &self.finished {
            return Ok(SessionOutput {
                exit_code: done.exit_code,
                ..SessionOutput::default()
            });
        }
        self.close_input();

        let deadline = self.deadline;
        let (child, stdout, stderr) = (&mut self.child, &mut self.stdout, &mut self.stderr);
        let drain = async {
            tokio::join!(
                child.wait(),
                join_reader(stdout.as_mut()),
                join_reader(stderr.as_mut()),
            )
        };
        let drained = match deadline {
            Some((at, _)) => tokio::time::timeout_at(at, drain).await.ok(),
            None => Some(drain.await),
        };
        let Some((status, stdout, stderr)) = drained else {
            return Err(self.expire().await);
        };
        self.stdout = None;
        self.stderr = None;

        let status = status.map_err(|source| AgentError::Connection {
            agent: self.agent.clone(),
            source,
        })?;
        let receive = |source| AgentError::Receive {
            agent: self.agent.clone(),
            source,
        };
        let output = SessionOutput {
            stdout: String::from_utf8_lossy(&stdout.map_err(receive)?).into_owned(),
            stderr: String::from_utf8_lossy(&stderr.map_err(receive)?).into_owned(),
            exit_code: status.code(),
        };
        self.finished = Some(output.clone());
        Ok(output)
    }

    /// Kills the process after a missed deadline and builds the error.
    async fn expire(&mut self) -> AgentError {
        let limit = self.deadline.map(|(_, limit)| limit).unwrap_or_default();
        // An error here means the process already exited.
        if let Err(e) = self.child.kill().await {
            tracing::debug!(agent = %self.agent, error = %e, "kill after deadline failed");
        }
        self.stdin = None;
        tracing::warn!(agent = %self.agent, ?limit, "session deadline expired, process killed");
        AgentError::Timeout {
            agent: self.agent.clone(),
            limit,
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // Readers would otherwise outlive the session when a grandchild keeps
        // the pipe open.
        for reader in [self.stdout.take(), self.stderr.take()].into_iter().flatten() {
            reader.abort();
        }
    }
}

fn read_all<R>(mut pipe: R) -> Reader
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf).await?;
        Ok(buf)
    })
}

async fn join_reader(reader: Option<&mut Reader>) -> std::io::Result<Vec<u8>> {
    match reader {
        Some(handle) => handle.await.map_err(std::io::Error::other)?,
        None => Ok(Vec::new()),
    }
}

/// Groups stderr text into messages: consecutive non-blank lines form one
/// message, blank lines separate messages.
#[must_use]
pub fn stderr_messages(stderr: &str) -> Vec<String> {
    let mut messages = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in stderr.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                messages.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        messages.push(current.join("\n"));
    }
    messages
}
