//! Infrastructure implementation of the `Connector` port.

use std::process::Stdio;

use crate::application::ports::Connector;

/// Production `Connector`: spawns the session process with tokio, every stdio
/// stream piped.
///
/// `kill_on_drop(true)` ties the OS process to the `Child` handle, so
/// discarding a session on `reset` or after a deadline never leaks it.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioConnector;

impl Connector for TokioConnector {
    fn spawn(&self, program: &str, args: &[String]) -> std::io::Result<tokio::process::Child> {
        tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
    }
}

/// Hostname of the controlling machine, used for `<(local)>`.
#[must_use]
pub fn local_hostname() -> String {
    gethostname::gethostname().to_string_lossy().into_owned()
}
