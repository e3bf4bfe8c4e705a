//! Buffered-mode wire protocol.
//!
//! Each queued command is bracketed by an echo of the command and an echo of
//! its exit status:
//!
//! ```text
//! echo '>>>' 'whoami'
//! whoami
//! echo --- $?
//! ```
//!
//! The combined stdout of the batch is then split on lines starting with
//! `---` to attribute each chunk of output to the command that produced it.

use serde::Serialize;

/// Prefix of the exit-status line that closes each command's output.
pub const RETURN_SENTINEL: &str = "---";

/// Prefix the echo line writes before the command text.
pub const INPUT_SENTINEL: &str = ">>>";

/// Output and exit status recovered for one buffered command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOutcome {
    pub command: String,
    pub output: Vec<String>,
    pub exit_code: Option<i32>,
}

/// Quotes `s` for a POSIX shell so it is passed as one literal word.
#[must_use]
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Wraps a command in the echo sentinels. The result spans three lines and
/// carries no trailing newline.
#[must_use]
pub fn wrap(command: &str) -> String {
    format!(
        "echo '{INPUT_SENTINEL}' {}\n{command}\necho {RETURN_SENTINEL} $?",
        shell_quote(command)
    )
}

/// Splits the combined stdout of a buffered batch into per-command chunks.
///
/// Chunks are matched to `commands` in order. A leading `>>> …` echo line is
/// dropped from each chunk. Output after the last sentinel, or for commands
/// that never reached their sentinel (the shell exited early), is attributed
/// to the next command in line with no exit status.
#[must_use]
pub fn split(commands: &[String], output: &str) -> Vec<CommandOutcome> {
    let mut outcomes = Vec::with_capacity(commands.len());
    let mut chunk: Vec<String> = Vec::new();
    let mut pending = commands.iter();

    for line in output.lines() {
        if let Some(rest) = line.strip_prefix(RETURN_SENTINEL) {
            let Some(command) = pending.next() else {
                chunk.push(line.to_string());
                continue;
            };
            outcomes.push(CommandOutcome {
                command: command.clone(),
                output: strip_echo(std::mem::take(&mut chunk)),
                exit_code: rest.trim().parse().ok(),
            });
        } else {
            chunk.push(line.to_string());
        }
    }

    let mut leftover = Some(chunk);
    for command in pending {
        outcomes.push(CommandOutcome {
            command: command.clone(),
            output: strip_echo(leftover.take().unwrap_or_default()),
            exit_code: None,
        });
    }
    if let (Some(rest), Some(last)) = (leftover.filter(|c| !c.is_empty()), outcomes.last_mut()) {
        last.output.extend(rest);
    }
    outcomes
}

fn strip_echo(mut chunk: Vec<String>) -> Vec<String> {
    if chunk
        .first()
        .is_some_and(|l| l == INPUT_SENTINEL || l.starts_with(&format!("{INPUT_SENTINEL} ")))
    {
        chunk.remove(0);
    }
    chunk
}
