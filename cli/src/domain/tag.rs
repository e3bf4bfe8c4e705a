//! Console tag protocol.
//!
//! Every line an agent reports is prefixed with the agent name, left-justified
//! to eight columns, and a three-character channel tag.

use std::fmt;

use serde::Serialize;

/// Width of the agent-name field.
pub const NAME_WIDTH: usize = 8;

/// Channel a reported line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tag {
    /// Command sent to the session.
    Input,
    /// Line read from the session's stdout.
    Output,
    /// Grouped message read from the session's stderr.
    Error,
    /// Exit status of a command or session.
    Return,
}

impl Tag {
    #[must_use]
    pub fn marker(self) -> &'static str {
        match self {
            Self::Input => ">>>",
            Self::Output => "<<<",
            Self::Error => "!!!",
            Self::Return => "???",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

/// Formats one tagged line: `"{name:<8} {tag} {data}"`.
#[must_use]
pub fn format_line(agent: &str, tag: Tag, data: &str) -> String {
    format!("{agent:<NAME_WIDTH$} {tag} {data}")
}
