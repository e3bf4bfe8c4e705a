//! `TerminalTagSink`: presentation-layer implementation of `TagSink`.

use std::io::Write as _;

use owo_colors::OwoColorize as _;

use crate::application::ports::TagSink;
use crate::domain::Tag;
use crate::domain::tag::NAME_WIDTH;
use crate::output::{OutputContext, Styles};

/// Prints the tag protocol to stdout, one line per message line:
/// `"{agent:<8} {tag} {line}"`.
///
/// Each message is written under a single stdout lock so lines from agents
/// running concurrently never interleave mid-line.
#[derive(Clone, Default)]
pub struct TerminalTagSink {
    styles: Styles,
}

impl TerminalTagSink {
    #[must_use]
    pub fn new(ctx: &OutputContext) -> Self {
        Self {
            styles: ctx.styles.clone(),
        }
    }

    /// Formats one line. Equals [`crate::domain::tag::format_line`] when
    /// colors are off.
    #[must_use]
    pub fn render_line(&self, agent: &str, tag: Tag, line: &str) -> String {
        let name = format!("{agent:<NAME_WIDTH$}");
        format!(
            "{} {} {line}",
            name.style(self.styles.bold),
            tag.marker().style(self.styles.tag(tag))
        )
    }
}

impl TagSink for TerminalTagSink {
    fn emit(&self, agent: &str, tag: Tag, message: &str) {
        let mut out = std::io::stdout().lock();
        let lines: Vec<&str> = if message.is_empty() {
            vec![""]
        } else {
            message.lines().collect()
        };
        for line in lines {
            // stdout closed (e.g. piped into `head`): nothing left to report to
            if writeln!(out, "{}", self.render_line(agent, tag, line)).is_err() {
                return;
            }
        }
    }
}
