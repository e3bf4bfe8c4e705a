//! Terminal rendering: tagged session lines and command summaries.

pub mod human;
pub mod json;
pub mod styles;
pub mod tags;

use console::Term;
use owo_colors::OwoColorize as _;
pub use styles::Styles;
pub use tags::TerminalTagSink;

/// Styling and verbosity shared by the renderers.
pub struct OutputContext {
    pub styles: Styles,
    /// Mutes summaries. Tagged session lines follow their own quiet flag.
    pub quiet: bool,
}

impl OutputContext {
    #[must_use]
    pub fn new(no_color: bool, quiet: bool) -> Self {
        let mut styles = Styles::default();
        if colors_enabled(no_color) {
            styles.colorize();
        }
        Self { styles, quiet }
    }

    /// An agent or step that finished with status 0.
    pub fn passed(&self, label: &str) {
        if !self.quiet {
            println!("  {} {label}", "✓".style(self.styles.success));
        }
    }

    /// An agent or step whose interpreter exited non-zero.
    pub fn exited(&self, label: &str, code: i32) {
        if !self.quiet {
            println!("  {} {label}: exit {code}", "⚠".style(self.styles.warning));
        }
    }

    pub fn section(&self, title: &str) {
        if !self.quiet {
            println!("  {}", title.style(self.styles.header));
        }
    }

    /// `name  value`, with the name dimmed.
    pub fn field(&self, name: &str, value: &str) {
        if !self.quiet {
            println!("  {}  {value}", name.style(self.styles.dim));
        }
    }
}

/// Colors need a terminal on stdout and neither `--no-color` nor `NO_COLOR`.
fn colors_enabled(no_color: bool) -> bool {
    !no_color && std::env::var_os("NO_COLOR").is_none() && Term::stdout().is_term()
}
