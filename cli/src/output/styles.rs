//! Colors for summaries and tag markers. Everything is plain until
//! [`Styles::colorize`] runs.

use owo_colors::Style;

use crate::domain::Tag;

/// One `owo_colors` style per kind of text.
#[derive(Default, Clone)]
pub struct Styles {
    /// Success messages (green)
    pub success: Style,
    /// Warning messages (yellow)
    pub warning: Style,
    /// Error messages and the `!!!` channel (red)
    pub error: Style,
    /// Dimmed/secondary text, and the `<<<` channel
    pub dim: Style,
    /// Bold text
    pub bold: Style,
    /// Headers/section titles
    pub header: Style,
    /// The `>>>` channel
    pub input: Style,
    /// The `???` channel
    pub status: Style,
}

impl Styles {
    /// Apply colors to the stylesheet.
    pub fn colorize(&mut self) {
        self.success = Style::new().green();
        self.warning = Style::new().yellow();
        self.error = Style::new().red();
        self.dim = Style::new().dimmed();
        self.bold = Style::new().bold();
        self.header = Style::new().bold().cyan();
        self.input = Style::new().cyan();
        self.status = Style::new().magenta();
    }

    /// Style of a tag marker.
    #[must_use]
    pub fn tag(&self, tag: Tag) -> Style {
        match tag {
            Tag::Input => self.input,
            Tag::Output => self.dim,
            Tag::Error => self.error,
            Tag::Return => self.status,
        }
    }
}
