//! Formatting configuration threaded through the renderers.

use crossterm::style::{Color, Stylize, style};

/// Spinner animation frames (braille "mini dot").
pub const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Marker appended to lines cut at the terminal width.
pub const ELLIPSIS: &str = "…";

/// Rule drawn between live and dead panes in the sidebar.
pub const SEPARATOR: &str = "──────────────────────";

/// Text styles. Passed by value into every render call; with `color`
/// disabled all styles are identity so frames stay plain text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub color: bool,
}

impl Default for Theme {
    fn default() -> Self {
        Self { color: true }
    }
}

impl Theme {
    pub fn plain() -> Self {
        Self { color: false }
    }

    pub fn spinner(self, frame: usize) -> &'static str {
        SPINNER_FRAMES[frame % SPINNER_FRAMES.len()]
    }

    pub fn dim(self, text: &str) -> String {
        self.paint(text, |t| style(t).with(Color::DarkGrey).to_string())
    }

    pub fn dim_bold(self, text: &str) -> String {
        self.paint(text, |t| style(t).with(Color::DarkGrey).bold().to_string())
    }

    pub fn bold(self, text: &str) -> String {
        self.paint(text, |t| style(t).bold().to_string())
    }

    /// Selected pane while the sidebar, not the pane, has focus.
    pub fn highlight(self, text: &str) -> String {
        self.paint(text, |t| style(t).with(Color::AnsiValue(208)).bold().to_string())
    }

    fn paint(self, text: &str, apply: impl FnOnce(&str) -> String) -> String {
        if self.color && !text.is_empty() {
            apply(text)
        } else {
            text.to_string()
        }
    }
}
