//! Process panes and the terminal-emulation seam they draw through.

use std::io::{self, Write};

/// Screen rectangle in cells, zero based.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Area {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

/// Cursor of a virtual terminal, relative to its own area.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    pub row: u16,
    pub col: u16,
    pub visible: bool,
}

/// A process's emulated terminal: scrollback, cursor and selection live on
/// the other side of this trait.
pub trait VirtualTerminal {
    /// Paint the terminal's visible content into `area`.
    fn draw(&mut self, out: &mut dyn Write, area: Area) -> io::Result<()>;
    fn cursor(&self) -> Cursor;
    fn has_selection(&self) -> bool;
    fn is_scrolling(&self) -> bool;
    fn scroll_reset(&mut self);
}

/// One managed process's slot in the sidebar.
#[derive(Debug, Clone)]
pub struct Pane<V> {
    /// Stable identity, survives restarts and re-sorting.
    pub key: String,
    pub title: String,
    pub icon: String,
    /// The user may stop and restart the process.
    pub killable: bool,
    pub dead: bool,
    pub vt: V,
}

impl<V> Pane<V> {
    pub fn new(key: impl Into<String>, title: impl Into<String>, icon: impl Into<String>, vt: V) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            icon: icon.into(),
            killable: false,
            dead: false,
            vt,
        }
    }

    pub fn killable(mut self, killable: bool) -> Self {
        self.killable = killable;
        self
    }
}
