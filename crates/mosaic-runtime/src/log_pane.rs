//! Line-buffer terminal for panes whose output arrives on the event stream.

use std::collections::VecDeque;
use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};
use mosaic_core::style::ELLIPSIS;
use mosaic_core::{Area, Cursor, VirtualTerminal, sanitize, truncate};

/// Lines kept per pane.
pub const SCROLLBACK: usize = 10_000;

/// Append-only scrollback with a view offset. `offset` counts lines between
/// the bottom of the view and the newest line; zero means following output.
#[derive(Debug, Clone)]
pub struct LogPane {
    lines: VecDeque<String>,
    capacity: usize,
    offset: usize,
}

impl Default for LogPane {
    fn default() -> Self {
        Self::with_capacity(SCROLLBACK)
    }
}

impl LogPane {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            capacity: capacity.max(1),
            offset: 0,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Append one line of process output. Only SGR styling survives; cursor
    /// movement, clears and the like would fight the sidebar for the screen.
    /// A scrolled-back view stays on the lines it was showing.
    pub fn push(&mut self, line: &str) {
        self.lines.push_back(sanitize(line));
        if self.offset > 0 {
            self.offset += 1;
        }
        while self.lines.len() > self.capacity {
            self.lines.pop_front();
        }
        self.offset = self.offset.min(self.lines.len().saturating_sub(1));
    }

    /// Move the view `delta` lines back (positive) or forward (negative).
    pub fn scroll(&mut self, delta: isize) {
        let max = self.lines.len().saturating_sub(1) as isize;
        self.offset = (self.offset as isize).saturating_add(delta).clamp(0, max) as usize;
    }

    fn visible(&self, height: usize) -> impl Iterator<Item = &String> {
        let end = self.lines.len() - self.offset;
        let start = end.saturating_sub(height);
        self.lines.range(start..end)
    }
}

impl VirtualTerminal for LogPane {
    fn draw(&mut self, out: &mut dyn Write, area: Area) -> io::Result<()> {
        let mut buf: Vec<u8> = Vec::new();
        let width = area.width as usize;
        let mut rows = self.visible(area.height as usize);
        for row in 0..area.height {
            queue!(buf, MoveTo(area.x, area.y + row))?;
            if let Some(line) = rows.next() {
                buf.extend_from_slice(truncate(line, width, ELLIPSIS).as_bytes());
                if line.contains('\x1b') {
                    buf.extend_from_slice(b"\x1b[0m");
                }
            }
            queue!(buf, Clear(ClearType::UntilNewLine))?;
        }
        out.write_all(&buf)
    }

    fn cursor(&self) -> Cursor {
        Cursor::default()
    }

    fn has_selection(&self) -> bool {
        false
    }

    fn is_scrolling(&self) -> bool {
        self.offset > 0
    }

    fn scroll_reset(&mut self) {
        self.offset = 0;
    }
}
