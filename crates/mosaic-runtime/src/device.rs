//! The terminal the console writes to.

use std::io::{self, Write};

use crossterm::cursor::Show;
use crossterm::execute;

/// Used when the size query fails, e.g. output is not a tty.
pub const FALLBACK_SIZE: (u16, u16) = (80, 24);

/// Byte sink plus a size query. Only the console's render step writes here.
pub trait Device: Write {
    /// Current `(columns, rows)`.
    fn size(&self) -> (u16, u16);
}

pub struct StdoutDevice {
    out: io::Stdout,
}

impl StdoutDevice {
    pub fn new() -> Self {
        Self { out: io::stdout() }
    }
}

impl Default for StdoutDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for StdoutDevice {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.out.write(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.out.lock().write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

impl Device for StdoutDevice {
    fn size(&self) -> (u16, u16) {
        crossterm::terminal::size().unwrap_or(FALLBACK_SIZE)
    }
}

/// RAII guard that shows the cursor again when dropped, including on panic
/// or an early `?` return out of `main`.
pub struct CursorGuard;

impl Drop for CursorGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), Show);
    }
}
