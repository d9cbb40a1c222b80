//! The control loop: the only owner of pane state, footer state and the
//! terminal device.
//!
//! With no panes registered the console is a footer: the progress view is
//! redrawn in place at the bottom of the normal scrolling output. Once a
//! pane is added it takes the whole screen, with the footer embedded in the
//! sidebar above the key hints.

use std::io::{self, Write};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};
use mosaic_core::{
    DiffRenderer, Key, Layout, Pane, PaneRegistry, PaneRequest, Progress, ProgressConfig,
    SessionEvent, Theme,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::device::Device;
use crate::input::{ConsoleEvent, PaneEvent};
use crate::log_pane::LogPane;

pub struct Console<D> {
    device: D,
    theme: Theme,
    progress: Progress,
    footer: DiffRenderer,
    panes: PaneRegistry<LogPane>,
    requests: Option<mpsc::UnboundedSender<PaneRequest>>,
}

impl<D: Device> Console<D> {
    pub fn new(device: D, theme: Theme, config: ProgressConfig, layout: Layout) -> Self {
        Self {
            device,
            theme,
            progress: Progress::new(config),
            footer: DiffRenderer::new(),
            panes: PaneRegistry::new(layout),
            requests: None,
        }
    }

    /// Kill, start, copy and forwarded input go to `tx`.
    pub fn with_requests(mut self, tx: mpsc::UnboundedSender<PaneRequest>) -> Self {
        self.requests = Some(tx);
        self
    }

    #[cfg(test)]
    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    pub fn panes(&self) -> &PaneRegistry<LogPane> {
        &self.panes
    }

    /// Process events until the queue closes or `cancel` fires. On
    /// cancellation the footer shows the cancel message once before exit.
    pub async fn run(&mut self, mut rx: mpsc::UnboundedReceiver<ConsoleEvent>, cancel: CancellationToken) {
        info!("console: event loop started");
        self.hide_cursor();
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("console: cancellation requested");
                    self.progress.apply(&SessionEvent::Cancelled);
                    self.render();
                    break;
                }
                event = rx.recv() => {
                    match event {
                        Some(event) => self.handle_event(event),
                        None => {
                            info!("console: event source closed");
                            break;
                        }
                    }
                }
            }
        }
        self.teardown();
    }

    pub fn handle_event(&mut self, event: ConsoleEvent) {
        match event {
            ConsoleEvent::Session(event) => self.progress.apply(&event),
            ConsoleEvent::Pane(event) => self.handle_pane_event(event),
        }
        self.render();
    }

    fn handle_pane_event(&mut self, event: PaneEvent) {
        match event {
            PaneEvent::PaneAdded {
                key,
                title,
                icon,
                killable,
            } => {
                if self.panes.is_empty() {
                    self.enter_multiplexer();
                }
                info!(key = %key, "console: pane added");
                self.panes
                    .add(Pane::new(key, title, icon, LogPane::default()).killable(killable));
            }
            PaneEvent::PaneOutput { key, line } => match self.panes.get_mut(&key) {
                Some(pane) => pane.vt.push(&line),
                None => debug!(key = %key, "console: output for unknown pane"),
            },
            PaneEvent::PaneExited { key } => self.panes.mark_dead(&key),
            PaneEvent::PaneRestarted { key } => self.panes.mark_alive(&key),
            PaneEvent::PaneRemoved { key } => {
                if self.panes.remove(&key).is_some() {
                    info!(key = %key, "console: pane removed");
                    if self.panes.is_empty() {
                        self.leave_multiplexer();
                    }
                }
            }
            PaneEvent::Key { key } => self.handle_key(key),
            PaneEvent::Line { text } => self.print_line(&text),
        }
    }

    fn handle_key(&mut self, key: Key) {
        let (_, rows) = self.device.size();
        let half = (rows / 2).max(1) as isize;
        let scroll = match key {
            Key::CtrlU => half,
            Key::CtrlD => -half,
            _ => {
                if let Some(request) = self.panes.handle_key(key) {
                    self.send(request);
                }
                return;
            }
        };
        if let Some(pane) = self.panes.selected_process_mut() {
            pane.vt.scroll(scroll);
        }
    }

    fn send(&self, request: PaneRequest) {
        debug!(?request, "console: pane request");
        if let Some(tx) = &self.requests {
            if tx.send(request).is_err() {
                debug!("console: request receiver gone");
            }
        }
    }

    // ─── Output ───────────────────────────────────────────────────

    /// Redraw for the current mode. The device size is read fresh each time.
    pub fn render(&mut self) {
        if let Err(err) = self.try_render() {
            warn!(error = %err, "console: render failed");
        }
    }

    fn try_render(&mut self) -> io::Result<()> {
        let (cols, rows) = self.device.size();
        let footer = self.progress.view(self.theme);
        if self.panes.is_empty() {
            self.footer.render(&mut self.device, cols, footer)
        } else {
            self.panes.draw(&mut self.device, (cols, rows), &footer, self.theme)
        }
    }

    /// Print `text` as normal output above the footer. While panes own the
    /// screen there is nowhere to put it.
    fn print_line(&mut self, text: &str) {
        if !self.panes.is_empty() {
            debug!("console: line dropped while panes are shown");
            return;
        }
        let (cols, _) = self.device.size();
        let result = self.footer.clear(&mut self.device, cols).and_then(|()| {
            self.device.write_all(text.as_bytes())?;
            self.device.write_all(b"\r\n")?;
            self.device.flush()
        });
        if let Err(err) = result {
            warn!(error = %err, "console: write failed");
        }
    }

    /// The registry clears the screen on its first draw.
    fn enter_multiplexer(&mut self) {
        let (cols, _) = self.device.size();
        if let Err(err) = self.footer.clear(&mut self.device, cols) {
            warn!(error = %err, "console: write failed");
        }
        self.panes.invalidate();
    }

    fn leave_multiplexer(&mut self) {
        if let Err(err) = clear_screen(&mut self.device) {
            warn!(error = %err, "console: write failed");
        }
        self.footer.reset();
    }

    /// The footer is redrawn in place; a blinking cursor on its last line is
    /// noise. [`Console::teardown`] shows it again.
    fn hide_cursor(&mut self) {
        let mut buf: Vec<u8> = Vec::new();
        if let Err(err) = queue!(buf, Hide) {
            warn!(error = %err, "console: write failed");
        }
        if let Err(err) = write_frame(&mut self.device, buf) {
            warn!(error = %err, "console: write failed");
        }
    }

    /// Leave the cursor visible on a fresh line below whatever is on screen.
    fn teardown(&mut self) {
        let mut buf: Vec<u8> = Vec::new();
        if !self.footer.previous().is_empty() {
            buf.extend_from_slice(b"\r\n");
        }
        if let Err(err) = queue!(buf, Show) {
            warn!(error = %err, "console: teardown failed");
        }
        if let Err(err) = write_frame(&mut self.device, buf) {
            warn!(error = %err, "console: teardown failed");
        }
        info!("console: event loop stopped");
    }
}

fn clear_screen<W: Write>(out: &mut W) -> io::Result<()> {
    let mut buf: Vec<u8> = Vec::new();
    queue!(buf, Clear(ClearType::All), MoveTo(0, 0))?;
    write_frame(out, buf)
}

fn write_frame<W: Write>(out: &mut W, buf: Vec<u8>) -> io::Result<()> {
    out.write_all(&buf)?;
    out.flush()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
