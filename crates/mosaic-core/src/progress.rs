//! Footer state reduced from deployment lifecycle events.

use std::collections::HashMap;

use tracing::debug;

use crate::event::{ChangeOp, ProgressMode, SessionEvent};
use crate::style::{SPINNER_FRAMES, Theme};
use crate::urn::{Urn, resolve_label};

/// Status line shown once a session is cancelled.
pub const CANCEL_MESSAGE: &str =
    "Cancelling  Waiting for pending operations to complete. Press ctrl+c again to force cancel.";

/// Width the progress verbs are padded to.
const LABEL_WIDTH: usize = 11;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressConfig {
    /// Resource types never shown as pending or counted as skipped.
    pub ignored_types: Vec<String>,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            ignored_types: [
                "pulumi:providers:aws",
                "pulumi:providers:cloudflare",
                "sst:sst:Version",
                "sst:sst:LinkRef",
                "pulumi-nodejs:dynamic:Resource",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

/// A requested change not yet confirmed complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingChange {
    pub id: String,
    pub op: ChangeOp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Download {
    pub completed: u64,
    pub total: u64,
    pub done: bool,
}

impl Download {
    pub fn percentage(&self) -> u64 {
        if self.total == 0 {
            return 0;
        }
        (self.completed as u128 * 100 / self.total as u128) as u64
    }
}

/// Accumulated display state for the status footer.
#[derive(Debug, Clone, Default)]
pub struct Progress {
    config: ProgressConfig,
    started: bool,
    mode: ProgressMode,
    complete: bool,
    summary: bool,
    cancelled: bool,
    parents: HashMap<String, String>,
    pending: Vec<PendingChange>,
    downloading: HashMap<String, Download>,
    skipped: usize,
    spinner: usize,
}

impl Progress {
    pub fn new(config: ProgressConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn started(&self) -> bool {
        self.started
    }

    pub fn mode(&self) -> ProgressMode {
        self.mode
    }

    pub fn cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn pending(&self) -> &[PendingChange] {
        &self.pending
    }

    pub fn parents(&self) -> &HashMap<String, String> {
        &self.parents
    }

    pub fn spinner(&self) -> usize {
        self.spinner
    }

    /// Clear every accumulator. The mode and spinner survive so the next
    /// session picks up where the animation left off.
    pub fn reset(&mut self) {
        self.started = false;
        self.complete = false;
        self.summary = false;
        self.cancelled = false;
        self.parents.clear();
        self.pending.clear();
        self.downloading.clear();
        self.skipped = 0;
    }

    /// Fold one event into the footer state.
    pub fn apply(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::Tick => {
                self.spinner = (self.spinner + 1) % SPINNER_FRAMES.len();
            }
            SessionEvent::SessionStart { command } => {
                self.reset();
                self.started = true;
                match command.parse::<ProgressMode>() {
                    Ok(mode) => self.mode = mode,
                    Err(e) => debug!(error = %e, "keeping previous progress mode"),
                }
            }
            SessionEvent::ResourceChangeRequested {
                id,
                op,
                parent_id,
                resource_type,
            } => {
                let type_name = resource_type
                    .as_deref()
                    .unwrap_or_else(|| Urn::parse(id).type_name());
                if self.config.ignored_types.iter().any(|t| t == type_name) {
                    debug!(id = %id, type_name, "ignoring resource");
                    return;
                }
                if let Some(parent) = parent_id.as_deref().filter(|p| !p.is_empty()) {
                    self.parents.insert(id.clone(), parent.to_string());
                }
                if op.is_skip() {
                    self.skipped += 1;
                } else {
                    self.pending.push(PendingChange {
                        id: id.clone(),
                        op: *op,
                    });
                }
            }
            SessionEvent::ResourceChangeCompleted { id } => self.remove_pending(id),
            SessionEvent::Diagnostic { id } => {
                if !id.is_empty() {
                    self.remove_pending(id);
                }
            }
            SessionEvent::DownloadProgress {
                id,
                completed,
                total,
                done,
            } => {
                self.downloading.insert(
                    id.clone(),
                    Download {
                        completed: *completed,
                        total: *total,
                        done: *done,
                    },
                );
            }
            SessionEvent::SummaryReached => self.summary = true,
            SessionEvent::Cancelled => self.cancelled = true,
            SessionEvent::ConcurrentConflict | SessionEvent::SessionFailed | SessionEvent::SkipEvent => {
                debug!(event = event.kind(), "resetting progress");
                self.reset();
            }
            SessionEvent::SessionComplete { stale } => {
                if !stale {
                    self.complete = true;
                }
            }
        }
    }

    /// Drops every pending entry for `id`; a resource requested twice is
    /// settled by one completion.
    fn remove_pending(&mut self, id: &str) {
        self.pending.retain(|p| p.id != id);
    }

    /// Status verb for the trailing line.
    pub fn status_label(&self) -> &'static str {
        if self.cancelled {
            CANCEL_MESSAGE
        } else if self.summary {
            "Finalizing"
        } else {
            self.mode.verb()
        }
    }

    /// Render the footer frame: downloads, pending changes, status line.
    /// Empty before a session starts and after it completes.
    pub fn view(&self, theme: Theme) -> Vec<String> {
        if !self.started || self.complete {
            return Vec::new();
        }
        let spinner = theme.spinner(self.spinner);
        let mut lines = Vec::new();

        let mut downloads: Vec<(&String, &Download)> =
            self.downloading.iter().filter(|(_, d)| !d.done).collect();
        downloads.sort_by(|a, b| a.0.cmp(b.0));
        for (id, download) in downloads {
            let name = id.split_once(':').map_or(id.as_str(), |(_, rest)| rest);
            lines.push(format!(
                "{spinner}  {:<LABEL_WIDTH$} {name} {}%",
                "Downloading",
                download.percentage()
            ));
        }

        for change in &self.pending {
            lines.push(format!(
                "{spinner}  {:<LABEL_WIDTH$} {}",
                change.op.verb(),
                resolve_label(&change.id, &self.parents)
            ));
        }

        let mut status = self.status_label().to_string();
        if self.skipped > 0 && !self.cancelled {
            status = format!("{status:<LABEL_WIDTH$}");
            status.push_str(&theme.dim(&format!(" {} skipped", self.skipped)));
        }
        lines.push(format!("{spinner}  {status}"));
        lines
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
