use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MosaicError;

// ─── Operation ────────────────────────────────────────────────────

/// Step the deployment engine plans for a single resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOp {
    Create,
    Update,
    Delete,
    Replace,
    Refresh,
    #[serde(alias = "same")]
    Unchanged,
    Read,
}

impl ChangeOp {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Replace => "replace",
            Self::Refresh => "refresh",
            Self::Unchanged => "unchanged",
            Self::Read => "read",
        }
    }

    /// Unchanged and read steps are counted, never shown as pending.
    pub fn is_skip(self) -> bool {
        matches!(self, Self::Unchanged | Self::Read)
    }

    /// Progress verb shown next to a pending change.
    pub fn verb(self) -> &'static str {
        match self {
            Self::Update => "Updating",
            Self::Delete => "Deleting",
            Self::Refresh => "Refreshing",
            _ => "Creating",
        }
    }
}

impl fmt::Display for ChangeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Mode ─────────────────────────────────────────────────────────

/// Which stack command the session is running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressMode {
    Diff,
    Refresh,
    Remove,
    #[default]
    Deploy,
}

impl ProgressMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Diff => "diff",
            Self::Refresh => "refresh",
            Self::Remove => "remove",
            Self::Deploy => "deploy",
        }
    }

    /// Status verb while the session is still in progress.
    pub fn verb(self) -> &'static str {
        match self {
            Self::Diff => "Generating",
            Self::Refresh => "Refreshing",
            Self::Remove => "Removing",
            Self::Deploy => "Deploying",
        }
    }
}

impl fmt::Display for ProgressMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProgressMode {
    type Err = MosaicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "diff" => Ok(Self::Diff),
            "refresh" => Ok(Self::Refresh),
            "remove" => Ok(Self::Remove),
            "deploy" => Ok(Self::Deploy),
            other => Err(MosaicError::UnknownCommand(other.to_string())),
        }
    }
}

// ─── Event ────────────────────────────────────────────────────────

/// Lifecycle events consumed by the progress footer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    SessionStart {
        command: String,
    },
    ResourceChangeRequested {
        id: String,
        op: ChangeOp,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_id: Option<String>,
        /// Falls back to the type encoded in `id` when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        resource_type: Option<String>,
    },
    ResourceChangeCompleted {
        id: String,
    },
    Diagnostic {
        #[serde(default)]
        id: String,
    },
    DownloadProgress {
        id: String,
        completed: u64,
        total: u64,
        #[serde(default)]
        done: bool,
    },
    SummaryReached,
    Cancelled,
    ConcurrentConflict,
    SessionFailed,
    SkipEvent,
    SessionComplete {
        #[serde(default)]
        stale: bool,
    },
    Tick,
}

impl SessionEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SessionStart { .. } => "session_start",
            Self::ResourceChangeRequested { .. } => "resource_change_requested",
            Self::ResourceChangeCompleted { .. } => "resource_change_completed",
            Self::Diagnostic { .. } => "diagnostic",
            Self::DownloadProgress { .. } => "download_progress",
            Self::SummaryReached => "summary_reached",
            Self::Cancelled => "cancelled",
            Self::ConcurrentConflict => "concurrent_conflict",
            Self::SessionFailed => "session_failed",
            Self::SkipEvent => "skip_event",
            Self::SessionComplete { .. } => "session_complete",
            Self::Tick => "tick",
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────
