//! JSON-lines event source and the spinner ticker.
//!
//! Both only enqueue; the console owns every piece of state.

use std::time::Duration;

use mosaic_core::{Key, MosaicError, SessionEvent};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

fn default_icon() -> String {
    "●".to_string()
}

/// Events about the multiplexed processes and the user's keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PaneEvent {
    PaneAdded {
        key: String,
        title: String,
        #[serde(default = "default_icon")]
        icon: String,
        #[serde(default)]
        killable: bool,
    },
    PaneOutput {
        key: String,
        line: String,
    },
    PaneExited {
        key: String,
    },
    PaneRestarted {
        key: String,
    },
    PaneRemoved {
        key: String,
    },
    Key {
        key: Key,
    },
    /// Plain text printed above the footer.
    Line {
        text: String,
    },
}

impl PaneEvent {
    pub const KINDS: &'static [&'static str] = &[
        "pane_added",
        "pane_output",
        "pane_exited",
        "pane_restarted",
        "pane_removed",
        "key",
        "line",
    ];
}

/// Everything the console loop consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleEvent {
    Session(SessionEvent),
    Pane(PaneEvent),
}

impl From<SessionEvent> for ConsoleEvent {
    fn from(event: SessionEvent) -> Self {
        Self::Session(event)
    }
}

impl From<PaneEvent> for ConsoleEvent {
    fn from(event: PaneEvent) -> Self {
        Self::Pane(event)
    }
}

/// Decode one input line. `line_num` is 1-based and only used for errors.
pub fn decode(line: &str, line_num: usize) -> Result<ConsoleEvent, MosaicError> {
    let malformed = |err: serde_json::Error| MosaicError::Decode {
        line_num,
        detail: err.to_string(),
    };
    let value: Value = serde_json::from_str(line).map_err(malformed)?;
    let kind = value.get("event").and_then(Value::as_str).unwrap_or_default();
    if PaneEvent::KINDS.contains(&kind) {
        PaneEvent::deserialize(value)
            .map(ConsoleEvent::Pane)
            .map_err(malformed)
    } else {
        SessionEvent::deserialize(value)
            .map(ConsoleEvent::Session)
            .map_err(malformed)
    }
}

/// Forward every decodable line of `reader` to `tx`. Malformed lines are
/// logged and skipped. Returns the number of events sent once the reader
/// hits EOF or the console has gone away.
pub async fn read_events<R>(reader: R, tx: mpsc::UnboundedSender<ConsoleEvent>) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut line_num = 0;
    let mut sent = 0;
    while let Some(line) = lines.next_line().await? {
        line_num += 1;
        if line.trim().is_empty() {
            continue;
        }
        match decode(&line, line_num) {
            Ok(event) => {
                if tx.send(event).is_err() {
                    debug!("input: console closed, stopping");
                    break;
                }
                sent += 1;
            }
            Err(err) => warn!(error = %err, "input: dropping event"),
        }
    }
    Ok(sent)
}

/// Enqueue a [`SessionEvent::Tick`] every `period` until `stop` fires or the
/// console has gone away.
pub async fn tick(tx: mpsc::UnboundedSender<ConsoleEvent>, period: Duration, stop: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = interval.tick() => {
                if tx.send(SessionEvent::Tick.into()).is_err() {
                    break;
                }
            }
            _ = stop.cancelled() => break,
        }
    }
    debug!("ticker: stopped");
}
