//! mosaic-core: state and rendering for the live deploy console.
//! Reduces deployment lifecycle events into footer state, keeps the pane
//! list and selection, and turns text frames into incremental terminal writes.
//! No async runtime here; the control loop lives in mosaic-runtime.

pub mod diff;
pub mod error;
pub mod event;
pub mod pane;
pub mod progress;
pub mod registry;
pub mod style;
pub mod urn;

pub use diff::{DiffRenderer, fit, sanitize, truncate, visible_width};
pub use error::MosaicError;
pub use event::{ChangeOp, ProgressMode, SessionEvent};
pub use pane::{Area, Cursor, Pane, VirtualTerminal};
pub use progress::{Progress, ProgressConfig};
pub use registry::{Key, Layout, PaneRegistry, PaneRequest};
pub use style::Theme;
pub use urn::{ROOT_TYPE, Urn, resolve_label};
