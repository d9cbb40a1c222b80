//! Error types for the console.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MosaicError {
    #[error("malformed event at line {line_num}: {detail}")]
    Decode { line_num: usize, detail: String },

    #[error("unknown stack command: {0}")]
    UnknownCommand(String),

    #[error("unknown key: {0}")]
    UnknownKey(String),
}
