//! Failure modes of a single send.

pub use reqwest::StatusCode;
use thiserror::Error;

/// Text shown in place of a reply when the server answered with a non-success status.
pub const STATUS_ERROR_TEXT: &str = "Error: Unable to get response";

/// Text shown in place of a reply when no usable response came back.
pub const TRANSPORT_ERROR_TEXT: &str = "Error: Unable to connect to the server";

/// Why a send produced no reply text.
#[derive(Error, Debug)]
pub enum SendError {
    /// The server was reached but answered with a non-2xx status.
    #[error("endpoint responded with status {0}")]
    Status(StatusCode),

    /// No usable response: connect/DNS/reset failures, or a body that isn't JSON.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl SendError {
    /// The bot message that stands in for the missing reply.
    pub fn user_message(&self) -> &'static str {
        match self {
            SendError::Status(_) => STATUS_ERROR_TEXT,
            SendError::Transport(_) => TRANSPORT_ERROR_TEXT,
        }
    }
}
