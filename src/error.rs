use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedError {
    /// Peer closed the socket before the requested bytes arrived.
    #[error("connection closed by peer")]
    ConnectionClosed,

    #[error("declared frame length {declared} does not match configured size {expected}")]
    FrameSizeMismatch { declared: i32, expected: usize },

    #[error("frame buffer holds {len} bytes, need {expected}")]
    ShortFrame { len: usize, expected: usize },

    #[error("{pixels} pixels exceed the {max} a frame length can describe")]
    FrameTooLarge { pixels: usize, max: usize },

    #[error("command line longer than {0} bytes")]
    LineTooLong(usize),

    #[error("no data within {0:?}")]
    Timeout(Duration),

    #[error("server has no protocol handler bound")]
    NoHandler,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    /// Failure raised inside a frame consumer or command handler.
    #[error("handler failed: {0}")]
    Handler(String),
}

pub type Result<T> = std::result::Result<T, LedError>;
