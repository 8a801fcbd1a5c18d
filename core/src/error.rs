//! Error types for building, sending and decoding HTTP requests.
//!
//! # Design
//! Every failure surfaces synchronously at the call that caused it. HTTP
//! status codes are data, not errors, unless the caller narrowed the accepted
//! set; `UnexpectedStatus` then carries the status and raw body.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HttpError>;

#[derive(Debug, Error)]
pub enum HttpError {
    /// Connection, DNS, TLS, timeout or protocol failure during `send`.
    #[error("HTTP request failed: {0}")]
    Transport(String),

    /// A body could not be serialized.
    #[error("encoding failed: {0}")]
    Encoding(String),

    /// A response body is not the JSON shape that was asked for.
    #[error("decoding failed: {0}")]
    Decoding(String),

    /// The server answered with a status outside the accepted set.
    #[error("unexpected HTTP status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("invalid proxy address: {0}")]
    InvalidProxy(String),

    /// A multipart file part could not be read.
    #[error("failed to read {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The background thread of a dispatched request panicked.
    #[error("dispatched request did not complete")]
    Dispatch,
}

impl HttpError {
    /// Only transport failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, HttpError::Transport(_))
    }
}

impl From<ureq::Error> for HttpError {
    fn from(err: ureq::Error) -> Self {
        HttpError::Transport(err.to_string())
    }
}
