//! HTTP transport error types.

use thiserror::Error;

/// Errors that can occur when talking to the research backend.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP transport error (connect, send, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend returned a non-success status code.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code returned by the backend.
        status: u16,
        /// Response body, if any.
        message: String,
    },

    /// The file to upload could not be read.
    #[error("cannot read upload: {0}")]
    Io(#[from] std::io::Error),
}
