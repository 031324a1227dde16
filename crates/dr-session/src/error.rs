//! Session error types.

use dr_core::enums::SessionStatus;
use dr_core::errors::CoreError;
use thiserror::Error;

/// A frame whose type is known but whose payload has the wrong shape.
#[derive(Debug, Error)]
#[error("invalid {event_type} payload: {source}")]
pub struct RouteError {
    pub event_type: String,
    #[source]
    pub source: serde_json::Error,
}

/// Synchronous rejection of a controller command. A rejected command leaves
/// the session untouched and opens no transport.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command is not valid in the current status.
    #[error("{command} is not allowed while the session is {status}")]
    InvalidState {
        command: &'static str,
        status: SessionStatus,
    },

    /// Command input failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The session is `running` but no transport is open, which only happens
    /// when an earlier command was abandoned mid-open.
    #[error("session is running without an open transport; cancel it before issuing commands")]
    Inconsistent,

    /// A research stream is open; uploads wait until it pauses or ends.
    #[error("a research stream is running; wait for it to pause or finish")]
    Busy,

    #[error(transparent)]
    Core(#[from] CoreError),
}
