//! Cross-cutting error types for DeepResearch.
//!
//! Crate-specific errors (`StreamError`, `ClientError`, `CommandError`, ...)
//! live in their own crates. The CLI converges them through `anyhow`.

use thiserror::Error;

use crate::enums::SessionStatus;

#[derive(Debug, Error)]
pub enum CoreError {
    /// A status transition was attempted that the session state machine forbids.
    #[error("Invalid session transition from {from} to {to}")]
    InvalidTransition {
        from: SessionStatus,
        to: SessionStatus,
    },

    /// A stream event arrived while the session was not in a status that accepts it.
    #[error("{action} is not accepted while the session is {status}")]
    NotAccepted {
        action: &'static str,
        status: SessionStatus,
    },

    /// Thread identity could not be generated.
    #[error("Failed to generate thread id: {0}")]
    ThreadId(String),
}
