//! Frame stream error types.

use thiserror::Error;

/// Errors surfaced by a [`FrameStream`](crate::FrameStream).
///
/// Malformed frames are not errors: they are dropped inside the decoder.
/// Only a failure of the underlying byte stream reaches the consumer, and it
/// ends the sequence.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The transport failed while reading the body.
    #[error("stream read failed: {0}")]
    Read(String),
}
