//! # dr-stream
//!
//! Frame Decoder for the research event protocol.
//!
//! The backend speaks one logical protocol (named events carrying JSON
//! payloads) over two framings:
//! - [`EventStreamFraming`]: `text/event-stream` as a browser `EventSource`
//!   reads it (used by the initial research stream)
//! - [`ChunkedFraming`]: `event:`/`data:` blocks separated by blank lines in
//!   a streamed HTTP body (used by the review and upload responses)
//!
//! Both framings implement [`Framing`] and feed the same [`FrameStream`],
//! which turns a byte stream into an ordered, lazy sequence of [`Frame`]s.
//! Consumers never see which framing produced a frame.

mod chunked;
mod decode;
mod error;
mod event_stream;
mod framing;

pub use chunked::ChunkedFraming;
pub use decode::{BoxFrameStream, FrameStream, decode};
pub use error::StreamError;
pub use event_stream::EventStreamFraming;
pub use framing::{Framing, FramingKind, RawFrame};

use serde_json::Value;

/// One decoded `(event_type, payload)` unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub event_type: String,
    pub payload: Value,
}

impl Frame {
    #[must_use]
    pub fn new(event_type: impl Into<String>, payload: Value) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
        }
    }

    /// Parse the JSON payload of a raw frame.
    ///
    /// Empty `data` decodes to `{}`, so payload-less events such as `done`
    /// survive servers that omit the body.
    ///
    /// # Errors
    ///
    /// Returns the JSON error when `data` is not valid JSON.
    pub fn from_raw(raw: RawFrame) -> Result<Self, serde_json::Error> {
        let payload = if raw.data.trim().is_empty() {
            Value::Object(serde_json::Map::new())
        } else {
            serde_json::from_str(&raw.data)?
        };
        Ok(Self {
            event_type: raw.event_type,
            payload,
        })
    }
}
