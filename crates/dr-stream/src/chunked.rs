//! Raw chunked-body framing.
//!
//! The review and upload endpoints answer with a plain streamed body whose
//! text is a sequence of blocks:
//!
//! ```text
//! event: <type>\n
//! data: <json>\n
//! \n
//! ```
//!
//! Chunks arrive at arbitrary byte offsets; a block may span several chunks
//! and one chunk may carry several blocks. The framing is a two-state
//! machine: collecting fields of the current block, and dispatching on the
//! blank line that ends it.

use crate::framing::{Framing, LineBuffer, RawFrame, split_field};

/// Framing for `event:`/`data:` blocks in a streamed HTTP body.
///
/// A block is emitted only when it has both an `event` and a `data` line;
/// the first occurrence of each wins. Other lines are ignored.
#[derive(Debug, Default)]
pub struct ChunkedFraming {
    lines: LineBuffer,
    event_type: Option<String>,
    data: Option<String>,
    dropped_blocks: usize,
}

impl ChunkedFraming {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of complete blocks dropped for lacking an `event` or `data` line.
    #[must_use]
    pub const fn dropped_blocks(&self) -> usize {
        self.dropped_blocks
    }

    fn process_line(&mut self, line: &str, frames: &mut Vec<RawFrame>) {
        if line.is_empty() {
            self.end_block(frames);
            return;
        }
        match split_field(line) {
            ("event", value) if self.event_type.is_none() => {
                self.event_type = Some(value.to_string());
            }
            ("data", value) if self.data.is_none() => self.data = Some(value.to_string()),
            _ => {}
        }
    }

    fn end_block(&mut self, frames: &mut Vec<RawFrame>) {
        match (self.event_type.take(), self.data.take()) {
            (Some(event_type), Some(data)) => frames.push(RawFrame { event_type, data }),
            (None, None) => {}
            (event_type, _) => {
                self.dropped_blocks += 1;
                tracing::warn!(?event_type, "chunked framing: dropping incomplete block");
            }
        }
    }
}

impl Framing for ChunkedFraming {
    fn feed(&mut self, chunk: &[u8]) -> Vec<RawFrame> {
        let mut frames = Vec::new();
        for line in self.lines.feed(chunk) {
            self.process_line(&line, &mut frames);
        }
        frames
    }

    fn finish(&mut self) -> usize {
        self.lines.clear()
            + self.event_type.take().map_or(0, |e| e.len())
            + self.data.take().map_or(0, |d| d.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decodes_several_blocks_in_one_chunk() {
        let mut framing = ChunkedFraming::new();
        let frames = framing.feed(
            b"event: log\ndata: {\"message\":\"a\"}\n\nevent: report_token\ndata: {\"token\":\"x\"}\n\n",
        );
        assert_eq!(
            frames,
            vec![
                RawFrame::new("log", r#"{"message":"a"}"#),
                RawFrame::new("report_token", r#"{"token":"x"}"#),
            ]
        );
    }

    #[test]
    fn block_spanning_chunks_is_emitted_once() {
        let mut framing = ChunkedFraming::new();
        assert!(framing.feed(b"event: lo").is_empty());
        assert!(framing.feed(b"g\ndata: {\"message\"").is_empty());
        assert!(framing.feed(b":\"a\"}\n").is_empty());
        assert_eq!(
            framing.feed(b"\n"),
            vec![RawFrame::new("log", r#"{"message":"a"}"#)]
        );
    }

    #[test]
    fn block_without_data_is_dropped() {
        let mut framing = ChunkedFraming::new();
        let frames = framing.feed(b"event: done\n\nevent: log\ndata: {}\n\n");
        assert_eq!(frames, vec![RawFrame::new("log", "{}")]);
        assert_eq!(framing.dropped_blocks(), 1);
    }

    #[test]
    fn block_without_event_is_dropped() {
        let mut framing = ChunkedFraming::new();
        assert!(framing.feed(b"data: {}\n\n").is_empty());
        assert_eq!(framing.dropped_blocks(), 1);
    }

    #[test]
    fn first_data_line_wins() {
        let mut framing = ChunkedFraming::new();
        let frames = framing.feed(b"event: log\ndata: {\"message\":\"a\"}\ndata: ignored\n\n");
        assert_eq!(frames, vec![RawFrame::new("log", r#"{"message":"a"}"#)]);
    }

    #[test]
    fn finish_discards_trailing_block() {
        let mut framing = ChunkedFraming::new();
        assert!(framing.feed(b"event: done\ndata: {}\n").is_empty());
        assert!(framing.finish() > 0);
        assert_eq!(framing.finish(), 0);
    }
}
