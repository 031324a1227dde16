//! The framing seam shared by both transports.

use crate::{ChunkedFraming, EventStreamFraming};

/// A frame as cut from the byte stream, before its payload is parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub event_type: String,
    pub data: String,
}

impl RawFrame {
    #[must_use]
    pub fn new(event_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            data: data.into(),
        }
    }
}

/// Incremental framing strategy.
///
/// Implementations buffer across chunk boundaries and only ever return
/// complete frames, in arrival order.
pub trait Framing: Send {
    /// Feed the next chunk and collect every frame it completes.
    fn feed(&mut self, chunk: &[u8]) -> Vec<RawFrame>;

    /// Signal end of stream. Unterminated input is discarded, never emitted;
    /// returns how many buffered bytes were dropped.
    fn finish(&mut self) -> usize;
}

/// Which framing a transport body uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramingKind {
    /// `text/event-stream`, decoded the way a browser `EventSource` does.
    EventStream,
    /// Blank-line separated `event:`/`data:` blocks in a plain streamed body.
    Chunked,
}

impl FramingKind {
    #[must_use]
    pub fn framing(self) -> Box<dyn Framing> {
        match self {
            Self::EventStream => Box::new(EventStreamFraming::new()),
            Self::Chunked => Box::new(ChunkedFraming::new()),
        }
    }
}

/// Which byte sequences end a line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum LineEnding {
    /// Only `\n` ends a line; a `\r` right before it is stripped.
    #[default]
    Lf,
    /// `\r\n`, a bare `\n` or a bare `\r` each end a line.
    Any,
}

/// Byte buffer that yields complete lines.
///
/// Lines are decoded as UTF-8 only once complete, so a multi-byte character
/// split across two chunks is reassembled before decoding. Bytes already
/// scanned are not searched again when the next chunk arrives.
#[derive(Debug, Default)]
pub(crate) struct LineBuffer {
    buf: Vec<u8>,
    ending: LineEnding,
    /// Prefix of `buf` known to hold no terminator.
    scanned: usize,
    /// The previous chunk ended on `\r`; a leading `\n` completes that CRLF.
    skip_lf: bool,
}

impl LineBuffer {
    pub(crate) fn new(ending: LineEnding) -> Self {
        Self {
            ending,
            ..Self::default()
        }
    }

    pub(crate) fn feed(&mut self, mut chunk: &[u8]) -> Vec<String> {
        if self.skip_lf && !chunk.is_empty() {
            self.skip_lf = false;
            if let [b'\n', rest @ ..] = chunk {
                chunk = rest;
            }
        }
        self.buf.extend_from_slice(chunk);

        let ending = self.ending;
        let is_terminator = |b: &u8| match ending {
            LineEnding::Lf => *b == b'\n',
            LineEnding::Any => *b == b'\n' || *b == b'\r',
        };

        let mut lines = Vec::new();
        let mut start = 0;
        let mut scan = self.scanned;
        while let Some(offset) = self.buf[scan..].iter().position(is_terminator) {
            let end = scan + offset;
            let mut next = end + 1;
            let mut line = &self.buf[start..end];
            match (ending, self.buf[end]) {
                (LineEnding::Lf, _) => {
                    if let [head @ .., b'\r'] = line {
                        line = head;
                    }
                }
                (LineEnding::Any, b'\r') => match self.buf.get(next) {
                    Some(b'\n') => next += 1,
                    Some(_) => {}
                    None => self.skip_lf = true,
                },
                (LineEnding::Any, _) => {}
            }
            lines.push(String::from_utf8_lossy(line).into_owned());
            start = next;
            scan = next;
        }
        if start > 0 {
            self.buf.drain(..start);
        }
        self.scanned = self.buf.len();
        lines
    }

    /// Drop whatever unterminated bytes remain, returning their count.
    pub(crate) fn clear(&mut self) -> usize {
        let pending = self.buf.len();
        self.buf.clear();
        self.scanned = 0;
        self.skip_lf = false;
        pending
    }
}

/// Split an SSE-style field line into `(name, value)`.
///
/// `name:value` and `name: value` are equivalent; a line without a colon is a
/// field with an empty value.
pub(crate) fn split_field(line: &str) -> (&str, &str) {
    match line.split_once(':') {
        Some((name, value)) => (name, value.strip_prefix(' ').unwrap_or(value)),
        None => (line, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn line_buffer_holds_partial_lines() {
        let mut lines = LineBuffer::default();
        assert!(lines.feed(b"event: lo").is_empty());
        assert_eq!(lines.feed(b"g\r\ndata: {}\n"), vec!["event: log", "data: {}"]);
        assert_eq!(lines.clear(), 0);
    }

    #[test]
    fn line_buffer_reassembles_split_multibyte_chars() {
        let text = "data: 开始\n".as_bytes();
        let mut lines = LineBuffer::default();
        // Split inside the first CJK character.
        assert!(lines.feed(&text[..7]).is_empty());
        assert_eq!(lines.feed(&text[7..]), vec!["data: 开始"]);
    }

    #[test]
    fn clear_reports_pending_bytes() {
        let mut lines = LineBuffer::default();
        lines.feed(b"event: done\ndata");
        assert_eq!(lines.clear(), 4);
    }

    #[test]
    fn any_ending_accepts_cr_lf_and_crlf() {
        let mut lines = LineBuffer::new(LineEnding::Any);
        assert_eq!(
            lines.feed(b"a\rb\nc\r\nd\r\re\n"),
            vec!["a", "b", "c", "d", "", "e"]
        );
        assert_eq!(lines.clear(), 0);
    }

    #[test]
    fn crlf_split_across_chunks_ends_one_line() {
        let mut lines = LineBuffer::new(LineEnding::Any);
        assert_eq!(lines.feed(b"data: first\r"), vec!["data: first"]);
        assert!(lines.feed(b"").is_empty());
        assert!(lines.feed(b"\n").is_empty());
        assert_eq!(lines.feed(b"\r"), vec![""]);
        assert!(lines.feed(b"\n").is_empty());
        assert_eq!(lines.feed(b"next\n"), vec!["next"]);
    }

    #[test]
    fn cr_followed_by_text_in_next_chunk_is_a_bare_cr() {
        let mut lines = LineBuffer::new(LineEnding::Any);
        assert_eq!(lines.feed(b"a\r"), vec!["a"]);
        assert_eq!(lines.feed(b"b\r"), vec!["b"]);
    }

    #[test]
    fn lf_ending_keeps_bare_cr_inside_the_line() {
        let mut lines = LineBuffer::default();
        assert!(lines.feed(b"a\rb").is_empty());
        assert_eq!(lines.feed(b"\n"), vec!["a\rb"]);
    }

    #[test]
    fn long_line_fed_byte_by_byte_is_emitted_once() {
        let text = format!("data: {}\n", "x".repeat(4096));
        let mut lines = LineBuffer::new(LineEnding::Any);
        let mut out = Vec::new();
        for byte in text.as_bytes() {
            out.extend(lines.feed(std::slice::from_ref(byte)));
        }
        assert_eq!(out, vec![text.trim_end().to_string()]);
        assert_eq!(lines.clear(), 0);
    }

    #[test]
    fn split_field_forms() {
        assert_eq!(split_field("event: log"), ("event", "log"));
        assert_eq!(split_field("event:log"), ("event", "log"));
        assert_eq!(split_field("data:  two"), ("data", " two"));
        assert_eq!(split_field("data"), ("data", ""));
    }
}
