//! `text/event-stream` framing, following the browser `EventSource` rules.

use crate::framing::{Framing, LineBuffer, LineEnding, RawFrame, split_field};

const DEFAULT_EVENT_TYPE: &str = "message";

/// Event-stream framing for the native research stream.
///
/// - `event:` sets the type (defaults to `message`)
/// - `data:` lines accumulate, joined with `\n`
/// - `id:` and `retry:` are tracked but carry no meaning for this protocol
/// - lines starting with `:` are comments (keep-alives)
/// - a blank line dispatches; an event without any `data` is not dispatched
/// - `\r\n`, `\n` and a bare `\r` all end a line
#[derive(Debug)]
pub struct EventStreamFraming {
    lines: LineBuffer,
    event_type: Option<String>,
    data: String,
    has_data: bool,
    last_event_id: Option<String>,
    retry_ms: Option<u64>,
    bom_checked: bool,
}

impl EventStreamFraming {
    #[must_use]
    pub fn new() -> Self {
        Self {
            lines: LineBuffer::new(LineEnding::Any),
            event_type: None,
            data: String::new(),
            has_data: false,
            last_event_id: None,
            retry_ms: None,
            bom_checked: false,
        }
    }

    /// Last `id:` seen on the stream.
    #[must_use]
    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    /// Reconnection delay advertised by the server, in milliseconds.
    #[must_use]
    pub const fn retry_ms(&self) -> Option<u64> {
        self.retry_ms
    }

    fn process_line(&mut self, line: &str, frames: &mut Vec<RawFrame>) {
        let line = if self.bom_checked {
            line
        } else {
            self.bom_checked = true;
            line.strip_prefix('\u{FEFF}').unwrap_or(line)
        };

        if line.is_empty() {
            self.dispatch(frames);
            return;
        }
        if line.starts_with(':') {
            return;
        }

        match split_field(line) {
            ("event", value) => self.event_type = Some(value.to_string()),
            ("data", value) => {
                if self.has_data {
                    self.data.push('\n');
                }
                self.data.push_str(value);
                self.has_data = true;
            }
            ("id", value) => {
                if !value.contains('\0') {
                    self.last_event_id = Some(value.to_string());
                }
            }
            ("retry", value) => {
                if let Ok(ms) = value.parse() {
                    self.retry_ms = Some(ms);
                }
            }
            _ => {}
        }
    }

    fn dispatch(&mut self, frames: &mut Vec<RawFrame>) {
        let event_type = self.event_type.take();
        if !std::mem::take(&mut self.has_data) {
            return;
        }
        let event_type = event_type
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_EVENT_TYPE.to_string());
        frames.push(RawFrame {
            event_type,
            data: std::mem::take(&mut self.data),
        });
    }
}

impl Default for EventStreamFraming {
    fn default() -> Self {
        Self::new()
    }
}

impl Framing for EventStreamFraming {
    fn feed(&mut self, chunk: &[u8]) -> Vec<RawFrame> {
        let mut frames = Vec::new();
        for line in self.lines.feed(chunk) {
            self.process_line(&line, &mut frames);
        }
        frames
    }

    fn finish(&mut self) -> usize {
        let pending = self.lines.clear() + self.data.len();
        self.event_type = None;
        self.data.clear();
        self.has_data = false;
        pending
    }
}
