//! Event Router: maps decoded frames onto reducer actions.
//!
//! | event          | action                         |
//! |----------------|--------------------------------|
//! | `log`          | [`Action::Log`]                |
//! | `progress`     | [`Action::Progress`]           |
//! | `interrupt`    | [`Action::Interrupt`]          |
//! | `report_token` | [`Action::ReportToken`]        |
//! | `done`         | [`Action::Done`]               |
//! | `error`        | [`Action::BackendError`]       |
//!
//! Unknown event types route to nothing, so newer backends can add events
//! without breaking older clients.

use dr_core::entities::{PlanItem, TaskPatch};
use dr_core::ids::ThreadId;
use dr_stream::Frame;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::RouteError;

/// Wire names of the protocol's event types.
pub mod event_types {
    pub const LOG: &str = "log";
    pub const PROGRESS: &str = "progress";
    pub const INTERRUPT: &str = "interrupt";
    pub const REPORT_TOKEN: &str = "report_token";
    pub const DONE: &str = "done";
    pub const ERROR: &str = "error";
}

/// Everything that can change a [`SessionState`](crate::SessionState).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // ── Routed from stream frames ──────────────────────────────────
    Log {
        message: String,
    },
    Progress(TaskPatch),
    Interrupt {
        plan: Vec<PlanItem>,
        message: Option<String>,
    },
    ReportToken {
        token: String,
    },
    Done {
        report: Option<String>,
    },
    BackendError {
        error: String,
    },

    // ── Issued by the controller ───────────────────────────────────
    /// Begin a fresh session: new identity, everything cleared.
    Reset {
        thread_id: ThreadId,
        goal: String,
    },
    /// The initial stream is being opened.
    Begin,
    /// A review decision was sent; the resume stream is being opened.
    Resume,
    /// The initial stream opened successfully.
    Connected,
    /// The transport failed to open, failed mid-read, or ended early.
    TransportLost {
        reason: String,
    },
    /// The caller tore the transport down.
    Cancelled,
}

#[derive(Deserialize)]
struct LogPayload {
    message: String,
}

#[derive(Deserialize)]
struct InterruptPayload {
    data: Vec<PlanItem>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct ReportTokenPayload {
    token: String,
}

#[derive(Deserialize)]
struct DonePayload {
    #[serde(default)]
    report: Option<String>,
}

#[derive(Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    error: Value,
}

impl ErrorPayload {
    fn into_message(self) -> String {
        match self.error {
            Value::String(message) => message,
            Value::Null => "unknown error".to_string(),
            other => other.to_string(),
        }
    }
}

impl Action {
    /// Route a research-stream frame.
    ///
    /// Returns `Ok(None)` for unknown event types.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError`] when a known event carries a payload of the
    /// wrong shape; the caller drops the frame.
    pub fn from_frame(frame: &Frame) -> Result<Option<Self>, RouteError> {
        let action = match frame.event_type.as_str() {
            event_types::LOG => {
                let payload: LogPayload = parse(frame)?;
                Self::Log {
                    message: payload.message,
                }
            }
            event_types::PROGRESS => Self::Progress(parse(frame)?),
            event_types::INTERRUPT => {
                let payload: InterruptPayload = parse(frame)?;
                Self::Interrupt {
                    plan: payload.data,
                    message: payload.message,
                }
            }
            event_types::REPORT_TOKEN => {
                let payload: ReportTokenPayload = parse(frame)?;
                Self::ReportToken {
                    token: payload.token,
                }
            }
            event_types::DONE => {
                let payload: DonePayload = parse(frame)?;
                Self::Done {
                    report: payload.report,
                }
            }
            event_types::ERROR => {
                let payload: ErrorPayload = parse(frame)?;
                Self::BackendError {
                    error: payload.into_message(),
                }
            }
            _ => return Ok(None),
        };
        Ok(Some(action))
    }

    /// Route a frame from the document-ingestion stream.
    ///
    /// Ingestion only feeds the session log: `log` becomes a log entry and
    /// `error` becomes an error log entry. Nothing here touches status,
    /// tasks, plan, or report.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError`] when a `log` or `error` payload has the wrong shape.
    pub fn from_ingest_frame(frame: &Frame) -> Result<Option<Self>, RouteError> {
        let message = match frame.event_type.as_str() {
            event_types::LOG => parse::<LogPayload>(frame)?.message,
            event_types::ERROR => {
                format!("Ingestion error: {}", parse::<ErrorPayload>(frame)?.into_message())
            }
            _ => return Ok(None),
        };
        Ok(Some(Self::Log { message }))
    }

    /// Short name for diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Log { .. } => "log",
            Self::Progress(_) => "progress",
            Self::Interrupt { .. } => "interrupt",
            Self::ReportToken { .. } => "report_token",
            Self::Done { .. } => "done",
            Self::BackendError { .. } => "error",
            Self::Reset { .. } => "reset",
            Self::Begin => "begin",
            Self::Resume => "resume",
            Self::Connected => "connected",
            Self::TransportLost { .. } => "transport_lost",
            Self::Cancelled => "cancelled",
        }
    }
}

fn parse<T: DeserializeOwned>(frame: &Frame) -> Result<T, RouteError> {
    T::deserialize(&frame.payload).map_err(|source| RouteError {
        event_type: frame.event_type.clone(),
        source,
    })
}
