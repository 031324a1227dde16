//! # dr-session
//!
//! The session controller for human-in-the-loop research workflows.
//!
//! - [`Action`]: the Event Router's output. Every decoded frame maps to at
//!   most one action; commands and transport lifecycle events are actions too.
//! - [`SessionState`]: the single source of truth, changed only through
//!   [`SessionState::apply`].
//! - [`Transport`]: the seam to whatever carries frames. Implementations pick
//!   the framing; the controller never knows which one was used.
//! - [`SessionController`]: owns the state and the one open transport, and
//!   exposes `start` / `approve` / `revise` / `cancel` / `ingest`.

mod action;
mod controller;
mod error;
mod state;
mod transport;

pub use action::{Action, event_types};
pub use controller::{SessionController, Update};
pub use error::{CommandError, RouteError};
pub use state::{
    CANCELLED_MESSAGE, COMPLETED_MESSAGE, CONNECTED_MESSAGE, Effect, STREAM_ENDED_MESSAGE,
    SessionSnapshot, SessionState,
};
pub use transport::{ReviewRequest, StreamRequest, Transport};
