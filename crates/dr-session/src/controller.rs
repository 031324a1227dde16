//! Session Controller: owns the state and the single active transport.
//!
//! Commands take `&mut self`, so only one `start`/`approve`/`revise` can be
//! in flight per controller; a second call is rejected at compile time
//! rather than queued.

use std::path::Path;

use dr_core::enums::{ReviewAction, SessionStatus};
use dr_core::ids::ThreadId;
use dr_stream::BoxFrameStream;
use futures_util::StreamExt;

use crate::action::Action;
use crate::error::CommandError;
use crate::state::{Effect, STREAM_ENDED_MESSAGE, SessionSnapshot, SessionState};
use crate::transport::{ReviewRequest, StreamRequest, Transport};

/// One applied action and the status it left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    pub action: Action,
    pub status: SessionStatus,
}

pub struct SessionController<T> {
    transport: T,
    state: SessionState,
    active: Option<BoxFrameStream>,
}

impl<T: Transport> SessionController<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            state: SessionState::new(),
            active: None,
        }
    }

    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.snapshot()
    }

    pub const fn transport(&self) -> &T {
        &self.transport
    }

    pub const fn has_open_transport(&self) -> bool {
        self.active.is_some()
    }

    // ── Commands ───────────────────────────────────────────────────

    /// Start a new research session for `goal`.
    ///
    /// Returns the fresh thread id. A transport that fails to open is not an
    /// error here: it is logged into the session and the status returns to
    /// `idle`.
    ///
    /// # Errors
    ///
    /// - [`CommandError::Validation`] for an empty or whitespace-only goal.
    /// - [`CommandError::InvalidState`] unless the session is `idle` or `completed`.
    /// - [`CommandError::Inconsistent`] after an abandoned command.
    pub async fn start(&mut self, goal: &str) -> Result<ThreadId, CommandError> {
        self.ensure_consistent()?;
        let status = self.state.status();
        if !status.accepts_start() {
            return Err(CommandError::InvalidState {
                command: "start",
                status,
            });
        }
        if goal.trim().is_empty() {
            return Err(CommandError::Validation("goal must not be empty".into()));
        }

        let thread_id = ThreadId::generate()?;
        self.state.apply(Action::Reset {
            thread_id: thread_id.clone(),
            goal: goal.to_string(),
        })?;
        self.state.apply(Action::Begin)?;
        tracing::debug!(thread_id = %thread_id, "session: starting");

        self.open(StreamRequest::Start {
            thread_id: thread_id.clone(),
            goal: goal.to_string(),
        })
        .await?;
        Ok(thread_id)
    }

    /// Accept the pending plan and resume the workflow.
    ///
    /// # Errors
    ///
    /// [`CommandError::InvalidState`] unless the session is `waiting_review`;
    /// [`CommandError::Inconsistent`] after an abandoned command.
    pub async fn approve(&mut self) -> Result<(), CommandError> {
        self.ensure_consistent()?;
        self.require_review("approve")?;
        self.resume(ReviewAction::Approve, None).await
    }

    /// Send revision feedback on the pending plan and resume the workflow.
    ///
    /// # Errors
    ///
    /// [`CommandError::InvalidState`] unless the session is `waiting_review`;
    /// [`CommandError::Validation`] for empty or whitespace-only feedback;
    /// [`CommandError::Inconsistent`] after an abandoned command.
    pub async fn revise(&mut self, feedback: &str) -> Result<(), CommandError> {
        self.ensure_consistent()?;
        self.require_review("revise")?;
        if feedback.trim().is_empty() {
            return Err(CommandError::Validation(
                "revision feedback must not be empty".into(),
            ));
        }
        self.resume(ReviewAction::Revise, Some(feedback.to_string()))
            .await
    }

    /// Close any open transport. The status only changes when the session
    /// was `running`; in-flight frames are discarded.
    pub fn cancel(&mut self) {
        let closed = self.close_transport();
        if let Err(error) = self.state.apply(Action::Cancelled) {
            tracing::warn!(%error, "session: cancel not applied");
        }
        tracing::debug!(closed, status = %self.state.status(), "session: cancelled");
    }

    /// Upload a document and fold its progress into the session log.
    ///
    /// Never touches status, tasks, plan, or report. Upload failures are
    /// logged into the session rather than returned; the result says
    /// whether the upload stream ran to completion.
    ///
    /// # Errors
    ///
    /// [`CommandError::Busy`] while a research stream is running.
    pub async fn ingest(&mut self, path: &Path) -> Result<bool, CommandError> {
        if self.state.status() == SessionStatus::Running {
            return Err(CommandError::Busy);
        }
        let name = path.file_name().map_or_else(
            || path.display().to_string(),
            |name| name.to_string_lossy().into_owned(),
        );
        self.log(format!("Uploading file: {name}"));

        let mut stream = match self.transport.upload(path).await {
            Ok(stream) => stream,
            Err(error) => {
                self.log(format!("Upload failed: {error}"));
                return Ok(false);
            }
        };

        while let Some(item) = stream.next().await {
            match item {
                Ok(frame) => match Action::from_ingest_frame(&frame) {
                    Ok(Some(action)) => {
                        if let Err(error) = self.state.apply(action) {
                            tracing::warn!(%error, "ingest: action not applied");
                        }
                    }
                    Ok(None) => {
                        tracing::debug!(event_type = %frame.event_type, "ingest: ignoring event");
                    }
                    Err(error) => tracing::warn!(%error, "ingest: dropping frame"),
                },
                Err(error) => {
                    self.log(format!("Upload failed: {error}"));
                    return Ok(false);
                }
            }
        }

        self.log(format!("File {name} processing finished"));
        Ok(true)
    }

    // ── Stream consumption ─────────────────────────────────────────

    /// Apply the next routed frame from the active transport.
    ///
    /// Returns `None` once no transport is open: after `interrupt`, `done`,
    /// `error`, a cancel, or the stream ending. Frames that fail to route or
    /// that the state refuses are dropped and reading continues.
    pub async fn next_update(&mut self) -> Option<Update> {
        loop {
            let stream = self.active.as_mut()?;
            match stream.next().await {
                Some(Ok(frame)) => {
                    let action = match Action::from_frame(&frame) {
                        Ok(Some(action)) => action,
                        Ok(None) => {
                            tracing::debug!(event_type = %frame.event_type, "session: ignoring unknown event");
                            continue;
                        }
                        Err(error) => {
                            tracing::warn!(%error, "session: dropping frame");
                            continue;
                        }
                    };
                    match self.state.apply(action.clone()) {
                        Ok(effect) => {
                            if effect == Effect::CloseTransport {
                                self.close_transport();
                            }
                            return Some(self.update(action));
                        }
                        Err(error) => {
                            tracing::warn!(%error, action = action.name(), "session: frame not applied");
                        }
                    }
                }
                Some(Err(error)) => {
                    return Some(self.lose_transport(format!("Connection dropped: {error}")));
                }
                None => {
                    if self.state.status() == SessionStatus::Running {
                        return Some(self.lose_transport(STREAM_ENDED_MESSAGE.to_string()));
                    }
                    self.active = None;
                    return None;
                }
            }
        }
    }

    /// Drain the active transport and return the status it settled in.
    pub async fn run(&mut self) -> SessionStatus {
        while self.next_update().await.is_some() {}
        self.state.status()
    }

    // ----------------------------------------------------------------

    async fn resume(
        &mut self,
        action: ReviewAction,
        feedback: Option<String>,
    ) -> Result<(), CommandError> {
        let thread_id = self
            .state
            .thread_id()
            .cloned()
            .ok_or(CommandError::InvalidState {
                command: action.as_str(),
                status: self.state.status(),
            })?;
        self.state.apply(Action::Resume)?;
        tracing::debug!(thread_id = %thread_id, action = %action, "session: resuming");

        self.open(StreamRequest::Resume(ReviewRequest {
            thread_id,
            action,
            feedback,
        }))
        .await
    }

    /// Open a transport for `request`; the session must already be `running`.
    async fn open(&mut self, request: StreamRequest) -> Result<(), CommandError> {
        if self.close_transport() {
            tracing::warn!("session: closed a transport left open before reopening");
        }
        match self.transport.open(&request).await {
            Ok(stream) => {
                self.active = Some(stream);
                if !request.is_resume() {
                    self.state.apply(Action::Connected)?;
                }
            }
            Err(error) => {
                tracing::warn!(%error, thread_id = %request.thread_id(), "session: transport failed to open");
                let reason = if request.is_resume() {
                    format!("Resume failed: {error}")
                } else {
                    format!("Connection failed: {error}")
                };
                self.state.apply(Action::TransportLost { reason })?;
            }
        }
        Ok(())
    }

    fn lose_transport(&mut self, reason: String) -> Update {
        self.active = None;
        let action = Action::TransportLost { reason };
        if let Err(error) = self.state.apply(action.clone()) {
            tracing::warn!(%error, "session: transport loss not applied");
        }
        self.update(action)
    }

    /// Drop the active stream, if any. Returns whether one was open.
    fn close_transport(&mut self) -> bool {
        self.active.take().is_some()
    }

    fn ensure_consistent(&self) -> Result<(), CommandError> {
        if self.state.status() == SessionStatus::Running && self.active.is_none() {
            return Err(CommandError::Inconsistent);
        }
        Ok(())
    }

    fn require_review(&self, command: &'static str) -> Result<(), CommandError> {
        let status = self.state.status();
        if status == SessionStatus::WaitingReview {
            Ok(())
        } else {
            Err(CommandError::InvalidState { command, status })
        }
    }

    fn log(&mut self, message: String) {
        if let Err(error) = self.state.apply(Action::Log { message }) {
            tracing::warn!(%error, "session: log entry not applied");
        }
    }

    fn update(&self, action: Action) -> Update {
        Update {
            action,
            status: self.state.status(),
        }
    }
}
