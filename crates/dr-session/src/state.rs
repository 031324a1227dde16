//! Session State and its reducer.
//!
//! [`SessionState::apply`] is the only mutation path. It is shared by every
//! transport: the initial stream, resume streams, and the controller's own
//! lifecycle actions all end up here.

use std::collections::BTreeMap;

use dr_core::entities::{LogEntry, PlanItem, Report, Task};
use dr_core::enums::SessionStatus;
use dr_core::errors::CoreError;
use dr_core::ids::ThreadId;
use serde::Serialize;

use crate::action::Action;

pub const CONNECTED_MESSAGE: &str = "Connected, research starting...";
pub const COMPLETED_MESSAGE: &str = "All tasks completed.";
pub const CANCELLED_MESSAGE: &str = "Research cancelled.";
pub const STREAM_ENDED_MESSAGE: &str = "Connection dropped before the research finished.";

/// What the controller must do with the active transport after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Continue,
    CloseTransport,
}

/// The single source of truth for one research session.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    thread_id: Option<ThreadId>,
    goal: Option<String>,
    status: SessionStatus,
    log: Vec<LogEntry>,
    tasks: BTreeMap<u64, Task>,
    plan: Option<Vec<PlanItem>>,
    report: Report,
}

/// Read-only copy of the state handed to renderers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub thread_id: Option<ThreadId>,
    pub goal: Option<String>,
    pub status: SessionStatus,
    pub log: Vec<LogEntry>,
    /// Ordered by `task_id`.
    pub tasks: Vec<Task>,
    pub plan: Option<Vec<PlanItem>>,
    pub report: Report,
}

impl SessionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn thread_id(&self) -> Option<&ThreadId> {
        self.thread_id.as_ref()
    }

    #[must_use]
    pub fn goal(&self) -> Option<&str> {
        self.goal.as_deref()
    }

    #[must_use]
    pub const fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    #[must_use]
    pub const fn tasks(&self) -> &BTreeMap<u64, Task> {
        &self.tasks
    }

    #[must_use]
    pub fn plan(&self) -> Option<&[PlanItem]> {
        self.plan.as_deref()
    }

    #[must_use]
    pub const fn report(&self) -> &Report {
        &self.report
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            thread_id: self.thread_id.clone(),
            goal: self.goal.clone(),
            status: self.status,
            log: self.log.clone(),
            tasks: self.tasks.values().cloned().collect(),
            plan: self.plan.clone(),
            report: self.report.clone(),
        }
    }

    /// Apply one action.
    ///
    /// Either the whole action takes effect or, on error, nothing changes.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidTransition`] when the action would move the
    ///   status along an edge the state machine does not have.
    /// - [`CoreError::NotAccepted`] for `progress`/`report_token` outside
    ///   `running`, and for `reset` outside `idle`/`completed`.
    pub fn apply(&mut self, action: Action) -> Result<Effect, CoreError> {
        match action {
            Action::Reset { thread_id, goal } => {
                if !self.status.accepts_start() {
                    return Err(self.not_accepted("reset"));
                }
                *self = Self {
                    thread_id: Some(thread_id),
                    goal: Some(goal),
                    ..Self::default()
                };
                Ok(Effect::Continue)
            }
            Action::Begin => {
                self.transition(SessionStatus::Running)?;
                Ok(Effect::Continue)
            }
            Action::Resume => {
                self.check(SessionStatus::WaitingReview, SessionStatus::Running)?;
                self.plan = None;
                self.status = SessionStatus::Running;
                Ok(Effect::Continue)
            }
            Action::Connected => {
                self.require_running("connected")?;
                self.push_log(CONNECTED_MESSAGE);
                Ok(Effect::Continue)
            }
            Action::Log { message } => {
                self.push_log(message);
                Ok(Effect::Continue)
            }
            Action::Progress(patch) => {
                self.require_running("progress")?;
                self.tasks
                    .entry(patch.task_id)
                    .or_insert_with(|| Task::new(patch.task_id))
                    .merge(&patch);
                if let Some(message) = patch.message {
                    self.push_log(message);
                }
                Ok(Effect::Continue)
            }
            Action::Interrupt { plan, message } => {
                self.transition(SessionStatus::WaitingReview)?;
                self.plan = Some(plan);
                if let Some(message) = message {
                    self.push_log(message);
                }
                Ok(Effect::CloseTransport)
            }
            Action::ReportToken { token } => {
                self.require_running("report_token")?;
                self.report.push_token(&token);
                Ok(Effect::Continue)
            }
            Action::Done { report } => {
                self.transition(SessionStatus::Completed)?;
                if let Some(report) = report {
                    self.report.fill_if_empty(&report);
                }
                self.push_log(COMPLETED_MESSAGE);
                Ok(Effect::CloseTransport)
            }
            Action::BackendError { error } => {
                self.check(SessionStatus::Running, SessionStatus::Idle)?;
                self.status = SessionStatus::Idle;
                self.push_log(format!("Backend error: {error}"));
                Ok(Effect::CloseTransport)
            }
            Action::TransportLost { reason } => {
                if self.status == SessionStatus::Running {
                    self.status = SessionStatus::Idle;
                }
                self.push_log(reason);
                Ok(Effect::CloseTransport)
            }
            Action::Cancelled => {
                if self.status == SessionStatus::Running {
                    self.status = SessionStatus::Idle;
                    self.push_log(CANCELLED_MESSAGE);
                }
                Ok(Effect::CloseTransport)
            }
        }
    }

    // ----------------------------------------------------------------

    fn push_log(&mut self, message: impl Into<String>) {
        self.log.push(LogEntry::now(message));
    }

    fn transition(&mut self, to: SessionStatus) -> Result<(), CoreError> {
        if !self.status.can_transition_to(to) {
            return Err(CoreError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    /// Guard for actions valid only on one specific edge.
    fn check(&self, from: SessionStatus, to: SessionStatus) -> Result<(), CoreError> {
        if self.status == from && from.can_transition_to(to) {
            Ok(())
        } else {
            Err(CoreError::InvalidTransition {
                from: self.status,
                to,
            })
        }
    }

    fn require_running(&self, action: &'static str) -> Result<(), CoreError> {
        if self.status == SessionStatus::Running {
            Ok(())
        } else {
            Err(self.not_accepted(action))
        }
    }

    const fn not_accepted(&self, action: &'static str) -> CoreError {
        CoreError::NotAccepted {
            action,
            status: self.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dr_core::entities::TaskPatch;
    use dr_core::enums::TaskStatus;
    use pretty_assertions::assert_eq;

    fn running() -> SessionState {
        let mut state = SessionState::new();
        state
            .apply(Action::Reset {
                thread_id: ThreadId::from_raw("thread_test"),
                goal: "G".into(),
            })
            .unwrap();
        state.apply(Action::Begin).unwrap();
        state
    }

    fn patch(task_id: u64) -> TaskPatch {
        TaskPatch {
            task_id,
            title: None,
            status: None,
            message: None,
            summary: None,
        }
    }

    fn messages(state: &SessionState) -> Vec<&str> {
        state.log().iter().map(|e| e.message.as_str()).collect()
    }

    #[test]
    fn progress_merges_instead_of_replacing() {
        let mut state = running();
        state
            .apply(Action::Progress(TaskPatch {
                title: Some("T1".into()),
                status: Some(TaskStatus::Researching),
                ..patch(1)
            }))
            .unwrap();
        state
            .apply(Action::Progress(TaskPatch {
                status: Some(TaskStatus::Completed),
                summary: Some("done".into()),
                ..patch(1)
            }))
            .unwrap();

        let task = &state.tasks()[&1];
        assert_eq!(task.title.as_deref(), Some("T1"));
        assert_eq!(task.status, Some(TaskStatus::Completed));
        assert_eq!(task.summary.as_deref(), Some("done"));
        assert!(state.log().is_empty());
    }

    #[test]
    fn progress_message_is_logged() {
        let mut state = running();
        state
            .apply(Action::Progress(TaskPatch {
                message: Some("searching".into()),
                ..patch(2)
            }))
            .unwrap();
        assert_eq!(messages(&state), vec!["searching"]);
        assert_eq!(state.tasks()[&2].message.as_deref(), Some("searching"));
    }

    #[test]
    fn interrupt_keeps_tasks_and_report() {
        let mut state = running();
        state.apply(Action::Progress(patch(1))).unwrap();
        state
            .apply(Action::ReportToken {
                token: "draft".into(),
            })
            .unwrap();

        let effect = state
            .apply(Action::Interrupt {
                plan: vec![],
                message: Some("Please review the plan".into()),
            })
            .unwrap();

        assert_eq!(effect, Effect::CloseTransport);
        assert_eq!(state.status(), SessionStatus::WaitingReview);
        assert_eq!(state.plan(), Some(&[][..]));
        assert_eq!(state.tasks().len(), 1);
        assert_eq!(state.report().as_str(), "draft");
        assert_eq!(messages(&state), vec!["Please review the plan"]);
    }

    #[test]
    fn no_progress_or_tokens_after_interrupt() {
        let mut state = running();
        state
            .apply(Action::Interrupt {
                plan: vec![],
                message: None,
            })
            .unwrap();

        let before = state.snapshot();
        assert!(matches!(
            state.apply(Action::Progress(patch(9))),
            Err(CoreError::NotAccepted { action: "progress", .. })
        ));
        assert!(matches!(
            state.apply(Action::ReportToken { token: "x".into() }),
            Err(CoreError::NotAccepted { .. })
        ));
        assert_eq!(state.snapshot(), before);
    }

    #[test]
    fn resume_clears_plan() {
        let mut state = running();
        state
            .apply(Action::Interrupt {
                plan: vec![],
                message: None,
            })
            .unwrap();
        state.apply(Action::Resume).unwrap();
        assert_eq!(state.status(), SessionStatus::Running);
        assert_eq!(state.plan(), None);
    }

    #[test]
    fn resume_outside_review_is_rejected() {
        let mut state = running();
        assert!(matches!(
            state.apply(Action::Resume),
            Err(CoreError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn done_completes_and_fills_empty_report() {
        let mut state = running();
        let effect = state
            .apply(Action::Done {
                report: Some("# Report".into()),
            })
            .unwrap();
        assert_eq!(effect, Effect::CloseTransport);
        assert_eq!(state.status(), SessionStatus::Completed);
        assert_eq!(state.report().as_str(), "# Report");
        assert_eq!(messages(&state), vec![COMPLETED_MESSAGE]);
    }

    #[test]
    fn done_never_overwrites_streamed_report() {
        let mut state = running();
        state
            .apply(Action::ReportToken {
                token: "streamed".into(),
            })
            .unwrap();
        state
            .apply(Action::Done {
                report: Some("other".into()),
            })
            .unwrap();
        assert_eq!(state.report().as_str(), "streamed");
    }

    #[test]
    fn backend_error_returns_to_idle_keeping_context() {
        let mut state = running();
        state.apply(Action::Progress(patch(1))).unwrap();
        state
            .apply(Action::BackendError {
                error: "timeout".into(),
            })
            .unwrap();
        assert_eq!(state.status(), SessionStatus::Idle);
        assert_eq!(state.tasks().len(), 1);
        assert!(messages(&state)[0].contains("timeout"));
    }

    #[test]
    fn terminal_frames_outside_running_are_rejected() {
        let mut state = SessionState::new();
        assert!(state.apply(Action::Done { report: None }).is_err());
        assert!(
            state
                .apply(Action::BackendError {
                    error: "x".into()
                })
                .is_err()
        );
        assert!(
            state
                .apply(Action::Interrupt {
                    plan: vec![],
                    message: None
                })
                .is_err()
        );
        assert_eq!(state.status(), SessionStatus::Idle);
        assert!(state.log().is_empty());
    }

    #[test]
    fn reset_from_completed_starts_fresh() {
        let mut state = running();
        state.apply(Action::ReportToken { token: "r".into() }).unwrap();
        state.apply(Action::Done { report: None }).unwrap();

        state
            .apply(Action::Reset {
                thread_id: ThreadId::from_raw("thread_next"),
                goal: "H".into(),
            })
            .unwrap();

        assert_eq!(state.status(), SessionStatus::Idle);
        assert_eq!(state.thread_id().map(ThreadId::as_str), Some("thread_next"));
        assert_eq!(state.goal(), Some("H"));
        assert!(state.report().is_empty());
        assert!(state.log().is_empty());
    }

    #[test]
    fn reset_is_refused_mid_session() {
        let mut state = running();
        let err = state
            .apply(Action::Reset {
                thread_id: ThreadId::from_raw("thread_other"),
                goal: "x".into(),
            })
            .unwrap_err();
        assert!(matches!(err, CoreError::NotAccepted { action: "reset", .. }));
        assert_eq!(state.thread_id().map(ThreadId::as_str), Some("thread_test"));
    }

    #[test]
    fn cancel_only_changes_status_while_running() {
        let mut idle = SessionState::new();
        assert_eq!(idle.apply(Action::Cancelled).unwrap(), Effect::CloseTransport);
        assert!(idle.log().is_empty());

        let mut state = running();
        state.apply(Action::Cancelled).unwrap();
        assert_eq!(state.status(), SessionStatus::Idle);
        assert_eq!(messages(&state), vec![CANCELLED_MESSAGE]);
    }

    #[test]
    fn log_is_accepted_in_every_status() {
        let mut state = SessionState::new();
        state.apply(Action::Log { message: "a".into() }).unwrap();
        let mut state = running();
        state
            .apply(Action::Interrupt {
                plan: vec![],
                message: None,
            })
            .unwrap();
        state.apply(Action::Log { message: "b".into() }).unwrap();
        assert_eq!(messages(&state), vec!["b"]);
    }

    #[test]
    fn snapshot_orders_tasks_by_id() {
        let mut state = running();
        for id in [3, 1, 2] {
            state.apply(Action::Progress(patch(id))).unwrap();
        }
        let ids: Vec<u64> = state.snapshot().tasks.iter().map(|t| t.task_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
