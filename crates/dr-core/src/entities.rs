//! Session entities: log entries, tasks, plan items, and the report buffer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::TaskStatus;

/// One append-only line of the session log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl LogEntry {
    #[must_use]
    pub fn now(message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            message: message.into(),
        }
    }
}

/// A unit of sub-research, keyed by `task_id` within a session.
///
/// Built up from successive [`TaskPatch`]es; fields absent from a later patch
/// keep their earlier value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    /// Latest progress note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Present once the task has completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl Task {
    #[must_use]
    pub const fn new(task_id: u64) -> Self {
        Self {
            task_id,
            title: None,
            status: None,
            message: None,
            summary: None,
        }
    }

    /// Shallow-merge a patch: every field present in `patch` overwrites,
    /// every absent field is left untouched.
    pub fn merge(&mut self, patch: &TaskPatch) {
        if let Some(title) = &patch.title {
            self.title = Some(title.clone());
        }
        if let Some(status) = patch.status {
            self.status = Some(status);
        }
        if let Some(message) = &patch.message {
            self.message = Some(message.clone());
        }
        if let Some(summary) = &patch.summary {
            self.summary = Some(summary.clone());
        }
    }
}

/// Partial task update, the payload of a `progress` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    pub task_id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

/// One proposed research task awaiting human review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanItem {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub intent: String,
    #[serde(default)]
    pub query: String,
}

/// Accumulating report text. Append-only: nothing removes or reorders
/// content once pushed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Report(String);

impl Report {
    pub fn push_token(&mut self, token: &str) {
        self.0.push_str(token);
    }

    /// Adopt `text` as the whole report, only if nothing has been streamed yet.
    /// Returns whether the text was adopted.
    pub fn fill_if_empty(&mut self, text: &str) -> bool {
        if self.0.is_empty() && !text.is_empty() {
            self.0.push_str(text);
            return true;
        }
        false
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Presentation view without the markdown code fence the writer model
    /// tends to wrap its output in.
    #[must_use]
    pub fn cleaned(&self) -> &str {
        let mut text = self.0.as_str();
        if let Some(rest) = text.strip_prefix("```") {
            let rest = strip_prefix_ignore_ascii_case(rest, "markdown").unwrap_or(rest);
            text = rest.trim_start();
        }
        let trimmed = text.trim_end();
        if let Some(rest) = trimmed.strip_suffix("```") {
            text = rest;
        }
        text
    }
}

fn strip_prefix_ignore_ascii_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &text[prefix.len()..])
}
