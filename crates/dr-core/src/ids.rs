//! Thread identity for research sessions.
//!
//! A thread id is generated once per `start` and sent unchanged on every
//! resume request, so the backend can correlate the paused and the resumed
//! stream as one logical session.
//!
//! Format: `thread_{unix_millis}_{8 hex chars}`. The random suffix keeps two
//! sessions started within the same millisecond apart.

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Prefix for generated thread ids.
pub const THREAD_ID_PREFIX: &str = "thread_";

/// Opaque, stable identifier of one research session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadId(String);

impl ThreadId {
    /// Generate a fresh thread id.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ThreadId`] if the OS random source is unavailable.
    pub fn generate() -> Result<Self, CoreError> {
        let mut suffix = [0u8; 4];
        getrandom::fill(&mut suffix).map_err(|e| CoreError::ThreadId(e.to_string()))?;
        let suffix: String = suffix.iter().map(|b| format!("{b:02x}")).collect();
        Ok(Self(format!(
            "{THREAD_ID_PREFIX}{}_{suffix}",
            Utc::now().timestamp_millis()
        )))
    }

    /// Wrap an existing id (e.g. one received from a caller).
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ThreadId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
