//! Front-end behaviour settings.

use serde::{Deserialize, Serialize};

/// Log lines shown in the run summary.
const fn default_log_tail() -> usize {
    20
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Approve every plan without prompting.
    #[serde(default)]
    pub auto_approve: bool,

    /// Number of trailing session log lines printed after a run.
    #[serde(default = "default_log_tail")]
    pub log_tail: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            auto_approve: false,
            log_tail: default_log_tail(),
        }
    }
}
