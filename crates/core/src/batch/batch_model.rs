use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// One user whose unit of work failed this run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFailure {
    pub user_id: String,
    pub error: String,
    /// Ledger fault (e.g. an oversold holding) rather than a transient one.
    pub data_integrity: bool,
}

/// Completion signal of a batch entry point. Always returned, even when
/// some users failed; the next scheduled run is the retry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub succeeded: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<UserFailure>,
}

impl BatchReport {
    pub fn record_success(&mut self, user_id: impl Into<String>) {
        self.succeeded.push(user_id.into());
    }

    pub fn record_skip(&mut self, user_id: impl Into<String>) {
        self.skipped.push(user_id.into());
    }

    pub fn record_failure(&mut self, user_id: impl Into<String>, error: &Error) {
        self.failed.push(UserFailure {
            user_id: user_id.into(),
            error: error.to_string(),
            data_integrity: error.is_data_integrity(),
        });
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.skipped.len() + self.failed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}
