//! Engine tuning knobs shared by the batch services.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::orders::FeeSchedule;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSettings {
    /// Cash a new or reset account starts with.
    pub starting_cash: Decimal,
    pub fee_schedule: FeeSchedule,
    /// Users picked per nightly run.
    pub nightly_batch_size: usize,
    /// Users processed concurrently within one run.
    pub user_concurrency: usize,
    /// Symbols fetched per historical-price group.
    pub historical_batch_size: usize,
    /// Pause between historical-price groups, in seconds.
    pub historical_batch_delay_secs: u64,
    /// Attempts per user transaction before giving up on contention.
    pub transaction_max_attempts: u32,
}

impl EngineSettings {
    pub fn historical_batch_delay(&self) -> Duration {
        Duration::from_secs(self.historical_batch_delay_secs)
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            starting_cash: Decimal::from(DEFAULT_STARTING_CASH),
            fee_schedule: FeeSchedule::default(),
            nightly_batch_size: DEFAULT_NIGHTLY_BATCH_SIZE,
            user_concurrency: DEFAULT_USER_CONCURRENCY,
            historical_batch_size: DEFAULT_HISTORICAL_BATCH_SIZE,
            historical_batch_delay_secs: DEFAULT_HISTORICAL_BATCH_DELAY_SECS,
            transaction_max_attempts: DEFAULT_TRANSACTION_MAX_ATTEMPTS,
        }
    }
}
