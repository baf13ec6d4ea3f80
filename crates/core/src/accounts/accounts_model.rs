//! Account domain models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A simulator user as seen by the batch jobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub user_id: String,
    /// Overrides the engine default when set.
    #[serde(default)]
    pub starting_cash: Option<Decimal>,
    /// Trading date of the last successful nightly update.
    #[serde(default)]
    pub last_portfolio_update: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    pub fn new(user_id: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            starting_cash: None,
            last_portfolio_update: None,
            created_at,
        }
    }

    pub fn starting_cash_or(&self, default: Decimal) -> Decimal {
        self.starting_cash.unwrap_or(default)
    }

    /// True until the nightly update has run for `today`.
    pub fn needs_update(&self, today: NaiveDate) -> bool {
        self.last_portfolio_update
            .map_or(true, |last| last < today)
    }
}
