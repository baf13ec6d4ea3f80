//! Portfolio state domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::portfolio::holdings::HoldingSnapshot;

/// Cached financial snapshot of one account.
///
/// Always written whole by the computation that owns it; a failed run leaves
/// the previous value in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioState {
    /// `cash_on_hand + holdings_balance`
    pub balance: Decimal,
    pub cash_on_hand: Decimal,
    /// Market value of all holdings.
    pub holdings_balance: Decimal,
    /// Cost basis of all holdings.
    pub invested: Decimal,
    pub starting_cash: Decimal,
    /// Sum of every transaction's fee, both sides.
    pub transaction_fees: Decimal,
    pub number_of_executed_buy_transactions: u32,
    pub number_of_executed_sell_transactions: u32,
    /// `holdings_balance - invested`
    pub total_gains_value: Decimal,
    /// `total_gains_value / holdings_balance`, zero when nothing is held.
    pub total_gains_percentage: Decimal,
    #[serde(default)]
    pub first_transaction_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_transaction_date: Option<DateTime<Utc>>,
    pub modified_date: DateTime<Utc>,
}

impl PortfolioState {
    /// State of an account that only holds its starting cash.
    pub fn initial(starting_cash: Decimal, now: DateTime<Utc>) -> Self {
        Self {
            balance: starting_cash,
            cash_on_hand: starting_cash,
            holdings_balance: Decimal::ZERO,
            invested: Decimal::ZERO,
            starting_cash,
            transaction_fees: Decimal::ZERO,
            number_of_executed_buy_transactions: 0,
            number_of_executed_sell_transactions: 0,
            total_gains_value: Decimal::ZERO,
            total_gains_percentage: Decimal::ZERO,
            first_transaction_date: None,
            last_transaction_date: None,
            modified_date: now,
        }
    }

    /// Takes cash held for open BUY orders out of `cash_on_hand` and
    /// `balance`.
    pub fn reserve_cash(&mut self, reserved: Decimal) {
        self.cash_on_hand -= reserved;
        self.balance -= reserved;
    }
}

/// The per-user cache document: state plus the holdings it was computed from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioDetails {
    pub portfolio_state: PortfolioState,
    pub holding_snapshot: HoldingSnapshot,
}

impl PortfolioDetails {
    pub fn initial(starting_cash: Decimal, now: DateTime<Utc>) -> Self {
        Self {
            portfolio_state: PortfolioState::initial(starting_cash, now),
            holding_snapshot: HoldingSnapshot::new(Vec::new(), now),
        }
    }
}
