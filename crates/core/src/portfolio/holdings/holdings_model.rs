use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::SymbolType;

/// Net position in one symbol after folding the ledger.
///
/// Derived on every projection run and never mutated in place by callers;
/// only a split adjustment produces a modified copy.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub symbol: String,
    pub symbol_type: SymbolType,
    pub units: u64,
    /// Weighted-average cost basis of the units held, fees included.
    pub invested_total: Decimal,
    /// `invested_total / units`.
    pub break_even_price: Decimal,
}

impl Holding {
    pub fn is_crypto(&self) -> bool {
        self.symbol_type == SymbolType::Crypto
    }

    pub fn market_value(&self, price: Decimal) -> Decimal {
        Decimal::from(self.units) * price
    }
}

/// Realized P&L of one SELL, measured against the weighted-average cost.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RealizedGain {
    pub transaction_id: String,
    pub symbol: String,
    /// Proceeds net of fees minus the cost basis removed.
    pub return_value: Decimal,
    /// `return_value / cost_removed`.
    pub return_change: Decimal,
    pub cost_removed: Decimal,
}

/// Output of a full projection: surviving holdings plus every realized gain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HoldingsProjection {
    pub holdings: Vec<Holding>,
    pub realized_gains: Vec<RealizedGain>,
}

impl HoldingsProjection {
    pub fn holding(&self, symbol: &str) -> Option<&Holding> {
        self.holdings.iter().find(|h| h.symbol == symbol)
    }

    pub fn total_realized(&self) -> Decimal {
        self.realized_gains.iter().map(|g| g.return_value).sum()
    }
}

/// Holdings persisted next to the portfolio state.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HoldingSnapshot {
    #[serde(default)]
    pub holdings: Vec<Holding>,
    pub last_modified: DateTime<Utc>,
}

impl HoldingSnapshot {
    pub fn new(holdings: Vec<Holding>, last_modified: DateTime<Utc>) -> Self {
        Self {
            holdings,
            last_modified,
        }
    }
}
