//! Outstanding order domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_FLAT_FEE, FEE_DECIMAL_PRECISION};
use crate::ledger::{SymbolType, Transaction, TransactionType};

/// Order lifecycle. An order moves from `Open` to `Closed` exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Open,
    Closed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Open => "OPEN",
            OrderStatus::Closed => "CLOSED",
        }
    }
}

/// Side of the order plus an optional limit condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderType {
    #[serde(rename = "type")]
    pub side: TransactionType,
    /// BUY fills at or below, SELL fills at or above. Market order when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_price: Option<Decimal>,
}

impl OrderType {
    pub fn market(side: TransactionType) -> Self {
        Self {
            side,
            limit_price: None,
        }
    }

    /// Whether the limit condition, if any, is met at `price`.
    pub fn is_fillable_at(&self, price: Decimal) -> bool {
        match (self.side, self.limit_price) {
            (_, None) => true,
            (TransactionType::Buy, Some(limit)) => price <= limit,
            (TransactionType::Sell, Some(limit)) => price >= limit,
        }
    }
}

/// A pending BUY/SELL instruction awaiting an execution pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutstandingOrder {
    pub order_id: String,
    pub user_id: String,
    pub symbol: String,
    #[serde(default)]
    pub symbol_type: SymbolType,
    pub units: u64,
    pub order_type: OrderType,
    /// Quote price when the order was placed.
    pub potential_symbol_price: Decimal,
    /// `units * potential_symbol_price`, reserved from cash at placement for BUY orders.
    pub potential_total_price: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_symbol_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_total_price: Option<Decimal>,
}

impl OutstandingOrder {
    pub fn is_open(&self) -> bool {
        self.status == OrderStatus::Open
    }

    pub fn side(&self) -> TransactionType {
        self.order_type.side
    }

    /// `units * price`
    pub fn total_at(&self, price: Decimal) -> Decimal {
        Decimal::from(self.units) * price
    }

    /// The closed copy of this order after a fill at `price`.
    pub fn closed(&self, price: Decimal, closed_at: DateTime<Utc>) -> Self {
        Self {
            status: OrderStatus::Closed,
            closed_at: Some(closed_at),
            final_symbol_price: Some(price),
            final_total_price: Some(self.total_at(price)),
            ..self.clone()
        }
    }
}

/// Cash held back for open BUY orders: the sum of their `potential_total_price`.
pub fn reserved_cash<'a>(orders: impl IntoIterator<Item = &'a OutstandingOrder>) -> Decimal {
    orders
        .into_iter()
        .filter(|o| o.is_open() && o.side() == TransactionType::Buy)
        .map(|o| o.potential_total_price)
        .sum()
}

/// Per-order commission: `flat + total * percentage`, rounded to cents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeSchedule {
    pub flat: Decimal,
    pub percentage: Decimal,
}

impl FeeSchedule {
    pub fn fee_for(&self, total: Decimal) -> Decimal {
        (self.flat + total * self.percentage).round_dp(FEE_DECIMAL_PRECISION)
    }
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            flat: Decimal::from(DEFAULT_FLAT_FEE),
            percentage: Decimal::ZERO,
        }
    }
}

/// Outcome of filling one order: the ledger entry to append and the
/// closed order to write back, committed together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFill {
    pub order: OutstandingOrder,
    pub transaction: Transaction,
}

/// Why an order stayed open this run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "reason")]
pub enum SkipReason {
    MissingQuote,
    LimitNotReached {
        limit_price: Decimal,
        price: Decimal,
    },
    InsufficientCash {
        required: Decimal,
        available: Decimal,
    },
    InsufficientUnits {
        held: u64,
        requested: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedOrder {
    pub order_id: String,
    pub symbol: String,
    #[serde(flatten)]
    pub reason: SkipReason,
}
