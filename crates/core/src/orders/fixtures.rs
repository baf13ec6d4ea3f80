//! Order builders for unit tests.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::{OrderStatus, OrderType, OutstandingOrder};
use crate::ledger::{SymbolType, TransactionType};

pub fn order(
    order_id: &str,
    user_id: &str,
    symbol: &str,
    side: TransactionType,
    units: u64,
    potential_price: Decimal,
    created_at: DateTime<Utc>,
) -> OutstandingOrder {
    OutstandingOrder {
        order_id: order_id.to_string(),
        user_id: user_id.to_string(),
        symbol: symbol.to_string(),
        symbol_type: SymbolType::Stock,
        units,
        order_type: OrderType::market(side),
        potential_symbol_price: potential_price,
        potential_total_price: Decimal::from(units) * potential_price,
        status: OrderStatus::Open,
        created_at,
        closed_at: None,
        final_symbol_price: None,
        final_total_price: None,
    }
}
