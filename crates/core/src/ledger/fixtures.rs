//! Builders shared by unit tests across the crate.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;

use super::{CashDeposit, SymbolType, Transaction, TransactionType};

/// 15:00 UTC on the given day, i.e. during the New York session.
pub fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 15, 0, 0).unwrap()
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn tx(
    id: &str,
    date: DateTime<Utc>,
    symbol: &str,
    transaction_type: TransactionType,
    units: u64,
    unit_price: Decimal,
    fees: Decimal,
) -> Transaction {
    Transaction {
        id: id.to_string(),
        date,
        symbol: symbol.to_string(),
        symbol_type: SymbolType::Stock,
        transaction_type,
        units,
        unit_price,
        transaction_fees: fees,
        return_value: None,
        return_change: None,
    }
}

pub fn buy(id: &str, date: DateTime<Utc>, symbol: &str, units: u64, price: Decimal) -> Transaction {
    tx(id, date, symbol, TransactionType::Buy, units, price, Decimal::ZERO)
}

pub fn sell(id: &str, date: DateTime<Utc>, symbol: &str, units: u64, price: Decimal) -> Transaction {
    tx(id, date, symbol, TransactionType::Sell, units, price, Decimal::ZERO)
}

pub fn deposit(id: &str, date: DateTime<Utc>, amount: Decimal) -> CashDeposit {
    CashDeposit {
        transaction_id: id.to_string(),
        amount,
        date,
    }
}
