//! Ledger domain models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{CalculatorError, Result};
use crate::utils::time_utils::trading_date;

/// Kind of instrument a transaction trades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SymbolType {
    #[default]
    Stock,
    Crypto,
}

impl SymbolType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolType::Stock => "STOCK",
            SymbolType::Crypto => "CRYPTO",
        }
    }
}

/// Side of a ledger transaction (also used as the side of an order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Buy,
    Sell,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Buy => "BUY",
            TransactionType::Sell => "SELL",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "BUY" => Ok(TransactionType::Buy),
            "SELL" => Ok(TransactionType::Sell),
            other => Err(format!("Unknown transaction type: {}", other)),
        }
    }
}

/// An executed BUY or SELL. Immutable once appended to the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub date: DateTime<Utc>,
    pub symbol: String,
    pub symbol_type: SymbolType,
    pub transaction_type: TransactionType,
    pub units: u64,
    pub unit_price: Decimal,
    #[serde(default)]
    pub transaction_fees: Decimal,
    /// Realized gain against the break-even price; SELL only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_value: Option<Decimal>,
    /// `return_value` relative to the cost basis removed; SELL only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_change: Option<Decimal>,
}

impl Transaction {
    /// `units * unit_price`, fees excluded.
    pub fn total(&self) -> Decimal {
        Decimal::from(self.units) * self.unit_price
    }

    /// Signed effect on cash on hand: BUY pays total plus fees, SELL receives
    /// total minus fees.
    pub fn cash_effect(&self) -> Decimal {
        match self.transaction_type {
            TransactionType::Buy => -(self.total() + self.transaction_fees),
            TransactionType::Sell => self.total() - self.transaction_fees,
        }
    }

    pub fn trading_date(&self) -> NaiveDate {
        trading_date(self.date)
    }

    pub fn is_buy(&self) -> bool {
        self.transaction_type == TransactionType::Buy
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| CalculatorError::InvalidTransaction {
            transaction_id: self.id.clone(),
            reason: reason.to_string(),
        };
        if self.units < 1 {
            return Err(invalid("units must be at least 1").into());
        }
        if self.unit_price <= Decimal::ZERO {
            return Err(invalid("unit price must be positive").into());
        }
        if self.transaction_fees < Decimal::ZERO {
            return Err(invalid("transaction fees must not be negative").into());
        }
        if self.symbol.trim().is_empty() {
            return Err(invalid("symbol is empty").into());
        }
        Ok(())
    }
}

/// Cash added to the account outside of trading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashDeposit {
    pub transaction_id: String,
    pub amount: Decimal,
    pub date: DateTime<Utc>,
}

impl CashDeposit {
    pub fn trading_date(&self) -> NaiveDate {
        trading_date(self.date)
    }
}

/// A user's full ledger document: transactions plus cash deposits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionHistory {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub cash_deposits: Vec<CashDeposit>,
}

impl TransactionHistory {
    pub fn new(transactions: Vec<Transaction>, cash_deposits: Vec<CashDeposit>) -> Self {
        Self {
            transactions,
            cash_deposits,
        }
    }

    /// Transactions ordered by date ascending. The sort is stable, so
    /// transactions sharing a timestamp keep their append order.
    pub fn sorted_transactions(&self) -> Vec<&Transaction> {
        let mut sorted: Vec<&Transaction> = self.transactions.iter().collect();
        sorted.sort_by_key(|t| t.date);
        sorted
    }

    pub fn first_transaction_date(&self) -> Option<DateTime<Utc>> {
        self.transactions.iter().map(|t| t.date).min()
    }

    pub fn last_transaction_date(&self) -> Option<DateTime<Utc>> {
        self.transactions.iter().map(|t| t.date).max()
    }

    pub fn total_deposits(&self) -> Decimal {
        self.cash_deposits.iter().map(|d| d.amount).sum()
    }

    /// Union append: adds the transaction unless one with the same id is
    /// already present. Returns whether it was added.
    pub fn append_transaction(&mut self, transaction: Transaction) -> bool {
        if self.transactions.iter().any(|t| t.id == transaction.id) {
            return false;
        }
        self.transactions.push(transaction);
        true
    }

    /// Union append for deposits, keyed on `transaction_id`.
    pub fn append_cash_deposit(&mut self, deposit: CashDeposit) -> bool {
        if self
            .cash_deposits
            .iter()
            .any(|d| d.transaction_id == deposit.transaction_id)
        {
            return false;
        }
        self.cash_deposits.push(deposit);
        true
    }
}
