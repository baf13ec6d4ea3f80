use crate::errors::{CalculatorError, Result};
use crate::ledger::{SymbolType, Transaction, TransactionType};
use crate::portfolio::holdings::{Holding, HoldingsProjection, RealizedGain};

use log::debug;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct SymbolPosition {
    symbol_type: SymbolType,
    units: u64,
    invested_total: Decimal,
}

/// Folds ledger transactions into per-symbol holdings using the
/// weighted-average cost method.
///
/// The projector is incremental: [`apply`](Self::apply) can be fed one
/// transaction at a time (the growth builder replays day by day), while
/// [`project`] sorts a whole ledger and folds it in one go.
#[derive(Debug, Clone, Default)]
pub struct HoldingsProjector {
    positions: BTreeMap<String, SymbolPosition>,
}

impl HoldingsProjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one transaction. Returns the realized gain for a SELL.
    ///
    /// A SELL of more units than held is a data-integrity fault and fails
    /// with `HoldingUnderflow`; the projector is left unchanged in that case.
    pub fn apply(&mut self, transaction: &Transaction) -> Result<Option<RealizedGain>> {
        transaction.validate()?;
        let units = transaction.units;

        match transaction.transaction_type {
            TransactionType::Buy => {
                let position = self
                    .positions
                    .entry(transaction.symbol.clone())
                    .or_insert(SymbolPosition {
                        symbol_type: transaction.symbol_type,
                        units: 0,
                        invested_total: Decimal::ZERO,
                    });
                position.symbol_type = transaction.symbol_type;
                position.units += units;
                position.invested_total += transaction.total() + transaction.transaction_fees;
                Ok(None)
            }
            TransactionType::Sell => {
                let underflow = |held: u64| CalculatorError::HoldingUnderflow {
                    symbol: transaction.symbol.clone(),
                    transaction_id: transaction.id.clone(),
                    units_held: held,
                    units_sold: units,
                };

                let Some(position) = self.positions.get_mut(&transaction.symbol) else {
                    return Err(underflow(0).into());
                };
                if units > position.units {
                    return Err(underflow(position.units).into());
                }

                let cost_removed = if units == position.units {
                    position.invested_total
                } else {
                    position.invested_total * Decimal::from(units) / Decimal::from(position.units)
                };
                let remaining_invested = position.invested_total - cost_removed;
                if remaining_invested < Decimal::ZERO {
                    return Err(underflow(position.units).into());
                }

                position.units -= units;
                position.invested_total = remaining_invested;

                let return_value = transaction.total() - transaction.transaction_fees - cost_removed;
                let return_change = if cost_removed.is_zero() {
                    Decimal::ZERO
                } else {
                    return_value / cost_removed
                };

                if position.units == 0 {
                    debug!("Position {} fully closed by {}", transaction.symbol, transaction.id);
                    self.positions.remove(&transaction.symbol);
                }

                Ok(Some(RealizedGain {
                    transaction_id: transaction.id.clone(),
                    symbol: transaction.symbol.clone(),
                    return_value,
                    return_change,
                    cost_removed,
                }))
            }
        }
    }

    /// Units currently held for `symbol` (zero if none).
    pub fn units_of(&self, symbol: &str) -> u64 {
        self.positions.get(symbol).map(|p| p.units).unwrap_or(0)
    }

    /// Sum of the cost basis of every open position.
    pub fn invested_total(&self) -> Decimal {
        self.positions.values().map(|p| p.invested_total).sum()
    }

    /// Holdings with non-zero units, ordered by symbol.
    pub fn holdings(&self) -> Vec<Holding> {
        self.positions
            .iter()
            .filter(|(_, p)| p.units > 0)
            .map(|(symbol, p)| Holding {
                symbol: symbol.clone(),
                symbol_type: p.symbol_type,
                units: p.units,
                invested_total: p.invested_total,
                break_even_price: p.invested_total / Decimal::from(p.units),
            })
            .collect()
    }
}

/// Projects a user's transactions (any order) into holdings.
///
/// Transactions are replayed by date ascending; equal timestamps keep their
/// input order. Any fault fails the whole projection for the account.
pub fn project(transactions: &[Transaction]) -> Result<HoldingsProjection> {
    let mut ordered: Vec<&Transaction> = transactions.iter().collect();
    ordered.sort_by_key(|t| t.date);

    let mut projector = HoldingsProjector::new();
    let mut realized_gains = Vec::new();
    for transaction in ordered {
        if let Some(gain) = projector.apply(transaction)? {
            realized_gains.push(gain);
        }
    }

    Ok(HoldingsProjection {
        holdings: projector.holdings(),
        realized_gains,
    })
}
