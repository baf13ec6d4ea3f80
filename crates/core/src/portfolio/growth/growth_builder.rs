use crate::errors::Result;
use crate::ledger::{CashDeposit, Transaction, TransactionHistory};
use crate::portfolio::growth::PortfolioGrowthPoint;
use crate::portfolio::holdings::HoldingsProjector;
use crate::quotes::HistoricalPrice;
use crate::utils::time_utils::trading_days_between;

use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap, HashSet};

type CloseIndex = HashMap<String, BTreeMap<NaiveDate, Decimal>>;

fn index_closes(prices_by_symbol: &HashMap<String, Vec<HistoricalPrice>>) -> CloseIndex {
    prices_by_symbol
        .iter()
        .map(|(symbol, bars)| {
            let closes = bars.iter().map(|bar| (bar.date, bar.close)).collect();
            (symbol.clone(), closes)
        })
        .collect()
}

/// Last close on or before `date`.
fn close_on_or_before(index: &CloseIndex, symbol: &str, date: NaiveDate) -> Option<Decimal> {
    index
        .get(symbol)
        .and_then(|closes| closes.range(..=date).next_back())
        .map(|(_, close)| *close)
}

/// Rebuilds the daily growth series of one account from its full ledger.
///
/// Emits one point per trading day from the first transaction's trading date
/// through `end_date` (normally yesterday). Weekends and `holidays` are
/// skipped. Holdings are replayed incrementally, and each open holding is
/// valued at the last known close on or before the day, or at its
/// break-even price when no close is known yet.
///
/// Deterministic for fixed inputs, so a rebuild over an unchanged ledger
/// reproduces the stored series.
pub fn build_growth_series(
    history: &TransactionHistory,
    prices_by_symbol: &HashMap<String, Vec<HistoricalPrice>>,
    starting_cash: Decimal,
    holidays: &HashSet<NaiveDate>,
    end_date: NaiveDate,
) -> Result<Vec<PortfolioGrowthPoint>> {
    let transactions: Vec<&Transaction> = history.sorted_transactions();
    let Some(start_date) = transactions.iter().map(|t| t.trading_date()).min() else {
        return Ok(Vec::new());
    };

    let mut deposits: Vec<&CashDeposit> = history.cash_deposits.iter().collect();
    deposits.sort_by_key(|d| d.date);

    let days = trading_days_between(start_date, end_date, holidays);
    debug!(
        "Building growth series over {} trading days ({} to {})",
        days.len(),
        start_date,
        end_date
    );

    let closes = index_closes(prices_by_symbol);
    let mut projector = HoldingsProjector::new();
    let mut cash = starting_cash;
    let mut next_tx = 0;
    let mut next_deposit = 0;
    let mut series = Vec::with_capacity(days.len());

    for day in days {
        // Anything dated on a skipped day lands on the next trading day.
        while next_tx < transactions.len() && transactions[next_tx].trading_date() <= day {
            let transaction = transactions[next_tx];
            projector.apply(transaction)?;
            cash += transaction.cash_effect();
            next_tx += 1;
        }
        while next_deposit < deposits.len() && deposits[next_deposit].trading_date() <= day {
            cash += deposits[next_deposit].amount;
            next_deposit += 1;
        }

        let market_total: Decimal = projector
            .holdings()
            .iter()
            .map(|holding| {
                let price = close_on_or_before(&closes, &holding.symbol, day)
                    .unwrap_or(holding.break_even_price);
                holding.market_value(price)
            })
            .sum();

        series.push(PortfolioGrowthPoint {
            date: day,
            balance_total: cash + market_total,
            invested_total: projector.invested_total(),
            market_total,
        });
    }

    Ok(series)
}
