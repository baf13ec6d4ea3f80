use crate::constants::DECIMAL_PRECISION;
use crate::ledger::{TransactionHistory, TransactionType};
use crate::portfolio::holdings::Holding;
use crate::portfolio::state::PortfolioState;
use crate::quotes::Quote;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Cash on hand implied by the ledger:
/// `starting_cash + deposits - Σ(BUY total + fees) + Σ(SELL total - fees)`.
pub fn cash_on_hand(history: &TransactionHistory, starting_cash: Decimal) -> Decimal {
    let trading: Decimal = history.transactions.iter().map(|t| t.cash_effect()).sum();
    starting_cash + history.total_deposits() + trading
}

/// Combines projected holdings with live quotes into a [`PortfolioState`].
///
/// A holding without a quote is priced at its break-even price so that one
/// missing symbol degrades the numbers instead of failing the whole batch.
/// Pure: persisting the result is the caller's job.
///
/// # Arguments
///
/// * `holdings` - Output of the holdings projection for this account.
/// * `quotes` - Latest quotes keyed by symbol.
/// * `history` - The account's ledger (transactions and cash deposits).
/// * `starting_cash` - Cash the account was opened with.
/// * `now` - Stamped into `modified_date`.
pub fn calculate_portfolio_state(
    holdings: &[Holding],
    quotes: &HashMap<String, Quote>,
    history: &TransactionHistory,
    starting_cash: Decimal,
    now: DateTime<Utc>,
) -> PortfolioState {
    let mut holdings_balance = Decimal::ZERO;
    let mut invested = Decimal::ZERO;

    for holding in holdings {
        let price = match quotes.get(&holding.symbol) {
            Some(quote) => quote.price,
            None => {
                warn!(
                    "Missing quote for {}. Pricing {} units at break-even {}.",
                    holding.symbol, holding.units, holding.break_even_price
                );
                holding.break_even_price
            }
        };
        holdings_balance += holding.market_value(price);
        invested += holding.invested_total;
    }

    let cash = cash_on_hand(history, starting_cash);

    let mut transaction_fees = Decimal::ZERO;
    let mut buys = 0u32;
    let mut sells = 0u32;
    for transaction in &history.transactions {
        transaction_fees += transaction.transaction_fees;
        match transaction.transaction_type {
            TransactionType::Buy => buys += 1,
            TransactionType::Sell => sells += 1,
        }
    }

    let total_gains_value = holdings_balance - invested;
    let total_gains_percentage = if holdings_balance.is_zero() {
        Decimal::ZERO
    } else {
        (total_gains_value / holdings_balance).round_dp(DECIMAL_PRECISION)
    };

    debug!(
        "Aggregated {} holdings: holdings balance {}, cash {}, invested {}",
        holdings.len(),
        holdings_balance,
        cash,
        invested
    );

    PortfolioState {
        balance: cash + holdings_balance,
        cash_on_hand: cash,
        holdings_balance,
        invested,
        starting_cash,
        transaction_fees,
        number_of_executed_buy_transactions: buys,
        number_of_executed_sell_transactions: sells,
        total_gains_value,
        total_gains_percentage,
        first_transaction_date: history.first_transaction_date(),
        last_transaction_date: history.last_transaction_date(),
        modified_date: now,
    }
}
