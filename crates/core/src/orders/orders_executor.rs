use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use rust_decimal::Decimal;

use crate::errors::Result;
use crate::ledger::{Transaction, TransactionType};
use crate::orders::{
    reserved_cash, FeeSchedule, OrderFill, OutstandingOrder, SkipReason, SkippedOrder, UserOrderSnapshot,
    UserOrderWrites,
};
use crate::portfolio::holdings::{HoldingSnapshot, HoldingsProjector};
use crate::portfolio::state::{calculate_portfolio_state, cash_on_hand, PortfolioDetails};
use crate::quotes::QuoteCache;

/// Result of evaluating one user's open orders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderEvaluation {
    pub writes: UserOrderWrites,
    pub skipped: Vec<SkippedOrder>,
}

/// Cash available to fill BUY orders: ledger cash less every open BUY's
/// `potential_total_price`. The cached state is not consulted, so a
/// recalculation between placement and execution cannot change the outcome.
pub fn available_cash(snapshot: &UserOrderSnapshot, starting_cash: Decimal) -> Decimal {
    cash_on_hand(&snapshot.history, starting_cash) - reserved_cash(&snapshot.open_orders)
}

fn skip(order: &OutstandingOrder, reason: SkipReason) -> SkippedOrder {
    SkippedOrder {
        order_id: order.order_id.clone(),
        symbol: order.symbol.clone(),
        reason,
    }
}

/// Decides which of a user's open orders fill against `quotes`.
///
/// Orders are evaluated oldest first against a running cash balance and a
/// running holdings projection, so a SELL can use units bought earlier in
/// the same pass. For a BUY the price move since placement plus the fee,
/// `units * price - potential_total_price + fee`, must be covered by cash.
/// An order that cannot fill is skipped and stays OPEN; its siblings still
/// fill. The fill's transaction reuses the order id, so appending it twice is
/// a no-op.
///
/// Pure: the caller commits the returned writes.
pub fn evaluate_user_orders(
    snapshot: &UserOrderSnapshot,
    quotes: &QuoteCache,
    fees: &FeeSchedule,
    starting_cash: Decimal,
    now: DateTime<Utc>,
) -> Result<OrderEvaluation> {
    let mut projector = HoldingsProjector::new();
    for transaction in snapshot.history.sorted_transactions() {
        projector.apply(transaction)?;
    }

    let mut orders: Vec<&OutstandingOrder> =
        snapshot.open_orders.iter().filter(|o| o.is_open()).collect();
    orders.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.order_id.cmp(&b.order_id))
    });

    let mut cash = available_cash(snapshot, starting_cash);
    let mut evaluation = OrderEvaluation::default();

    for order in orders {
        let Some(quote) = quotes.get(&order.symbol) else {
            error!(
                "No quote for {} - order {} of user {} stays open",
                order.symbol, order.order_id, snapshot.user_id
            );
            evaluation.skipped.push(skip(order, SkipReason::MissingQuote));
            continue;
        };
        let price = quote.price;

        if !order.order_type.is_fillable_at(price) {
            debug!(
                "Order {} ({}) limit not reached at {}",
                order.order_id, order.symbol, price
            );
            evaluation.skipped.push(skip(
                order,
                SkipReason::LimitNotReached {
                    limit_price: order.order_type.limit_price.unwrap_or_default(),
                    price,
                },
            ));
            continue;
        }

        let current_total = order.total_at(price);
        let fee = fees.fee_for(current_total);

        let mut transaction = Transaction {
            id: order.order_id.clone(),
            date: now,
            symbol: order.symbol.clone(),
            symbol_type: order.symbol_type,
            transaction_type: order.side(),
            units: order.units,
            unit_price: price,
            transaction_fees: fee,
            return_value: None,
            return_change: None,
        };

        match order.side() {
            TransactionType::Buy => {
                let required = current_total - order.potential_total_price + fee;
                if cash < required {
                    info!(
                        "Insufficient cash for order {} of user {}: needs {}, has {}",
                        order.order_id, snapshot.user_id, required, cash
                    );
                    evaluation.skipped.push(skip(
                        order,
                        SkipReason::InsufficientCash {
                            required,
                            available: cash,
                        },
                    ));
                    continue;
                }
                projector.apply(&transaction)?;
                cash -= required;
            }
            TransactionType::Sell => {
                let held = projector.units_of(&order.symbol);
                if held < order.units {
                    warn!(
                        "Order {} of user {} sells {} {} but only {} are held",
                        order.order_id, snapshot.user_id, order.units, order.symbol, held
                    );
                    evaluation.skipped.push(skip(
                        order,
                        SkipReason::InsufficientUnits {
                            held,
                            requested: order.units,
                        },
                    ));
                    continue;
                }
                if let Some(gain) = projector.apply(&transaction)? {
                    transaction.return_value = Some(gain.return_value);
                    transaction.return_change = Some(gain.return_change);
                }
                cash += current_total - fee;
            }
        }

        info!(
            "Filled order {} of user {}: {} {} {} at {}",
            order.order_id,
            snapshot.user_id,
            order.side(),
            order.units,
            order.symbol,
            price
        );
        evaluation.writes.fills.push(OrderFill {
            order: order.closed(price, now),
            transaction,
        });
    }

    if !evaluation.writes.fills.is_empty() {
        let details = updated_details(
            snapshot,
            &evaluation.writes.fills,
            &projector,
            quotes,
            starting_cash,
            now,
        );
        if details.portfolio_state.cash_on_hand != cash {
            warn!(
                "Cash of user {} after fills is {} but the running balance was {}",
                snapshot.user_id, details.portfolio_state.cash_on_hand, cash
            );
        }
        evaluation.writes.details = Some(details);
    }

    Ok(evaluation)
}

/// Details recomputed from the ledger with this pass's fills appended,
/// valued at `quotes`, with the orders still open reserved from cash.
fn updated_details(
    snapshot: &UserOrderSnapshot,
    fills: &[OrderFill],
    projector: &HoldingsProjector,
    quotes: &QuoteCache,
    starting_cash: Decimal,
    now: DateTime<Utc>,
) -> PortfolioDetails {
    let mut history = snapshot.history.clone();
    for fill in fills {
        history.append_transaction(fill.transaction.clone());
    }
    let still_open = snapshot
        .open_orders
        .iter()
        .filter(|o| !fills.iter().any(|f| f.order.order_id == o.order_id));

    let holdings = projector.holdings();
    let mut state =
        calculate_portfolio_state(&holdings, quotes.as_map(), &history, starting_cash, now);
    state.reserve_cash(reserved_cash(still_open));

    PortfolioDetails {
        portfolio_state: state,
        holding_snapshot: HoldingSnapshot::new(holdings, now),
    }
}
