use crate::ledger::fixtures::{at, buy, deposit, sell, tx};
use crate::ledger::{TransactionHistory, TransactionType};
use crate::portfolio::holdings::project;
use crate::portfolio::state::{calculate_portfolio_state, cash_on_hand, PortfolioState};
use crate::quotes::Quote;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;

fn quotes(prices: &[(&str, Decimal)]) -> HashMap<String, Quote> {
    prices
        .iter()
        .map(|(symbol, price)| (symbol.to_string(), Quote::new(*symbol, *price, at(2024, 3, 8))))
        .collect()
}

fn state_for(history: &TransactionHistory, prices: &[(&str, Decimal)], starting: Decimal) -> PortfolioState {
    let projection = project(&history.transactions).unwrap();
    calculate_portfolio_state(
        &projection.holdings,
        &quotes(prices),
        history,
        starting,
        at(2024, 3, 8),
    )
}

#[test]
fn test_gains_against_live_quote() {
    let history = TransactionHistory::new(
        vec![
            buy("t1", at(2024, 3, 1), "AAPL", 10, dec!(100)),
            sell("t2", at(2024, 3, 4), "AAPL", 4, dec!(125)),
        ],
        vec![],
    );

    let state = state_for(&history, &[("AAPL", dec!(120))], dec!(1000));

    assert_eq!(state.cash_on_hand, dec!(500));
    assert_eq!(state.holdings_balance, dec!(720));
    assert_eq!(state.invested, dec!(600));
    assert_eq!(state.balance, dec!(1220));
    assert_eq!(state.total_gains_value, dec!(120));
    assert_eq!(state.total_gains_percentage, dec!(0.166667));
    assert_eq!(state.number_of_executed_buy_transactions, 1);
    assert_eq!(state.number_of_executed_sell_transactions, 1);
    assert_eq!(state.first_transaction_date, Some(at(2024, 3, 1)));
    assert_eq!(state.last_transaction_date, Some(at(2024, 3, 4)));
    assert_eq!(state.modified_date, at(2024, 3, 8));
}

#[test]
fn test_empty_ledger_is_all_cash() {
    let history = TransactionHistory::default();
    let state = state_for(&history, &[], dec!(30000));

    assert_eq!(state, PortfolioState::initial(dec!(30000), at(2024, 3, 8)));
    assert_eq!(state.total_gains_percentage, Decimal::ZERO);
}

#[test]
fn test_missing_quote_prices_at_break_even() {
    let history = TransactionHistory::new(
        vec![
            buy("t1", at(2024, 3, 1), "AAPL", 10, dec!(100)),
            buy("t2", at(2024, 3, 1), "DELISTED", 5, dec!(40)),
        ],
        vec![],
    );

    let state = state_for(&history, &[("AAPL", dec!(110))], dec!(5000));

    assert_eq!(state.holdings_balance, dec!(1300));
    assert_eq!(state.invested, dec!(1200));
    assert_eq!(state.total_gains_value, dec!(100));
}

#[test]
fn test_deposits_and_fees_flow_into_cash() {
    let history = TransactionHistory::new(
        vec![
            tx("t1", at(2024, 3, 1), "MSFT", TransactionType::Buy, 2, dec!(300), dec!(2)),
            tx("t2", at(2024, 3, 5), "MSFT", TransactionType::Sell, 1, dec!(310), dec!(2)),
        ],
        vec![deposit("d1", at(2024, 3, 2), dec!(250))],
    );

    // 1000 + 250 - 602 + 308
    assert_eq!(cash_on_hand(&history, dec!(1000)), dec!(956));

    let state = state_for(&history, &[("MSFT", dec!(320))], dec!(1000));
    assert_eq!(state.transaction_fees, dec!(4));
    assert_eq!(state.invested, dec!(301));
    assert_eq!(state.balance, dec!(956) + dec!(320));
}

#[test]
fn test_gains_identity_holds() {
    let history = TransactionHistory::new(
        vec![
            buy("t1", at(2024, 3, 1), "AAPL", 7, dec!(101.5)),
            buy("t2", at(2024, 3, 2), "TSLA", 3, dec!(210)),
            sell("t3", at(2024, 3, 3), "AAPL", 2, dec!(99)),
        ],
        vec![],
    );

    let state = state_for(&history, &[("AAPL", dec!(97.25)), ("TSLA", dec!(250))], dec!(2000));

    assert_eq!(state.total_gains_value, state.holdings_balance - state.invested);
    assert_eq!(state.balance, state.cash_on_hand + state.holdings_balance);
}
