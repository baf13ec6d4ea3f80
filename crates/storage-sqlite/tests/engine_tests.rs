//! The engine services running against a file-backed SQLite store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use papertrade_core::accounts::{AccountRepositoryTrait, UserAccount};
use papertrade_core::ledger::{LedgerRepositoryTrait, SymbolType, TransactionType};
use papertrade_core::orders::{
    OrderExecutionService, OrderExecutionServiceTrait, OrderRepositoryTrait, OrderStatus,
    OrderType, OutstandingOrder,
};
use papertrade_core::portfolio::{
    PortfolioRepositoryTrait, PortfolioService, PortfolioServiceTrait,
};
use papertrade_core::quotes::{
    Granularity, HistoricalPrice, MarketDataError, MarketStatus, Quote, QuoteGateway, StockSplit,
};
use papertrade_core::settings::EngineSettings;
use papertrade_storage_sqlite::accounts::AccountRepository;
use papertrade_storage_sqlite::ledger::LedgerRepository;
use papertrade_storage_sqlite::orders::OrderRepository;
use papertrade_storage_sqlite::portfolio::PortfolioRepository;
use papertrade_storage_sqlite::{init, spawn_writer};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Open market, one fixed price per symbol, no history and no splits.
struct FixedPriceGateway {
    prices: Vec<(String, Decimal)>,
}

#[async_trait]
impl QuoteGateway for FixedPriceGateway {
    fn id(&self) -> &'static str {
        "FIXED"
    }

    async fn get_quotes(&self, symbols: &[String]) -> Result<Vec<Quote>, MarketDataError> {
        Ok(self
            .prices
            .iter()
            .filter(|(symbol, _)| symbols.contains(symbol))
            .map(|(symbol, price)| Quote::new(symbol.clone(), *price, Utc::now()))
            .collect())
    }

    async fn get_historical_prices(
        &self,
        _symbol: &str,
        _from: NaiveDate,
        _to: NaiveDate,
        _granularity: Granularity,
    ) -> Result<Vec<HistoricalPrice>, MarketDataError> {
        Ok(Vec::new())
    }

    async fn get_stock_splits(
        &self,
        _for_date: NaiveDate,
    ) -> Result<Vec<StockSplit>, MarketDataError> {
        Ok(Vec::new())
    }

    async fn get_market_status(&self) -> Result<MarketStatus, MarketDataError> {
        Ok(MarketStatus {
            is_open: true,
            holidays: Vec::new(),
        })
    }
}

struct Engine {
    accounts: Arc<AccountRepository>,
    ledger: Arc<LedgerRepository>,
    portfolio: Arc<PortfolioRepository>,
    orders: Arc<OrderRepository>,
    portfolio_service: PortfolioService,
    order_service: OrderExecutionService,
}

fn engine(db_path: &str, price: Decimal) -> Engine {
    let settings = EngineSettings {
        historical_batch_delay_secs: 0,
        ..EngineSettings::default()
    };
    let db = init(db_path).unwrap();
    let writer = spawn_writer(db.clone(), settings.transaction_max_attempts).unwrap();

    let accounts = Arc::new(AccountRepository::new(db.clone(), writer.clone()));
    let ledger = Arc::new(LedgerRepository::new(db.clone(), writer.clone()));
    let portfolio = Arc::new(PortfolioRepository::new(db.clone(), writer.clone()));
    let orders = Arc::new(OrderRepository::new(db, writer));
    let gateway: Arc<dyn QuoteGateway> = Arc::new(FixedPriceGateway {
        prices: vec![("AAPL".to_string(), price)],
    });

    let portfolio_service = PortfolioService::new(
        accounts.clone(),
        ledger.clone(),
        portfolio.clone(),
        orders.clone(),
        gateway.clone(),
        settings.clone(),
    );
    let order_service =
        OrderExecutionService::new(orders.clone(), accounts.clone(), gateway, settings);

    Engine {
        accounts,
        ledger,
        portfolio,
        orders,
        portfolio_service,
        order_service,
    }
}

fn buy_order(order_id: &str, units: u64, price: Decimal) -> OutstandingOrder {
    OutstandingOrder {
        order_id: order_id.to_string(),
        user_id: "u1".to_string(),
        symbol: "AAPL".to_string(),
        symbol_type: SymbolType::Stock,
        units,
        order_type: OrderType::market(TransactionType::Buy),
        potential_symbol_price: price,
        potential_total_price: Decimal::from(units) * price,
        status: OrderStatus::Open,
        created_at: Utc::now() - Duration::minutes(5),
        closed_at: None,
        final_symbol_price: None,
        final_total_price: None,
    }
}

#[tokio::test]
async fn test_fill_then_recalculate_agree_on_cash() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("papertrade.db");
    let engine = engine(path.to_str().unwrap(), dec!(100));

    let mut account = UserAccount::new("u1", Utc::now() - Duration::days(30));
    account.starting_cash = Some(dec!(1000));
    engine.accounts.upsert_account(account).await.unwrap();
    engine.portfolio_service.reset_user("u1").await.unwrap();

    engine
        .orders
        .create_order(buy_order("o1", 5, dec!(100)))
        .await
        .unwrap();

    let report = engine.order_service.execute_outstanding_orders().await.unwrap();

    assert!(report.market_open);
    assert_eq!(report.filled_orders, 1);
    assert!(engine.orders.list_open_orders().unwrap().is_empty());
    let history = engine.ledger.get_transaction_history("u1").unwrap();
    assert_eq!(history.transactions.len(), 1);
    assert_eq!(history.transactions[0].id, "o1");
    let after_fill = engine.portfolio.get_portfolio_details("u1").unwrap().unwrap();
    assert_eq!(after_fill.portfolio_state.cash_on_hand, dec!(498));

    // A second run finds nothing left to fill.
    let rerun = engine.order_service.execute_outstanding_orders().await.unwrap();
    assert_eq!(rerun.filled_orders, 0);
    assert_eq!(engine.ledger.get_transaction_history("u1").unwrap().transactions.len(), 1);

    let today = Utc::now().date_naive() + Duration::days(3);
    let recalculated = engine
        .portfolio_service
        .recalculate_user("u1", today)
        .await
        .unwrap();
    let state = &recalculated.portfolio_state;
    assert_eq!(state.cash_on_hand, dec!(498));
    assert_eq!(state.holdings_balance, dec!(500));
    assert_eq!(state.balance, dec!(998));
    assert_eq!(state.transaction_fees, dec!(2));
    assert_eq!(state.number_of_executed_buy_transactions, 1);

    let growth = engine.portfolio.get_growth("u1").unwrap();
    assert!(growth.iter().all(|point| point.date < today));
    assert!(growth.windows(2).all(|pair| pair[0].date < pair[1].date));
}

#[tokio::test]
async fn test_recalculate_between_placement_and_execution_keeps_reservation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("papertrade.db");
    let engine = engine(path.to_str().unwrap(), dec!(110));

    let mut account = UserAccount::new("u1", Utc::now() - Duration::days(30));
    account.starting_cash = Some(dec!(1000));
    engine.accounts.upsert_account(account).await.unwrap();
    engine.portfolio_service.reset_user("u1").await.unwrap();
    engine
        .orders
        .create_order(buy_order("o1", 10, dec!(100)))
        .await
        .unwrap();

    let today = Utc::now().date_naive();
    let recalculated = engine
        .portfolio_service
        .recalculate_user("u1", today)
        .await
        .unwrap();
    assert_eq!(recalculated.portfolio_state.cash_on_hand, dec!(0));
    assert_eq!(recalculated.portfolio_state.balance, dec!(0));

    // The 1000 is already held for o1, so the 102 extra at 110 is not there.
    let report = engine.order_service.execute_outstanding_orders().await.unwrap();

    assert!(report.market_open);
    assert_eq!(report.filled_orders, 0);
    let open = engine.orders.list_open_orders().unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].order_id, "o1");
    assert!(engine
        .ledger
        .get_transaction_history("u1")
        .unwrap()
        .transactions
        .is_empty());
    let details = engine.portfolio.get_portfolio_details("u1").unwrap().unwrap();
    assert_eq!(details.portfolio_state.cash_on_hand, dec!(0));
}

#[tokio::test]
async fn test_nightly_update_marks_users_done() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("papertrade.db");
    let engine = engine(path.to_str().unwrap(), dec!(100));

    for user_id in ["u1", "u2"] {
        engine
            .accounts
            .upsert_account(UserAccount::new(user_id, Utc::now() - Duration::days(3)))
            .await
            .unwrap();
    }
    let today = Utc::now().date_naive();

    let first = engine.portfolio_service.run_nightly_update(today).await.unwrap();
    let second = engine.portfolio_service.run_nightly_update(today).await.unwrap();

    assert_eq!(first.succeeded.len(), 2);
    assert!(first.failed.is_empty());
    assert_eq!(second.total(), 0);
    let details = engine.portfolio.get_portfolio_details("u2").unwrap().unwrap();
    assert_eq!(
        details.portfolio_state.balance,
        EngineSettings::default().starting_cash
    );
    assert_eq!(
        engine.accounts.get_account("u1").unwrap().unwrap().last_portfolio_update,
        Some(today)
    );
}
