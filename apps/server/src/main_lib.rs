use std::sync::Arc;

use crate::config::Config;
use papertrade_core::{
    accounts::AccountRepositoryTrait,
    orders::{OrderExecutionService, OrderExecutionServiceTrait},
    portfolio::{PortfolioService, PortfolioServiceTrait},
    quotes::QuoteGateway,
    settings::EngineSettings,
};
use papertrade_market_data::{HttpQuoteGateway, RateLimitConfig, RateLimitedGateway};
use papertrade_storage_sqlite::{
    accounts::AccountRepository, init, ledger::LedgerRepository, orders::OrderRepository,
    portfolio::PortfolioRepository, spawn_writer,
};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub struct AppState {
    pub portfolio_service: Arc<dyn PortfolioServiceTrait>,
    pub order_service: Arc<dyn OrderExecutionServiceTrait>,
    pub account_repository: Arc<dyn AccountRepositoryTrait>,
    pub settings: EngineSettings,
}

/// Installs the global subscriber. `log` records from the library crates are
/// forwarded into it.
pub fn init_tracing() {
    let log_format = std::env::var("PT_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(true))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let http = HttpQuoteGateway::new(
        config.quote_api_url.clone(),
        config.quote_api_key.clone(),
        config.request_timeout,
    );
    let rate_limit = RateLimitConfig {
        requests_per_minute: config.quote_requests_per_minute,
        ..RateLimitConfig::default()
    };
    let gateway: Arc<dyn QuoteGateway> = Arc::new(RateLimitedGateway::new(http, rate_limit));
    tracing::info!(
        "Quote service at {} ({} requests/min)",
        config.quote_api_url,
        config.quote_requests_per_minute
    );
    build_state_with_gateway(config, gateway).await
}

/// Wires storage and services around an already built quote gateway.
pub async fn build_state_with_gateway(
    config: &Config,
    gateway: Arc<dyn QuoteGateway>,
) -> anyhow::Result<Arc<AppState>> {
    let db = init(&config.db_path)?;
    tracing::info!("Database path in use: {}", config.db_path);
    let writer = spawn_writer(db.clone(), config.engine.transaction_max_attempts)?;

    let account_repository = Arc::new(AccountRepository::new(db.clone(), writer.clone()));
    let ledger_repository = Arc::new(LedgerRepository::new(db.clone(), writer.clone()));
    let portfolio_repository = Arc::new(PortfolioRepository::new(db.clone(), writer.clone()));
    let order_repository = Arc::new(OrderRepository::new(db, writer));

    let portfolio_service = Arc::new(PortfolioService::new(
        account_repository.clone(),
        ledger_repository,
        portfolio_repository,
        order_repository.clone(),
        gateway.clone(),
        config.engine.clone(),
    ));
    let order_service = Arc::new(OrderExecutionService::new(
        order_repository,
        account_repository.clone(),
        gateway,
        config.engine.clone(),
    ));

    Ok(Arc::new(AppState {
        portfolio_service,
        order_service,
        account_repository,
        settings: config.engine.clone(),
    }))
}
