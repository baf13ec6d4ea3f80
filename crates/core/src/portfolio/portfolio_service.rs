use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use log::{debug, error, info, warn};
use rust_decimal::Decimal;

use crate::accounts::{AccountRepositoryTrait, UserAccount};
use crate::batch::BatchReport;
use crate::constants::GROWTH_PRICE_LOOKBACK_DAYS;
use crate::errors::Result;
use crate::ledger::{LedgerRepositoryTrait, TransactionHistory};
use crate::orders::{reserved_cash, OrderRepositoryTrait};
use crate::portfolio::growth::{build_growth_series, points_after, PortfolioGrowthPoint};
use crate::portfolio::holdings::{project, HoldingSnapshot, HoldingsProjection};
use crate::portfolio::splits::adjust_for_splits;
use crate::portfolio::state::{calculate_portfolio_state, PortfolioDetails};
use crate::portfolio::PortfolioRepositoryTrait;
use crate::quotes::{HistoricalPriceLoader, QuoteCache, QuoteGateway, StockSplit};
use crate::settings::EngineSettings;

#[async_trait]
pub trait PortfolioServiceTrait: Send + Sync {
    /// Recomputes the user's details from the full ledger and replaces the
    /// whole growth series. Cash has the open BUY reservations taken out.
    /// A failure leaves the stored cache untouched.
    async fn recalculate_user(&self, user_id: &str, today: NaiveDate) -> Result<PortfolioDetails>;

    /// Updates up to `nightly_batch_size` users not yet updated on `today`.
    async fn run_nightly_update(&self, today: NaiveDate) -> Result<BatchReport>;

    /// Clears the user's ledger, growth series and open orders and starts
    /// them over with their starting cash.
    async fn reset_user(&self, user_id: &str) -> Result<PortfolioDetails>;

    fn get_portfolio_details(&self, user_id: &str) -> Result<Option<PortfolioDetails>>;

    fn get_growth(&self, user_id: &str) -> Result<Vec<PortfolioGrowthPoint>>;
}

/// Market inputs shared by every user of one nightly run.
struct NightlyContext {
    quotes: QuoteCache,
    splits: Vec<StockSplit>,
    holidays: HashSet<NaiveDate>,
    today: NaiveDate,
    now: DateTime<Utc>,
}

pub struct PortfolioService {
    account_repository: Arc<dyn AccountRepositoryTrait>,
    ledger_repository: Arc<dyn LedgerRepositoryTrait>,
    portfolio_repository: Arc<dyn PortfolioRepositoryTrait>,
    order_repository: Arc<dyn OrderRepositoryTrait>,
    gateway: Arc<dyn QuoteGateway>,
    settings: EngineSettings,
}

impl PortfolioService {
    pub fn new(
        account_repository: Arc<dyn AccountRepositoryTrait>,
        ledger_repository: Arc<dyn LedgerRepositoryTrait>,
        portfolio_repository: Arc<dyn PortfolioRepositoryTrait>,
        order_repository: Arc<dyn OrderRepositoryTrait>,
        gateway: Arc<dyn QuoteGateway>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            account_repository,
            ledger_repository,
            portfolio_repository,
            order_repository,
            gateway,
            settings,
        }
    }

    fn starting_cash_for(&self, user_id: &str) -> Result<Decimal> {
        let default = self.settings.starting_cash;
        Ok(self
            .account_repository
            .get_account(user_id)?
            .map_or(default, |account| account.starting_cash_or(default)))
    }

    async fn holidays(&self) -> HashSet<NaiveDate> {
        match self.gateway.get_market_status().await {
            Ok(status) => status.holidays.into_iter().collect(),
            Err(e) => {
                warn!("Market calendar unavailable, only weekends are skipped: {}", e);
                HashSet::new()
            }
        }
    }

    /// Quote prefetch that degrades to an empty cache (break-even pricing).
    async fn prefetch_or_empty(&self, symbols: Vec<String>) -> QuoteCache {
        match QuoteCache::prefetch(self.gateway.as_ref(), symbols).await {
            Ok(cache) => cache,
            Err(e) => {
                warn!("Quote prefetch failed, pricing holdings at break-even: {}", e);
                QuoteCache::default()
            }
        }
    }

    /// Cash held for the user's open BUY orders.
    fn reserved_for(&self, user_id: &str) -> Result<Decimal> {
        Ok(reserved_cash(
            &self.order_repository.list_orders_for_user(user_id)?,
        ))
    }

    fn ledger_symbols(history: &TransactionHistory) -> Vec<String> {
        history
            .transactions
            .iter()
            .map(|t| t.symbol.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Growth series through yesterday. With `from` set, closes are only
    /// loaded from shortly before that date.
    async fn growth_series(
        &self,
        history: &TransactionHistory,
        starting_cash: Decimal,
        holidays: &HashSet<NaiveDate>,
        today: NaiveDate,
        from: Option<NaiveDate>,
    ) -> Result<Vec<PortfolioGrowthPoint>> {
        let Some(first) = history.transactions.iter().map(|t| t.trading_date()).min() else {
            return Ok(Vec::new());
        };
        let end = today - Duration::days(1);
        let load_from = match from {
            Some(date) => (date - Duration::days(GROWTH_PRICE_LOOKBACK_DAYS)).max(first),
            None => first,
        };
        if load_from > end {
            return Ok(Vec::new());
        }

        let loader = HistoricalPriceLoader::new(
            self.gateway.as_ref(),
            self.settings.historical_batch_size,
            self.settings.historical_batch_delay(),
        );
        let prices = loader
            .load(&Self::ledger_symbols(history), load_from, end)
            .await;
        build_growth_series(history, &prices, starting_cash, holidays, end)
    }

    /// Reads and projects one user's ledger.
    fn load_projection(&self, user_id: &str) -> Result<(TransactionHistory, HoldingsProjection)> {
        let history = self.ledger_repository.get_transaction_history(user_id)?;
        let projection = project(&history.transactions)?;
        Ok((history, projection))
    }

    async fn update_user(
        &self,
        account: &UserAccount,
        history: TransactionHistory,
        projection: HoldingsProjection,
        ctx: &NightlyContext,
    ) -> Result<()> {
        let user_id = account.user_id.as_str();
        let starting_cash = account.starting_cash_or(self.settings.starting_cash);

        let mut state = calculate_portfolio_state(
            &projection.holdings,
            ctx.quotes.as_map(),
            &history,
            starting_cash,
            ctx.now,
        );
        state.reserve_cash(self.reserved_for(user_id)?);
        let adjusted = adjust_for_splits(&projection.holdings, &ctx.splits);
        let details = PortfolioDetails {
            portfolio_state: state,
            holding_snapshot: HoldingSnapshot::new(adjusted, ctx.now),
        };

        let last_stored = self
            .portfolio_repository
            .get_growth(user_id)?
            .last()
            .map(|p| p.date);
        let series = self
            .growth_series(
                &history,
                starting_cash,
                &ctx.holidays,
                ctx.today,
                last_stored.map(|d| d + Duration::days(1)),
            )
            .await?;
        let new_points = points_after(series, last_stored);

        self.portfolio_repository
            .save_portfolio_details(user_id, details)
            .await?;
        let appended = self
            .portfolio_repository
            .append_growth(user_id, new_points)
            .await?;
        self.account_repository
            .mark_updated(user_id, ctx.today)
            .await?;

        debug!(
            "Nightly update for user {} done, {} growth points appended",
            user_id, appended
        );
        Ok(())
    }
}

#[async_trait]
impl PortfolioServiceTrait for PortfolioService {
    async fn recalculate_user(&self, user_id: &str, today: NaiveDate) -> Result<PortfolioDetails> {
        let now = Utc::now();
        let starting_cash = self.starting_cash_for(user_id)?;
        let (history, projection) = self.load_projection(user_id)?;

        let symbols = projection.holdings.iter().map(|h| h.symbol.clone()).collect();
        let quotes = self.prefetch_or_empty(symbols).await;
        let mut state = calculate_portfolio_state(
            &projection.holdings,
            quotes.as_map(),
            &history,
            starting_cash,
            now,
        );
        state.reserve_cash(self.reserved_for(user_id)?);

        let holidays = self.holidays().await;
        let series = self
            .growth_series(&history, starting_cash, &holidays, today, None)
            .await?;

        let details = PortfolioDetails {
            portfolio_state: state,
            holding_snapshot: HoldingSnapshot::new(projection.holdings, now),
        };
        self.portfolio_repository
            .save_portfolio_details(user_id, details.clone())
            .await?;
        let points = series.len();
        self.portfolio_repository
            .replace_growth(user_id, series)
            .await?;

        info!(
            "Recalculated portfolio for user {}: balance {}, {} growth points",
            user_id, details.portfolio_state.balance, points
        );
        Ok(details)
    }

    async fn run_nightly_update(&self, today: NaiveDate) -> Result<BatchReport> {
        let mut report = BatchReport::default();
        let accounts = self
            .account_repository
            .list_pending_update(today, self.settings.nightly_batch_size)?;
        if accounts.is_empty() {
            info!("Nightly update for {}: no users pending", today);
            return Ok(report);
        }
        info!("Nightly update for {}: {} users", today, accounts.len());

        // Ledgers are read up front so the quote prefetch covers every user.
        let mut ready = Vec::with_capacity(accounts.len());
        let mut symbols = BTreeSet::new();
        for account in accounts {
            match self.load_projection(&account.user_id) {
                Ok((history, projection)) => {
                    symbols.extend(projection.holdings.iter().map(|h| h.symbol.clone()));
                    ready.push((account, history, projection));
                }
                Err(e) => {
                    error!("Skipping user {} in nightly update: {}", account.user_id, e);
                    report.record_failure(account.user_id, &e);
                }
            }
        }

        let tomorrow = today + Duration::days(1);
        let splits = match self.gateway.get_stock_splits(tomorrow).await {
            Ok(splits) => splits,
            Err(e) => {
                warn!("Could not load splits for {}: {}", tomorrow, e);
                Vec::new()
            }
        };
        let ctx = NightlyContext {
            quotes: self.prefetch_or_empty(symbols.into_iter().collect()).await,
            splits,
            holidays: self.holidays().await,
            today,
            now: Utc::now(),
        };

        let results: Vec<(String, Result<()>)> = stream::iter(ready)
            .map(|(account, history, projection)| {
                let ctx = &ctx;
                async move {
                    let result = self.update_user(&account, history, projection, ctx).await;
                    (account.user_id, result)
                }
            })
            .buffer_unordered(self.settings.user_concurrency.max(1))
            .collect()
            .await;

        for (user_id, result) in results {
            match result {
                Ok(()) => report.record_success(user_id),
                Err(e) => {
                    error!("Nightly update failed for user {}: {}", user_id, e);
                    report.record_failure(user_id, &e);
                }
            }
        }

        info!(
            "Nightly update for {} finished: {} updated, {} failed",
            today,
            report.succeeded.len(),
            report.failed.len()
        );
        Ok(report)
    }

    async fn reset_user(&self, user_id: &str) -> Result<PortfolioDetails> {
        let starting_cash = self.starting_cash_for(user_id)?;
        let details = PortfolioDetails::initial(starting_cash, Utc::now());
        self.portfolio_repository
            .reset_user(user_id, details.clone())
            .await?;
        info!("Reset user {} to starting cash {}", user_id, starting_cash);
        Ok(details)
    }

    fn get_portfolio_details(&self, user_id: &str) -> Result<Option<PortfolioDetails>> {
        self.portfolio_repository.get_portfolio_details(user_id)
    }

    fn get_growth(&self, user_id: &str) -> Result<Vec<PortfolioGrowthPoint>> {
        self.portfolio_repository.get_growth(user_id)
    }
}
