//! Token bucket rate limiting for quote gateways.
//!
//! [`RateLimitedGateway`] wraps any [`QuoteGateway`] and waits for a token
//! before each outbound call, so fleet-wide batch jobs cannot exceed the
//! provider's request budget.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::errors::MarketDataError;
use crate::models::{Granularity, HistoricalPrice, MarketStatus, Quote, StockSplit};
use crate::provider::QuoteGateway;

/// Default rate limit: 60 requests per minute.
const DEFAULT_REQUESTS_PER_MINUTE: u32 = 60;

/// Default bucket capacity (allows bursting).
const DEFAULT_BUCKET_CAPACITY: f64 = 10.0;

/// Rate limiter configuration for a gateway.
#[derive(Clone, Debug)]
pub struct RateLimitConfig {
    /// Maximum requests per minute.
    pub requests_per_minute: u32,
    /// Maximum burst capacity.
    pub burst_capacity: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: DEFAULT_REQUESTS_PER_MINUTE,
            burst_capacity: DEFAULT_BUCKET_CAPACITY,
        }
    }
}

/// Token bucket for a single gateway.
#[derive(Debug)]
pub struct TokenBucket {
    tokens: f64,
    last_update: Instant,
    /// Tokens per second.
    rate: f64,
    capacity: f64,
}

impl TokenBucket {
    pub fn new(config: &RateLimitConfig) -> Self {
        let capacity = config.burst_capacity.max(1.0);
        Self {
            tokens: capacity,
            last_update: Instant::now(),
            rate: f64::from(config.requests_per_minute.max(1)) / 60.0,
            capacity,
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate).min(self.capacity);
        self.last_update = now;
    }

    /// Try to take a token immediately.
    pub fn try_acquire(&mut self) -> bool {
        self.refill();

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Wait time until a token becomes available.
    pub fn time_until_available(&mut self) -> Duration {
        self.refill();

        if self.tokens >= 1.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64((1.0 - self.tokens) / self.rate)
        }
    }
}

/// Gateway decorator applying a token bucket to every call.
pub struct RateLimitedGateway<G> {
    inner: G,
    bucket: Mutex<TokenBucket>,
}

impl<G: QuoteGateway> RateLimitedGateway<G> {
    pub fn new(inner: G, config: RateLimitConfig) -> Self {
        Self {
            inner,
            bucket: Mutex::new(TokenBucket::new(&config)),
        }
    }

    /// Lock the bucket, recovering from poison. A poisoned bucket only means
    /// slightly inaccurate limiting.
    fn lock_bucket(&self) -> MutexGuard<'_, TokenBucket> {
        self.bucket.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter bucket mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Waits (asynchronously) until a token is available.
    pub async fn acquire(&self) {
        loop {
            let wait_time = {
                let mut bucket = self.lock_bucket();
                if bucket.try_acquire() {
                    return;
                }
                bucket.time_until_available()
            };

            if wait_time > Duration::ZERO {
                debug!(
                    "Rate limiter: waiting {:?} for gateway '{}'",
                    wait_time,
                    self.inner.id()
                );
                tokio::time::sleep(wait_time).await;
            }
        }
    }
}

#[async_trait]
impl<G: QuoteGateway> QuoteGateway for RateLimitedGateway<G> {
    fn id(&self) -> &'static str {
        self.inner.id()
    }

    async fn get_quotes(&self, symbols: &[String]) -> Result<Vec<Quote>, MarketDataError> {
        self.acquire().await;
        self.inner.get_quotes(symbols).await
    }

    async fn get_historical_prices(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
        granularity: Granularity,
    ) -> Result<Vec<HistoricalPrice>, MarketDataError> {
        self.acquire().await;
        self.inner
            .get_historical_prices(symbol, from, to, granularity)
            .await
    }

    async fn get_stock_splits(
        &self,
        for_date: NaiveDate,
    ) -> Result<Vec<StockSplit>, MarketDataError> {
        self.acquire().await;
        self.inner.get_stock_splits(for_date).await
    }

    async fn get_market_status(&self) -> Result<MarketStatus, MarketDataError> {
        self.acquire().await;
        self.inner.get_market_status().await
    }
}
