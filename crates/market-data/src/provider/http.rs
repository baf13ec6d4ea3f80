//! JSON-over-HTTP quote gateway.
//!
//! Talks to a quote service exposing:
//! - `GET /quotes?symbols=AAPL,MSFT` -> `[Quote]`
//! - `GET /historical/{symbol}?from=&to=&granularity=` -> `[HistoricalPrice]`
//! - `GET /splits?date=YYYY-MM-DD` -> `[StockSplit]`
//! - `GET /market-status` -> `MarketStatus`

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::errors::MarketDataError;
use crate::models::{Granularity, HistoricalPrice, MarketStatus, Quote, StockSplit};
use crate::provider::QuoteGateway;

const PROVIDER_ID: &str = "QUOTE_API";

/// Maximum number of symbols sent in a single `/quotes` request.
const MAX_SYMBOLS_PER_REQUEST: usize = 50;

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<String>,
}

pub struct HttpQuoteGateway {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpQuoteGateway {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    async fn fetch(&self, endpoint: &str, params: &[(&str, String)]) -> Result<String, MarketDataError> {
        let url = format!("{}{}", self.base_url, endpoint);

        let mut request = self.client.get(&url).query(params);
        if let Some(key) = &self.api_key {
            request = request.header("X-Api-Key", key);
        }

        debug!("Quote API request: {} with {} params", endpoint, params.len());

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                MarketDataError::Timeout {
                    provider: PROVIDER_ID.to_string(),
                }
            } else {
                MarketDataError::Network(e)
            }
        })?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketDataError::RateLimited {
                provider: PROVIDER_ID.to_string(),
            });
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(MarketDataError::SymbolNotFound(endpoint.to_string()));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .ok()
                .and_then(|e| e.error)
                .unwrap_or_else(|| format!("HTTP {} - {}", status, body));
            return Err(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message,
            });
        }

        response
            .text()
            .await
            .map_err(|e| MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to read response: {}", e),
            })
    }
}

/// A 2xx body that does not decode is not retried.
fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T, MarketDataError> {
    serde_json::from_str(body).map_err(|e| MarketDataError::ValidationFailed {
        message: format!("Failed to parse response: {}", e),
    })
}

/// Drops bars that violate `low <= close <= high` and sorts the rest by date.
fn sanitize_history(symbol: &str, mut bars: Vec<HistoricalPrice>) -> Vec<HistoricalPrice> {
    let before = bars.len();
    bars.retain(|bar| bar.low <= bar.close && bar.close <= bar.high && bar.close.is_sign_positive());
    if bars.len() != before {
        warn!(
            "Dropped {} invalid historical bars for {}",
            before - bars.len(),
            symbol
        );
    }
    bars.sort_by_key(|bar| bar.date);
    bars.dedup_by_key(|bar| bar.date);
    bars
}

#[async_trait]
impl QuoteGateway for HttpQuoteGateway {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn get_quotes(&self, symbols: &[String]) -> Result<Vec<Quote>, MarketDataError> {
        let mut quotes = Vec::with_capacity(symbols.len());
        for chunk in symbols.chunks(MAX_SYMBOLS_PER_REQUEST) {
            let body = self
                .fetch("/quotes", &[("symbols", chunk.join(","))])
                .await?;
            let mut parsed: Vec<Quote> = parse_body(&body)?;
            quotes.append(&mut parsed);
        }
        Ok(quotes)
    }

    async fn get_historical_prices(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
        granularity: Granularity,
    ) -> Result<Vec<HistoricalPrice>, MarketDataError> {
        let endpoint = format!("/historical/{}", symbol);
        let params = [
            ("from", from.format("%Y-%m-%d").to_string()),
            ("to", to.format("%Y-%m-%d").to_string()),
            ("granularity", granularity.as_str().to_string()),
        ];
        let body = self.fetch(&endpoint, &params).await?;
        let bars: Vec<HistoricalPrice> = parse_body(&body)?;
        if bars.is_empty() {
            return Err(MarketDataError::NoDataForRange);
        }
        let bars = sanitize_history(symbol, bars);
        if bars.is_empty() {
            return Err(MarketDataError::ValidationFailed {
                message: format!("No valid historical bars for {}", symbol),
            });
        }
        Ok(bars)
    }

    async fn get_stock_splits(
        &self,
        for_date: NaiveDate,
    ) -> Result<Vec<StockSplit>, MarketDataError> {
        let body = self
            .fetch("/splits", &[("date", for_date.format("%Y-%m-%d").to_string())])
            .await?;
        parse_body(&body)
    }

    async fn get_market_status(&self) -> Result<MarketStatus, MarketDataError> {
        let body = self.fetch("/market-status", &[]).await?;
        parse_body(&body)
    }
}
