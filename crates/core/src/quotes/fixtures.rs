//! In-memory quote gateway for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;

use crate::quotes::{
    Granularity, HistoricalPrice, MarketDataError, MarketStatus, Quote, QuoteGateway, StockSplit,
};

#[derive(Default)]
pub struct StaticGateway {
    pub quotes: HashMap<String, Decimal>,
    pub history: HashMap<String, Vec<HistoricalPrice>>,
    pub splits: Vec<StockSplit>,
    pub status: MarketStatus,
    pub failing_symbols: HashSet<String>,
    pub fail_quotes: bool,
    pub quote_calls: Mutex<Vec<Vec<String>>>,
    pub history_calls: Mutex<Vec<String>>,
}

impl StaticGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quote(mut self, symbol: &str, price: Decimal) -> Self {
        self.quotes.insert(symbol.to_string(), price);
        self
    }

    pub fn with_closes(mut self, symbol: &str, closes: &[(NaiveDate, Decimal)]) -> Self {
        let bars = closes
            .iter()
            .map(|(date, close)| HistoricalPrice {
                date: *date,
                open: *close,
                high: *close,
                low: *close,
                close: *close,
                volume: Decimal::ZERO,
            })
            .collect();
        self.history.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_split(mut self, split: StockSplit) -> Self {
        self.splits.push(split);
        self
    }

    pub fn with_market_open(mut self, is_open: bool) -> Self {
        self.status.is_open = is_open;
        self
    }

    pub fn with_holiday(mut self, date: NaiveDate) -> Self {
        self.status.holidays.push(date);
        self
    }

    pub fn failing_history_for(mut self, symbol: &str) -> Self {
        self.failing_symbols.insert(symbol.to_string());
        self
    }

    pub fn quote_call_count(&self) -> usize {
        self.quote_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl QuoteGateway for StaticGateway {
    fn id(&self) -> &'static str {
        "STATIC"
    }

    async fn get_quotes(&self, symbols: &[String]) -> Result<Vec<Quote>, MarketDataError> {
        self.quote_calls.lock().unwrap().push(symbols.to_vec());
        if self.fail_quotes {
            return Err(MarketDataError::Timeout {
                provider: "STATIC".to_string(),
            });
        }
        let ts = Utc.with_ymd_and_hms(2024, 3, 8, 15, 0, 0).unwrap();
        Ok(symbols
            .iter()
            .filter_map(|s| self.quotes.get(s).map(|p| Quote::new(s.clone(), *p, ts)))
            .collect())
    }

    async fn get_historical_prices(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
        _granularity: Granularity,
    ) -> Result<Vec<HistoricalPrice>, MarketDataError> {
        self.history_calls.lock().unwrap().push(symbol.to_string());
        if self.failing_symbols.contains(symbol) {
            return Err(MarketDataError::SymbolNotFound(symbol.to_string()));
        }
        Ok(self
            .history
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= from && b.date <= to)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_stock_splits(
        &self,
        for_date: NaiveDate,
    ) -> Result<Vec<StockSplit>, MarketDataError> {
        Ok(self
            .splits
            .iter()
            .filter(|s| s.date == for_date)
            .cloned()
            .collect())
    }

    async fn get_market_status(&self) -> Result<MarketStatus, MarketDataError> {
        Ok(self.status.clone())
    }
}
