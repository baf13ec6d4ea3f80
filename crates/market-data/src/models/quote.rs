use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Latest market quote for a symbol.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,

    /// Current price (last trade)
    pub price: Decimal,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_close: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_volume: Option<Decimal>,

    /// Timestamp of the quote
    pub timestamp: DateTime<Utc>,
}

impl Quote {
    /// Create a new quote with minimal required fields
    pub fn new(symbol: impl Into<String>, price: Decimal, timestamp: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            previous_close: None,
            volume: None,
            avg_volume: None,
            timestamp,
        }
    }

    /// Price change against the previous close, if known.
    pub fn change(&self) -> Option<Decimal> {
        self.previous_close.map(|prev| self.price - prev)
    }
}

/// One daily (or coarser) OHLCV bar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalPrice {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    #[serde(default)]
    pub volume: Decimal,
}

/// Bar size requested from the historical endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Daily => "1d",
            Granularity::Weekly => "1wk",
            Granularity::Monthly => "1mo",
        }
    }
}
