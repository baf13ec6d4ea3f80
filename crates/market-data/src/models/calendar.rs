use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A stock split announced for `date`.
///
/// `numerator` new units are issued for every `denominator` held, so a
/// 2-for-1 split is `2/1` and a 1-for-10 reverse split is `1/10`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockSplit {
    pub symbol: String,
    pub numerator: u32,
    pub denominator: u32,
    pub date: NaiveDate,
}

impl StockSplit {
    /// Split ratio as a decimal. `None` for a malformed zero denominator.
    pub fn ratio(&self) -> Option<Decimal> {
        if self.denominator == 0 {
            return None;
        }
        Some(Decimal::from(self.numerator) / Decimal::from(self.denominator))
    }
}

/// Market open state plus the exchange holiday calendar.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketStatus {
    pub is_open: bool,
    #[serde(default)]
    pub holidays: Vec<NaiveDate>,
}

impl MarketStatus {
    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }
}
