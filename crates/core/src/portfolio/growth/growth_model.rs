use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Portfolio valuation at the close of one trading day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioGrowthPoint {
    pub date: NaiveDate,
    /// Cash at the end of the day plus `market_total`.
    pub balance_total: Decimal,
    /// Cost basis of the holdings open at the end of the day.
    pub invested_total: Decimal,
    /// Market value of those holdings at the day's close.
    pub market_total: Decimal,
}

/// Points strictly newer than the last stored one, for an incremental append.
pub fn points_after(
    series: Vec<PortfolioGrowthPoint>,
    last_stored: Option<NaiveDate>,
) -> Vec<PortfolioGrowthPoint> {
    match last_stored {
        Some(last) => series.into_iter().filter(|p| p.date > last).collect(),
        None => series,
    }
}
