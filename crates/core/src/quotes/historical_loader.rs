use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use chrono::NaiveDate;
use futures::future::join_all;
use log::{debug, error, warn};

use crate::quotes::{Granularity, HistoricalPrice, QuoteGateway};

/// Fetches daily closes for many symbols without tripping provider limits.
///
/// Symbols are requested in groups of `batch_size`, concurrently within a
/// group, with `batch_delay` of idle time between groups.
pub struct HistoricalPriceLoader<'a> {
    gateway: &'a dyn QuoteGateway,
    batch_size: usize,
    batch_delay: Duration,
}

impl<'a> HistoricalPriceLoader<'a> {
    pub fn new(gateway: &'a dyn QuoteGateway, batch_size: usize, batch_delay: Duration) -> Self {
        Self {
            gateway,
            batch_size: batch_size.max(1),
            batch_delay,
        }
    }

    /// Daily bars for each symbol over `[from, to]`.
    ///
    /// A symbol whose fetch fails maps to an empty series; the growth builder
    /// then values it at break-even for the whole range.
    pub async fn load(
        &self,
        symbols: &[String],
        from: NaiveDate,
        to: NaiveDate,
    ) -> HashMap<String, Vec<HistoricalPrice>> {
        let distinct: Vec<&String> = symbols.iter().collect::<BTreeSet<_>>().into_iter().collect();
        let mut prices = HashMap::with_capacity(distinct.len());

        for (index, group) in distinct.chunks(self.batch_size).enumerate() {
            if index > 0 && !self.batch_delay.is_zero() {
                debug!(
                    "Waiting {:?} before historical batch {}",
                    self.batch_delay,
                    index + 1
                );
                tokio::time::sleep(self.batch_delay).await;
            }

            let fetches = group.iter().map(|symbol| async move {
                let result = self
                    .gateway
                    .get_historical_prices(symbol, from, to, Granularity::Daily)
                    .await;
                (symbol.to_string(), result)
            });

            for (symbol, result) in join_all(fetches).await {
                let series = match result {
                    Ok(series) => series,
                    Err(e) if e.retry_class().is_transient() => {
                        warn!(
                            "Historical prices for {} ({} to {}) unavailable this run: {}",
                            symbol, from, to, e
                        );
                        Vec::new()
                    }
                    Err(e) => {
                        error!(
                            "Historical prices for {} ({} to {}) failed: {}",
                            symbol, from, to, e
                        );
                        Vec::new()
                    }
                };
                prices.insert(symbol, series);
            }
        }

        prices
    }
}
