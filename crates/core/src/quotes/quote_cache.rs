use std::collections::{BTreeSet, HashMap};

use log::{debug, warn};

use crate::errors::Result;
use crate::quotes::{Quote, QuoteGateway};

/// Quotes fetched once for a batch run and shared by every user in it.
///
/// Built by [`QuoteCache::prefetch`] and then passed by reference to the
/// per-user work, so a run never asks the gateway for the same symbol twice.
#[derive(Debug, Clone, Default)]
pub struct QuoteCache {
    quotes: HashMap<String, Quote>,
}

impl QuoteCache {
    pub fn from_quotes(quotes: impl IntoIterator<Item = Quote>) -> Self {
        Self {
            quotes: quotes.into_iter().map(|q| (q.symbol.clone(), q)).collect(),
        }
    }

    /// Fetches the latest quote for each distinct symbol in one gateway call.
    ///
    /// Symbols the provider omits are simply absent from the cache; callers
    /// decide how to degrade. A gateway error fails the prefetch.
    pub async fn prefetch<I, S>(gateway: &dyn QuoteGateway, symbols: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let distinct: BTreeSet<String> = symbols.into_iter().map(Into::into).collect();
        if distinct.is_empty() {
            return Ok(Self::default());
        }

        let requested: Vec<String> = distinct.into_iter().collect();
        let quotes = gateway.get_quotes(&requested).await?;
        let cache = Self::from_quotes(quotes);

        let missing = cache.missing(&requested);
        if missing.is_empty() {
            debug!(
                "Prefetched {} quotes from {}",
                cache.len(),
                gateway.id()
            );
        } else {
            warn!(
                "{} returned no quote for {} of {} symbols: {:?}",
                gateway.id(),
                missing.len(),
                requested.len(),
                missing
            );
        }
        Ok(cache)
    }

    pub fn get(&self, symbol: &str) -> Option<&Quote> {
        self.quotes.get(symbol)
    }

    pub fn as_map(&self) -> &HashMap<String, Quote> {
        &self.quotes
    }

    /// Symbols from `symbols` that have no cached quote.
    pub fn missing(&self, symbols: &[String]) -> Vec<String> {
        symbols
            .iter()
            .filter(|s| !self.quotes.contains_key(s.as_str()))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}
