use crate::portfolio::holdings::Holding;
use crate::quotes::StockSplit;

use log::{info, warn};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Applies tomorrow's splits to a holdings list.
///
/// Non-crypto holdings with a matching split get
/// `units = max(1, floor(units * numerator / denominator))`. Crypto holdings,
/// holdings with no split and splits with a zero denominator pass through
/// unchanged. Cost basis is not touched, so break-even is re-derived from
/// the new unit count.
pub fn adjust_for_splits(holdings: &[Holding], splits: &[StockSplit]) -> Vec<Holding> {
    let by_symbol: HashMap<&str, &StockSplit> =
        splits.iter().map(|s| (s.symbol.as_str(), s)).collect();

    holdings
        .iter()
        .map(|holding| {
            if holding.is_crypto() {
                return holding.clone();
            }
            let Some(split) = by_symbol.get(holding.symbol.as_str()) else {
                return holding.clone();
            };
            if split.ratio().is_none() {
                warn!(
                    "Ignoring split for {} with zero denominator ({}/{})",
                    split.symbol, split.numerator, split.denominator
                );
                return holding.clone();
            }

            let scaled = u128::from(holding.units) * u128::from(split.numerator)
                / u128::from(split.denominator);
            let units = u64::try_from(scaled).unwrap_or(u64::MAX).max(1);
            info!(
                "Split {}/{} for {}: {} -> {} units",
                split.numerator, split.denominator, holding.symbol, holding.units, units
            );

            Holding {
                units,
                break_even_price: holding.invested_total / Decimal::from(units),
                ..holding.clone()
            }
        })
        .collect()
}
