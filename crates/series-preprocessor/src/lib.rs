use chrono::NaiveDate;
use ranking_core::{AlignedPanel, DatedValue, RankingError};
use std::collections::{BTreeMap, BTreeSet};

/// Aligns raw per-symbol price and volume series into fully observed
/// date x symbol panels and derives log returns.
///
/// Alignment is by intersection: a date survives only if every symbol
/// has a finite price and volume on it. This guarantees every
/// downstream row is observed across the whole universe.
pub struct SeriesPreprocessor {
    min_aligned_rows: usize,
}

impl SeriesPreprocessor {
    pub fn new(min_aligned_rows: usize) -> Self {
        Self { min_aligned_rows }
    }

    /// Produce the log-return panel and the volume panel, both indexed
    /// by the same date axis (the first aligned date is consumed by the
    /// return differencing and appears in neither panel).
    pub fn align(
        &self,
        prices: &BTreeMap<String, Vec<DatedValue>>,
        volumes: &BTreeMap<String, Vec<DatedValue>>,
    ) -> Result<(AlignedPanel, AlignedPanel), RankingError> {
        if prices.is_empty() && volumes.is_empty() {
            return Err(RankingError::EmptyUniverse);
        }
        self.check_universe(prices, volumes)?;

        // Per-symbol date -> value maps, dropping non-finite or
        // non-positive prices (log returns need p > 0) and non-finite
        // volumes. Duplicate dates keep the last observation.
        let mut price_maps: BTreeMap<&str, BTreeMap<NaiveDate, f64>> = BTreeMap::new();
        let mut volume_maps: BTreeMap<&str, BTreeMap<NaiveDate, f64>> = BTreeMap::new();
        for (symbol, series) in prices {
            let map = series
                .iter()
                .filter(|p| p.value.is_finite() && p.value > 0.0)
                .map(|p| (p.date, p.value))
                .collect();
            price_maps.insert(symbol.as_str(), map);
        }
        for (symbol, series) in volumes {
            let map = series
                .iter()
                .filter(|v| v.value.is_finite() && v.value >= 0.0)
                .map(|v| (v.date, v.value))
                .collect();
            volume_maps.insert(symbol.as_str(), map);
        }

        // Intersection of dates observed in both panels for every symbol.
        let mut common: Option<BTreeSet<NaiveDate>> = None;
        for (symbol, price_map) in &price_maps {
            let volume_map = &volume_maps[symbol];
            let observed: BTreeSet<NaiveDate> = price_map
                .keys()
                .filter(|d| volume_map.contains_key(*d))
                .copied()
                .collect();
            common = Some(match common {
                None => observed,
                Some(acc) => acc.intersection(&observed).copied().collect(),
            });
        }
        let dates: Vec<NaiveDate> = common.unwrap_or_default().into_iter().collect();

        // One row is lost to return differencing.
        let aligned_rows = dates.len().saturating_sub(1);
        if aligned_rows < self.min_aligned_rows.max(1) {
            return Err(RankingError::InsufficientData {
                rows: aligned_rows,
                min: self.min_aligned_rows,
            });
        }

        let symbols: Vec<String> = price_maps.keys().map(|s| s.to_string()).collect();
        let return_dates: Vec<NaiveDate> = dates[1..].to_vec();

        let mut return_columns = Vec::with_capacity(symbols.len());
        let mut volume_columns = Vec::with_capacity(symbols.len());
        for symbol in &symbols {
            let price_map = &price_maps[symbol.as_str()];
            let volume_map = &volume_maps[symbol.as_str()];

            let prices_col: Vec<f64> = dates.iter().map(|d| price_map[d]).collect();
            let returns: Vec<f64> = prices_col
                .windows(2)
                .map(|w| (w[1] / w[0]).ln())
                .collect();
            let volumes_col: Vec<f64> = return_dates.iter().map(|d| volume_map[d]).collect();

            return_columns.push(returns);
            volume_columns.push(volumes_col);
        }

        Ok((
            AlignedPanel {
                dates: return_dates.clone(),
                symbols: symbols.clone(),
                columns: return_columns,
            },
            AlignedPanel {
                dates: return_dates,
                symbols,
                columns: volume_columns,
            },
        ))
    }

    fn check_universe(
        &self,
        prices: &BTreeMap<String, Vec<DatedValue>>,
        volumes: &BTreeMap<String, Vec<DatedValue>>,
    ) -> Result<(), RankingError> {
        let price_symbols: BTreeSet<&String> = prices.keys().collect();
        let volume_symbols: BTreeSet<&String> = volumes.keys().collect();
        if price_symbols != volume_symbols {
            let only_prices: Vec<&str> = price_symbols
                .difference(&volume_symbols)
                .map(|s| s.as_str())
                .collect();
            let only_volumes: Vec<&str> = volume_symbols
                .difference(&price_symbols)
                .map(|s| s.as_str())
                .collect();
            return Err(RankingError::MismatchedUniverse(format!(
                "price-only symbols {:?}, volume-only symbols {:?}",
                only_prices, only_volumes
            )));
        }
        Ok(())
    }
}
