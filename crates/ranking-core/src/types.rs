use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One historical observation for an asset.
///
/// Dates are naive: the retrieval collaborator is responsible for
/// timezone normalization before data reaches the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub adjclose: f64,
    pub volume: f64,
}

/// A single dated value, used for the separate price and volume inputs
/// to series alignment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DatedValue {
    pub date: NaiveDate,
    pub value: f64,
}

/// A date x symbol panel after intersection alignment.
///
/// Invariants: `symbols` is sorted ascending, `columns[i]` belongs to
/// `symbols[i]`, and every column has exactly `dates.len()` entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedPanel {
    pub dates: Vec<NaiveDate>,
    pub symbols: Vec<String>,
    pub columns: Vec<Vec<f64>>,
}

impl AlignedPanel {
    /// Number of aligned rows (dates).
    pub fn n_rows(&self) -> usize {
        self.dates.len()
    }

    /// Column for a symbol, if present.
    pub fn column(&self, symbol: &str) -> Option<&[f64]> {
        self.symbols
            .iter()
            .position(|s| s == symbol)
            .map(|i| self.columns[i].as_slice())
    }
}

/// Raw criteria matrix: one row per asset, one value per criterion.
///
/// Criterion order is fixed by the configuration and determines the
/// dimensionality of every scenario weight vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriteriaMatrix {
    pub criteria: Vec<String>,
    pub symbols: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl CriteriaMatrix {
    pub fn value(&self, symbol: &str, criterion: &str) -> Option<f64> {
        let row = self.symbols.iter().position(|s| s == symbol)?;
        let col = self.criteria.iter().position(|c| c == criterion)?;
        Some(self.rows[row][col])
    }

    /// Values of one criterion across all assets, in symbol order.
    pub fn column_values(&self, col: usize) -> Vec<f64> {
        self.rows.iter().map(|r| r[col]).collect()
    }
}

/// Criteria matrix after direction-aware rescaling. Same shape as
/// [`CriteriaMatrix`]; higher normalized values are uniformly better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedMatrix {
    pub criteria: Vec<String>,
    pub symbols: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

/// Triangular closeness coefficient band for one asset under one scenario.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FuzzyCloseness {
    pub inferior: f64,
    pub modal: f64,
    pub superior: f64,
}

/// Per-scenario table of fuzzy closeness coefficients, keyed by symbol.
pub type FuzzyClosenessTable = BTreeMap<String, FuzzyCloseness>;

/// One entry of the final ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedAsset {
    pub symbol: String,
    pub score: f64,
}

/// Final blended ranking, sorted by descending expected score with
/// lexicographic tie-break.
pub type ExpectedRanking = Vec<RankedAsset>;

/// Everything the pipeline exposes to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub criteria: CriteriaMatrix,
    pub normalized: NormalizedMatrix,
    pub fuzzy: BTreeMap<String, FuzzyClosenessTable>,
    pub ranking: ExpectedRanking,
}
