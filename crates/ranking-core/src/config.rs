use crate::RankingError;
use serde::{Deserialize, Serialize};

/// Canonical criterion names produced by the extractor.
pub mod criterion {
    pub const RETORNO: &str = "retorno";
    pub const RETORNO_ANUAL: &str = "retorno_anual";
    pub const SHARPE: &str = "sharpe";
    pub const VOL_ANUAL: &str = "vol_anual";
    pub const DRAWDOWN: &str = "drawdown";
    pub const BETA: &str = "beta";
    pub const SKEWNESS: &str = "skewness";
    pub const LIQUIDEZ: &str = "liquidez";
    pub const CORRELACAO: &str = "correlacao";
}

/// Normalization direction for one criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CriterionDirection {
    /// Higher raw value is better; normalized as `v / max`.
    Benefit,

    /// Lower raw value is better; normalized as `min / v`.
    /// Requires a strictly positive column.
    Cost,

    /// Lower magnitude is better; the column is taken through `|v|`
    /// before the cost rule. Used for sign-indefinite criteria
    /// (drawdown, beta, skewness).
    CostMagnitude,
}

/// One criterion of the decision matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionSpec {
    pub name: String,
    pub direction: CriterionDirection,
}

impl CriterionSpec {
    pub fn new(name: &str, direction: CriterionDirection) -> Self {
        Self {
            name: name.to_string(),
            direction,
        }
    }
}

/// Ordered criterion list. The order fixes the meaning of every
/// scenario weight vector component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriteriaConfig {
    pub criteria: Vec<CriterionSpec>,
}

impl CriteriaConfig {
    /// The canonical nine-criterion configuration.
    pub fn default_nine() -> Self {
        use criterion::*;
        use CriterionDirection::*;
        Self {
            criteria: vec![
                CriterionSpec::new(RETORNO, Benefit),
                CriterionSpec::new(RETORNO_ANUAL, Benefit),
                CriterionSpec::new(SHARPE, Benefit),
                CriterionSpec::new(VOL_ANUAL, Cost),
                CriterionSpec::new(DRAWDOWN, CostMagnitude),
                CriterionSpec::new(BETA, CostMagnitude),
                CriterionSpec::new(SKEWNESS, CostMagnitude),
                CriterionSpec::new(LIQUIDEZ, Benefit),
                CriterionSpec::new(CORRELACAO, Cost),
            ],
        }
    }

    /// The reduced four-criterion configuration matching the earlier
    /// analysis variant. Same algorithm, smaller matrix.
    pub fn reduced_four() -> Self {
        use criterion::*;
        use CriterionDirection::*;
        Self {
            criteria: vec![
                CriterionSpec::new(RETORNO, Benefit),
                CriterionSpec::new(VOL_ANUAL, Cost),
                CriterionSpec::new(LIQUIDEZ, Benefit),
                CriterionSpec::new(CORRELACAO, Cost),
            ],
        }
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.criteria.iter().map(|c| c.name.clone()).collect()
    }
}

/// One macro scenario: a label, a weight vector over the criteria, and
/// the probability assigned to the scenario.
///
/// Weight vectors are consumed raw; they are not renormalized to sum
/// to 1 (only relative emphasis matters to the closeness coefficient).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioWeights {
    pub label: String,
    pub weights: Vec<f64>,
    pub probability: f64,
}

impl ScenarioWeights {
    pub fn new(label: &str, weights: Vec<f64>, probability: f64) -> Self {
        Self {
            label: label.to_string(),
            weights,
            probability,
        }
    }
}

/// Tolerance for the scenario-probability sum check.
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// Full configuration surface of an analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub criteria: CriteriaConfig,

    /// Trading days per year used for annualization.
    pub annualization_days: f64,

    /// Minimum aligned return rows required after cleaning.
    pub min_aligned_rows: usize,

    /// Fuzzy level multipliers (inferior, modal, superior).
    pub fuzzy_multipliers: [f64; 3],

    pub scenarios: Vec<ScenarioWeights>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        // Weight order follows CriteriaConfig::default_nine():
        // retorno, retorno_anual, sharpe, vol_anual, drawdown, beta,
        // skewness, liquidez, correlacao.
        Self {
            criteria: CriteriaConfig::default_nine(),
            annualization_days: 252.0,
            min_aligned_rows: 30,
            fuzzy_multipliers: [0.9, 1.0, 1.1],
            scenarios: vec![
                ScenarioWeights::new(
                    "baixa",
                    vec![0.05, 0.05, 0.10, 0.20, 0.15, 0.15, 0.05, 0.10, 0.15],
                    0.3,
                ),
                ScenarioWeights::new(
                    "estabilidade",
                    vec![0.10, 0.10, 0.15, 0.12, 0.10, 0.10, 0.05, 0.18, 0.10],
                    0.5,
                ),
                ScenarioWeights::new(
                    "alta",
                    vec![0.20, 0.18, 0.17, 0.05, 0.05, 0.05, 0.05, 0.20, 0.05],
                    0.2,
                ),
            ],
        }
    }
}

impl AnalysisConfig {
    /// Validate the configuration eagerly, before any data is touched.
    pub fn validate(&self) -> Result<(), RankingError> {
        if self.criteria.is_empty() {
            return Err(RankingError::InvalidConfig(
                "criteria list is empty".to_string(),
            ));
        }
        if self.scenarios.is_empty() {
            return Err(RankingError::InvalidConfig(
                "no scenarios configured".to_string(),
            ));
        }
        if self.min_aligned_rows == 0 {
            return Err(RankingError::InvalidConfig(
                "min_aligned_rows must be at least 1".to_string(),
            ));
        }

        let mut names: Vec<&str> = self
            .criteria
            .criteria
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        names.sort_unstable();
        names.dedup();
        if names.len() != self.criteria.len() {
            return Err(RankingError::InvalidConfig(
                "criterion names must be unique".to_string(),
            ));
        }

        let mut labels: Vec<&str> = self.scenarios.iter().map(|s| s.label.as_str()).collect();
        labels.sort_unstable();
        labels.dedup();
        if labels.len() != self.scenarios.len() {
            return Err(RankingError::InvalidConfig(
                "scenario labels must be unique".to_string(),
            ));
        }

        let expected = self.criteria.len();
        for scenario in &self.scenarios {
            if scenario.weights.len() != expected {
                return Err(RankingError::DimensionMismatch {
                    scenario: scenario.label.clone(),
                    expected,
                    actual: scenario.weights.len(),
                });
            }
            if scenario.weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
                return Err(RankingError::InvalidConfig(format!(
                    "scenario '{}' has a negative or non-finite weight",
                    scenario.label
                )));
            }
            if !scenario.probability.is_finite() || scenario.probability < 0.0 {
                return Err(RankingError::InvalidConfig(format!(
                    "scenario '{}' has an invalid probability",
                    scenario.label
                )));
            }
        }

        let sum: f64 = self.scenarios.iter().map(|s| s.probability).sum();
        if (sum - 1.0).abs() > PROBABILITY_TOLERANCE {
            return Err(RankingError::InvalidProbabilities { sum });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        AnalysisConfig::default().validate().unwrap();
    }

    #[test]
    fn reduced_four_matches_weight_length() {
        let mut config = AnalysisConfig {
            criteria: CriteriaConfig::reduced_four(),
            scenarios: vec![
                ScenarioWeights::new("baixa", vec![0.10, 0.45, 0.20, 0.25], 0.3),
                ScenarioWeights::new("estabilidade", vec![0.25, 0.25, 0.25, 0.25], 0.5),
                ScenarioWeights::new("alta", vec![0.45, 0.10, 0.25, 0.20], 0.2),
            ],
            ..AnalysisConfig::default()
        };
        config.validate().unwrap();

        config.scenarios[0].weights.pop();
        match config.validate() {
            Err(RankingError::DimensionMismatch {
                scenario,
                expected,
                actual,
            }) => {
                assert_eq!(scenario, "baixa");
                assert_eq!(expected, 4);
                assert_eq!(actual, 3);
            }
            other => panic!("expected DimensionMismatch, got {:?}", other),
        }
    }

    #[test]
    fn probabilities_must_sum_to_one() {
        let mut config = AnalysisConfig::default();
        config.scenarios[0].probability = 0.29;
        match config.validate() {
            Err(RankingError::InvalidProbabilities { sum }) => {
                assert!((sum - 0.99).abs() < 1e-9);
            }
            other => panic!("expected InvalidProbabilities, got {:?}", other),
        }
    }

    #[test]
    fn negative_weights_rejected() {
        let mut config = AnalysisConfig::default();
        config.scenarios[1].weights[3] = -0.1;
        assert!(matches!(
            config.validate(),
            Err(RankingError::InvalidConfig(_))
        ));
    }
}
