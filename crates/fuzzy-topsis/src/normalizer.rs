use ranking_core::{
    CriteriaConfig, CriteriaMatrix, CriterionDirection, NormalizedMatrix, RankingError,
};

/// Rescales the raw criteria matrix so higher values are uniformly
/// better, the precondition for TOPSIS distances.
///
/// Benefit columns divide by the column maximum, cost columns divide
/// the column minimum by each value, and magnitude-cost columns apply
/// the cost rule to absolute values. A constant column normalizes to
/// uniform 1s and therefore contributes nothing to any distance, which
/// is the intended way of skipping it.
pub struct MatrixNormalizer;

impl MatrixNormalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(
        &self,
        matrix: &CriteriaMatrix,
        config: &CriteriaConfig,
    ) -> Result<NormalizedMatrix, RankingError> {
        if matrix.criteria != config.names() {
            return Err(RankingError::InvalidConfig(format!(
                "matrix criteria {:?} do not match configured criteria {:?}",
                matrix.criteria,
                config.names()
            )));
        }

        let n_assets = matrix.symbols.len();
        let mut rows = vec![Vec::with_capacity(config.len()); n_assets];

        for (j, spec) in config.criteria.iter().enumerate() {
            let raw = matrix.column_values(j);
            if let Some(bad) = raw.iter().find(|v| !v.is_finite()) {
                return Err(RankingError::DegenerateCriterion {
                    criterion: spec.name.clone(),
                    reason: format!("non-finite raw value {}", bad),
                });
            }

            let normalized = match spec.direction {
                CriterionDirection::Benefit => {
                    let max = raw.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                    if max <= 0.0 {
                        return Err(RankingError::DegenerateCriterion {
                            criterion: spec.name.clone(),
                            reason: format!("non-positive column maximum {}", max),
                        });
                    }
                    raw.iter().map(|v| v / max).collect::<Vec<f64>>()
                }
                CriterionDirection::Cost => {
                    let min = raw.iter().cloned().fold(f64::INFINITY, f64::min);
                    if min <= 0.0 {
                        return Err(RankingError::DegenerateCriterion {
                            criterion: spec.name.clone(),
                            reason: format!("non-positive column minimum {}", min),
                        });
                    }
                    raw.iter().map(|v| min / v).collect()
                }
                CriterionDirection::CostMagnitude => {
                    let magnitudes: Vec<f64> = raw.iter().map(|v| v.abs()).collect();
                    let min = magnitudes.iter().cloned().fold(f64::INFINITY, f64::min);
                    if min == 0.0 {
                        return Err(RankingError::DegenerateCriterion {
                            criterion: spec.name.clone(),
                            reason: "zero magnitude in column".to_string(),
                        });
                    }
                    magnitudes.iter().map(|m| min / m).collect()
                }
            };

            for (i, value) in normalized.into_iter().enumerate() {
                rows[i].push(value);
            }
        }

        Ok(NormalizedMatrix {
            criteria: matrix.criteria.clone(),
            symbols: matrix.symbols.clone(),
            rows,
        })
    }
}

impl Default for MatrixNormalizer {
    fn default() -> Self {
        Self::new()
    }
}
