use nalgebra::{DMatrix, RowDVector};
use ranking_core::{
    CriteriaConfig, CriterionDirection, FuzzyCloseness, FuzzyClosenessTable, NormalizedMatrix,
    RankingError, ScenarioWeights,
};
use std::collections::BTreeMap;

/// TOPSIS scorer with a triangular fuzzy band per asset.
///
/// For each scenario the weight vector is evaluated at three levels.
/// At level `m`, benefit-criterion weights scale by `m` and
/// cost-criterion weights by `2 - m`, so the band captures how the
/// ranking shifts as preference tilts between return-like and
/// risk-like criteria. A uniform multiplier on the whole vector would
/// leave the closeness coefficient unchanged (every distance scales by
/// the same factor), so it cannot produce a band.
pub struct FuzzyTopsisScorer {
    multipliers: [f64; 3],
}

impl FuzzyTopsisScorer {
    pub fn new(multipliers: [f64; 3]) -> Self {
        Self { multipliers }
    }

    /// One fuzzy closeness table per scenario, every asset present in
    /// every table.
    pub fn score(
        &self,
        normalized: &NormalizedMatrix,
        config: &CriteriaConfig,
        scenarios: &[ScenarioWeights],
    ) -> Result<BTreeMap<String, FuzzyClosenessTable>, RankingError> {
        if normalized.criteria != config.names() {
            return Err(RankingError::InvalidConfig(format!(
                "matrix criteria {:?} do not match configured criteria {:?}",
                normalized.criteria,
                config.names()
            )));
        }

        let n_assets = normalized.symbols.len();
        let n_criteria = config.len();
        let base = DMatrix::from_fn(n_assets, n_criteria, |i, j| normalized.rows[i][j]);

        let mut out = BTreeMap::new();
        for scenario in scenarios {
            if scenario.weights.len() != n_criteria {
                return Err(RankingError::DimensionMismatch {
                    scenario: scenario.label.clone(),
                    expected: n_criteria,
                    actual: scenario.weights.len(),
                });
            }

            let mut levels = Vec::with_capacity(3);
            for multiplier in self.multipliers {
                let weights: Vec<f64> = config
                    .criteria
                    .iter()
                    .zip(&scenario.weights)
                    .map(|(spec, w)| match spec.direction {
                        CriterionDirection::Benefit => multiplier * w,
                        CriterionDirection::Cost | CriterionDirection::CostMagnitude => {
                            (2.0 - multiplier) * w
                        }
                    })
                    .collect();
                levels.push(closeness_coefficients(
                    &base,
                    &weights,
                    &scenario.label,
                    &normalized.symbols,
                )?);
            }

            let mut table = FuzzyClosenessTable::new();
            for (i, symbol) in normalized.symbols.iter().enumerate() {
                table.insert(
                    symbol.clone(),
                    FuzzyCloseness {
                        inferior: levels[0][i],
                        modal: levels[1][i],
                        superior: levels[2][i],
                    },
                );
            }
            out.insert(scenario.label.clone(), table);
        }
        Ok(out)
    }
}

/// Classic TOPSIS closeness coefficients for one weighted level.
fn closeness_coefficients(
    base: &DMatrix<f64>,
    weights: &[f64],
    scenario: &str,
    symbols: &[String],
) -> Result<Vec<f64>, RankingError> {
    let (n_assets, n_criteria) = base.shape();

    let mut weighted = base.clone();
    for (j, w) in weights.iter().enumerate() {
        for v in weighted.column_mut(j).iter_mut() {
            *v *= w;
        }
    }

    let pos = RowDVector::from_fn(n_criteria, |_, j| weighted.column(j).max());
    let neg = RowDVector::from_fn(n_criteria, |_, j| weighted.column(j).min());

    let mut coefficients = Vec::with_capacity(n_assets);
    for i in 0..n_assets {
        let row = weighted.row(i).clone_owned();
        let d_pos = (&row - &pos).norm();
        let d_neg = (&row - &neg).norm();
        let total = d_pos + d_neg;
        if total == 0.0 {
            return Err(RankingError::DegenerateDistance {
                scenario: scenario.to_string(),
                symbol: symbols[i].clone(),
            });
        }
        coefficients.push(d_neg / total);
    }
    Ok(coefficients)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ranking_core::CriterionSpec;

    fn normalized(criteria: &[&str], symbols: &[&str], rows: Vec<Vec<f64>>) -> NormalizedMatrix {
        NormalizedMatrix {
            criteria: criteria.iter().map(|c| c.to_string()).collect(),
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
            rows,
        }
    }

    fn config(specs: &[(&str, CriterionDirection)]) -> CriteriaConfig {
        CriteriaConfig {
            criteria: specs
                .iter()
                .map(|(name, dir)| CriterionSpec::new(name, *dir))
                .collect(),
        }
    }

    fn scenario(label: &str, weights: Vec<f64>) -> ScenarioWeights {
        ScenarioWeights::new(label, weights, 1.0)
    }

    #[test]
    fn dominant_asset_scores_one_dominated_scores_zero() {
        let n = normalized(
            &["retorno", "liquidez"],
            &["AAA", "BBB"],
            vec![vec![1.0, 1.0], vec![0.4, 0.5]],
        );
        let c = config(&[
            ("retorno", CriterionDirection::Benefit),
            ("liquidez", CriterionDirection::Benefit),
        ]);
        let scorer = FuzzyTopsisScorer::new([0.9, 1.0, 1.1]);
        let tables = scorer
            .score(&n, &c, &[scenario("alta", vec![0.6, 0.4])])
            .unwrap();

        let table = &tables["alta"];
        assert_relative_eq!(table["AAA"].modal, 1.0, epsilon = 1e-12);
        assert_relative_eq!(table["BBB"].modal, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn coefficients_stay_in_unit_interval() {
        let n = normalized(
            &["retorno", "vol_anual", "liquidez"],
            &["AAA", "BBB", "CCC"],
            vec![
                vec![1.0, 0.3, 0.7],
                vec![0.5, 1.0, 1.0],
                vec![0.2, 0.6, 0.4],
            ],
        );
        let c = config(&[
            ("retorno", CriterionDirection::Benefit),
            ("vol_anual", CriterionDirection::Cost),
            ("liquidez", CriterionDirection::Benefit),
        ]);
        let scorer = FuzzyTopsisScorer::new([0.9, 1.0, 1.1]);
        let tables = scorer
            .score(
                &n,
                &c,
                &[
                    scenario("baixa", vec![0.2, 0.6, 0.2]),
                    scenario("alta", vec![0.6, 0.1, 0.3]),
                ],
            )
            .unwrap();

        assert_eq!(tables.len(), 2);
        for table in tables.values() {
            assert_eq!(table.len(), 3);
            for cc in table.values() {
                for v in [cc.inferior, cc.modal, cc.superior] {
                    assert!((0.0..=1.0).contains(&v), "closeness {} out of [0,1]", v);
                }
            }
        }
    }

    #[test]
    fn benefit_dominant_asset_has_ordered_band() {
        // AAA leads on the benefit criterion; raising the benefit tilt
        // must not lower its closeness.
        let n = normalized(
            &["retorno", "vol_anual"],
            &["AAA", "BBB"],
            vec![vec![1.0, 0.4], vec![0.3, 1.0]],
        );
        let c = config(&[
            ("retorno", CriterionDirection::Benefit),
            ("vol_anual", CriterionDirection::Cost),
        ]);
        let scorer = FuzzyTopsisScorer::new([0.9, 1.0, 1.1]);
        let tables = scorer
            .score(&n, &c, &[scenario("alta", vec![0.5, 0.5])])
            .unwrap();

        let cc = tables["alta"]["AAA"];
        assert!(cc.inferior <= cc.modal && cc.modal <= cc.superior);
    }

    #[test]
    fn uniform_weight_scaling_leaves_closeness_unchanged() {
        let n = normalized(
            &["retorno", "vol_anual"],
            &["AAA", "BBB", "CCC"],
            vec![vec![1.0, 0.4], vec![0.3, 1.0], vec![0.7, 0.8]],
        );
        let base = DMatrix::from_fn(3, 2, |i, j| n.rows[i][j]);
        let symbols = n.symbols.clone();

        let cc = closeness_coefficients(&base, &[0.3, 0.7], "s", &symbols).unwrap();
        let cc_scaled = closeness_coefficients(&base, &[0.6, 1.4], "s", &symbols).unwrap();
        for (a, b) in cc.iter().zip(cc_scaled.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-12);
        }
    }

    #[test]
    fn wrong_weight_length_is_a_dimension_mismatch() {
        let n = normalized(&["retorno"], &["AAA", "BBB"], vec![vec![1.0], vec![0.5]]);
        let c = config(&[("retorno", CriterionDirection::Benefit)]);
        let scorer = FuzzyTopsisScorer::new([0.9, 1.0, 1.1]);
        match scorer.score(&n, &c, &[scenario("alta", vec![0.5, 0.5])]) {
            Err(RankingError::DimensionMismatch {
                scenario,
                expected,
                actual,
            }) => {
                assert_eq!(scenario, "alta");
                assert_eq!(expected, 1);
                assert_eq!(actual, 2);
            }
            other => panic!("expected DimensionMismatch, got {:?}", other),
        }
    }

    #[test]
    fn identical_rows_are_a_degenerate_distance() {
        let n = normalized(
            &["retorno", "vol_anual"],
            &["AAA", "BBB"],
            vec![vec![0.8, 0.6], vec![0.8, 0.6]],
        );
        let c = config(&[
            ("retorno", CriterionDirection::Benefit),
            ("vol_anual", CriterionDirection::Cost),
        ]);
        let scorer = FuzzyTopsisScorer::new([0.9, 1.0, 1.1]);
        match scorer.score(&n, &c, &[scenario("alta", vec![0.5, 0.5])]) {
            Err(RankingError::DegenerateDistance { scenario, symbol }) => {
                assert_eq!(scenario, "alta");
                assert_eq!(symbol, "AAA");
            }
            other => panic!("expected DegenerateDistance, got {:?}", other),
        }
    }
}
