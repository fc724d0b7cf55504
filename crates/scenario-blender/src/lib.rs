use ranking_core::{
    ExpectedRanking, FuzzyClosenessTable, RankedAsset, RankingError, ScenarioWeights,
    PROBABILITY_TOLERANCE,
};
use std::collections::BTreeMap;

/// Blends per-scenario modal closeness coefficients into one expected
/// score per asset and produces the final descending ranking.
///
/// Only the modal coefficient is blended; the inferior/superior bounds
/// stay in the per-scenario tables for uncertainty display.
pub struct ScenarioBlender {
    tolerance: f64,
}

impl ScenarioBlender {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    pub fn blend(
        &self,
        tables: &BTreeMap<String, FuzzyClosenessTable>,
        scenarios: &[ScenarioWeights],
    ) -> Result<ExpectedRanking, RankingError> {
        let sum: f64 = scenarios.iter().map(|s| s.probability).sum();
        if (sum - 1.0).abs() > self.tolerance {
            return Err(RankingError::InvalidProbabilities { sum });
        }

        let mut scores: BTreeMap<String, f64> = BTreeMap::new();
        for (index, scenario) in scenarios.iter().enumerate() {
            let table = tables.get(&scenario.label).ok_or_else(|| {
                RankingError::MismatchedUniverse(format!(
                    "no closeness table for scenario '{}'",
                    scenario.label
                ))
            })?;
            if index == 0 {
                for symbol in table.keys() {
                    scores.insert(symbol.clone(), 0.0);
                }
            } else if table.len() != scores.len()
                || !table.keys().all(|s| scores.contains_key(s))
            {
                return Err(RankingError::MismatchedUniverse(format!(
                    "scenario '{}' covers a different asset set",
                    scenario.label
                )));
            }
            for (symbol, cc) in table {
                if let Some(score) = scores.get_mut(symbol) {
                    *score += scenario.probability * cc.modal;
                }
            }
        }

        let mut ranking: ExpectedRanking = scores
            .into_iter()
            .map(|(symbol, score)| RankedAsset { symbol, score })
            .collect();
        // Descending by score; equal scores fall back to symbol order
        // so identical inputs always rank identically.
        ranking.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });
        Ok(ranking)
    }
}

impl Default for ScenarioBlender {
    fn default() -> Self {
        Self::new(PROBABILITY_TOLERANCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ranking_core::FuzzyCloseness;

    fn cc(modal: f64) -> FuzzyCloseness {
        FuzzyCloseness {
            inferior: (modal - 0.05).max(0.0),
            modal,
            superior: (modal + 0.05).min(1.0),
        }
    }

    fn table(entries: &[(&str, f64)]) -> FuzzyClosenessTable {
        entries
            .iter()
            .map(|(symbol, modal)| (symbol.to_string(), cc(*modal)))
            .collect()
    }

    fn scenarios(probs: &[(&str, f64)]) -> Vec<ScenarioWeights> {
        probs
            .iter()
            .map(|(label, p)| ScenarioWeights::new(label, vec![1.0], *p))
            .collect()
    }

    #[test]
    fn blends_modal_coefficients_by_probability() {
        let mut tables = BTreeMap::new();
        tables.insert("baixa".to_string(), table(&[("AAA", 0.8), ("BBB", 0.2)]));
        tables.insert("alta".to_string(), table(&[("AAA", 0.4), ("BBB", 0.9)]));

        let ranking = ScenarioBlender::default()
            .blend(&tables, &scenarios(&[("baixa", 0.75), ("alta", 0.25)]))
            .unwrap();

        // AAA: 0.75*0.8 + 0.25*0.4 = 0.7; BBB: 0.75*0.2 + 0.25*0.9 = 0.375.
        assert_eq!(ranking[0].symbol, "AAA");
        assert_relative_eq!(ranking[0].score, 0.7, epsilon = 1e-12);
        assert_relative_eq!(ranking[1].score, 0.375, epsilon = 1e-12);
    }

    #[test]
    fn probabilities_outside_tolerance_are_rejected() {
        let mut tables = BTreeMap::new();
        tables.insert("baixa".to_string(), table(&[("AAA", 0.5)]));
        tables.insert("alta".to_string(), table(&[("AAA", 0.5)]));

        for bad in [0.99, 1.01] {
            let result = ScenarioBlender::default().blend(
                &tables,
                &scenarios(&[("baixa", bad - 0.5), ("alta", 0.5)]),
            );
            match result {
                Err(RankingError::InvalidProbabilities { sum }) => {
                    assert_relative_eq!(sum, bad, epsilon = 1e-9);
                }
                other => panic!("expected InvalidProbabilities, got {:?}", other),
            }
        }
    }

    #[test]
    fn ties_break_lexicographically() {
        let mut tables = BTreeMap::new();
        tables.insert(
            "unico".to_string(),
            table(&[("ZZZ", 0.5), ("AAA", 0.5), ("MMM", 0.5)]),
        );

        let ranking = ScenarioBlender::default()
            .blend(&tables, &scenarios(&[("unico", 1.0)]))
            .unwrap();

        let symbols: Vec<&str> = ranking.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAA", "MMM", "ZZZ"]);
    }

    #[test]
    fn ranking_is_a_total_order_over_the_universe() {
        let mut tables = BTreeMap::new();
        tables.insert(
            "unico".to_string(),
            table(&[("AAA", 0.3), ("BBB", 0.9), ("CCC", 0.6)]),
        );

        let ranking = ScenarioBlender::default()
            .blend(&tables, &scenarios(&[("unico", 1.0)]))
            .unwrap();

        assert_eq!(ranking.len(), 3);
        for pair in ranking.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn missing_scenario_table_is_rejected() {
        let mut tables = BTreeMap::new();
        tables.insert("baixa".to_string(), table(&[("AAA", 0.5)]));

        let result = ScenarioBlender::default()
            .blend(&tables, &scenarios(&[("baixa", 0.5), ("alta", 0.5)]));
        assert!(matches!(result, Err(RankingError::MismatchedUniverse(_))));
    }

    #[test]
    fn diverging_asset_sets_are_rejected() {
        let mut tables = BTreeMap::new();
        tables.insert("baixa".to_string(), table(&[("AAA", 0.5), ("BBB", 0.5)]));
        tables.insert("alta".to_string(), table(&[("AAA", 0.5)]));

        let result = ScenarioBlender::default()
            .blend(&tables, &scenarios(&[("baixa", 0.5), ("alta", 0.5)]));
        assert!(matches!(result, Err(RankingError::MismatchedUniverse(_))));
    }
}
