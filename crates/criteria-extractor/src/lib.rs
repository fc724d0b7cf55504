use ranking_core::{config::criterion, AlignedPanel, CriteriaConfig, CriteriaMatrix, RankingError};
use rayon::prelude::*;
use statrs::statistics::Statistics;

/// Computes the per-asset criteria matrix from aligned log-return and
/// volume panels.
///
/// Every criterion is a column-wise scalar over the shared date axis.
/// The market proxy is the equal-weighted row-wise mean of all assets'
/// log returns, not an external index.
pub struct CriteriaExtractor {
    annualization_days: f64,
}

impl CriteriaExtractor {
    pub fn new(annualization_days: f64) -> Self {
        Self { annualization_days }
    }

    /// Extract exactly the criteria the configuration names, in order.
    pub fn extract(
        &self,
        returns: &AlignedPanel,
        volumes: &AlignedPanel,
        config: &CriteriaConfig,
    ) -> Result<CriteriaMatrix, RankingError> {
        if returns.symbols.is_empty() {
            return Err(RankingError::EmptyUniverse);
        }
        if returns.symbols != volumes.symbols {
            return Err(RankingError::MismatchedUniverse(format!(
                "return panel covers {:?}, volume panel covers {:?}",
                returns.symbols, volumes.symbols
            )));
        }
        if returns.n_rows() != volumes.n_rows() {
            return Err(RankingError::MismatchedUniverse(format!(
                "return panel has {} rows, volume panel has {}",
                returns.n_rows(),
                volumes.n_rows()
            )));
        }
        let n = returns.n_rows();
        if n < 2 {
            return Err(RankingError::InsufficientData { rows: n, min: 2 });
        }

        // Equal-weighted market proxy, shared by beta and correlacao.
        let market: Vec<f64> = (0..n)
            .map(|t| {
                returns.columns.iter().map(|col| col[t]).sum::<f64>()
                    / returns.columns.len() as f64
            })
            .collect();
        let market_std = market.as_slice().std_dev();

        let rows: Result<Vec<Vec<f64>>, RankingError> = (0..returns.symbols.len())
            .into_par_iter()
            .map(|i| {
                self.extract_row(
                    &returns.symbols[i],
                    &returns.columns[i],
                    &volumes.columns[i],
                    &market,
                    market_std,
                    config,
                )
            })
            .collect();

        Ok(CriteriaMatrix {
            criteria: config.names(),
            symbols: returns.symbols.clone(),
            rows: rows?,
        })
    }

    fn extract_row(
        &self,
        symbol: &str,
        returns: &[f64],
        volumes: &[f64],
        market: &[f64],
        market_std: f64,
        config: &CriteriaConfig,
    ) -> Result<Vec<f64>, RankingError> {
        let mean = returns.mean();
        let std = returns.std_dev();

        let require_std = |name: &str| -> Result<f64, RankingError> {
            if std > 0.0 {
                Ok(std)
            } else {
                Err(RankingError::DegenerateCriterion {
                    criterion: name.to_string(),
                    reason: format!("'{}' has zero return volatility", symbol),
                })
            }
        };
        let require_market = |name: &str| -> Result<f64, RankingError> {
            if market_std > 0.0 {
                Ok(market_std)
            } else {
                Err(RankingError::DegenerateCriterion {
                    criterion: name.to_string(),
                    reason: "market proxy has zero variance".to_string(),
                })
            }
        };

        let mut row = Vec::with_capacity(config.len());
        for spec in &config.criteria {
            let value = match spec.name.as_str() {
                criterion::RETORNO => mean,
                criterion::RETORNO_ANUAL => (1.0 + mean).powf(self.annualization_days) - 1.0,
                criterion::SHARPE => {
                    // Simplified Sharpe proxy: no risk-free rate subtraction.
                    mean / require_std(criterion::SHARPE)?
                }
                criterion::VOL_ANUAL => {
                    require_std(criterion::VOL_ANUAL)? * self.annualization_days.sqrt()
                }
                criterion::DRAWDOWN => max_drawdown(returns),
                criterion::BETA => {
                    let m_std = require_market(criterion::BETA)?;
                    sample_covariance(returns, market) / (m_std * m_std)
                }
                criterion::SKEWNESS => sample_skewness(returns, mean, require_std(criterion::SKEWNESS)?),
                criterion::LIQUIDEZ => volumes.mean(),
                criterion::CORRELACAO => {
                    let m_std = require_market(criterion::CORRELACAO)?;
                    sample_covariance(returns, market)
                        / (require_std(criterion::CORRELACAO)? * m_std)
                }
                other => {
                    return Err(RankingError::InvalidConfig(format!(
                        "unknown criterion '{}'",
                        other
                    )))
                }
            };
            row.push(value);
        }
        Ok(row)
    }
}

/// Minimum of the drawdown path of cumprod(1 + r) against its running
/// peak. Path-dependent: a single forward pass tracking the peak.
fn max_drawdown(returns: &[f64]) -> f64 {
    let mut cum = 1.0;
    let mut peak = 1.0;
    let mut worst = 0.0;
    for r in returns {
        cum *= 1.0 + r;
        if cum > peak {
            peak = cum;
        }
        let dd = (cum - peak) / peak;
        if dd < worst {
            worst = dd;
        }
    }
    worst
}

/// Sample covariance (n - 1 denominator), matching the sample variance
/// convention of `std_dev`.
fn sample_covariance(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len();
    let mean_a = a.mean();
    let mean_b = b.mean();
    let sum: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (x - mean_a) * (y - mean_b))
        .sum();
    sum / (n as f64 - 1.0)
}

/// Adjusted Fisher-Pearson sample skewness:
/// n / ((n-1)(n-2)) * sum(((x - mean) / s)^3).
fn sample_skewness(values: &[f64], mean: f64, std: f64) -> f64 {
    let n = values.len() as f64;
    if n < 3.0 {
        return 0.0;
    }
    let sum_cubed: f64 = values.iter().map(|v| ((v - mean) / std).powi(3)).sum();
    n / ((n - 1.0) * (n - 2.0)) * sum_cubed
}
