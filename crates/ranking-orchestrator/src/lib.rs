use chrono::{DateTime, Duration, Utc};
use criteria_extractor::CriteriaExtractor;
use dashmap::DashMap;
use fuzzy_topsis::{FuzzyTopsisScorer, MatrixNormalizer};
use ranking_core::{
    AnalysisConfig, DatedValue, PipelineOutput, PricePoint, RankingError, SeriesProvider,
};
use scenario_blender::ScenarioBlender;
use series_preprocessor::SeriesPreprocessor;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// The universe analyzed when the caller does not supply one.
pub const DEFAULT_UNIVERSE: [&str; 5] = ["TTWO", "TCEHY", "EA", "RBLX", "NCBDF"];

/// How long fetched series stay valid in the cache.
pub const SERIES_CACHE_TTL_SECS: i64 = 3600;

/// Internal cache entry with timestamp
struct CacheEntry {
    data: BTreeMap<String, Vec<PricePoint>>,
    cached_at: DateTime<Utc>,
}

/// Wires the pipeline stages together and owns the data-retrieval
/// boundary: an injected [`SeriesProvider`] behind a TTL cache.
///
/// The scoring pipeline itself is pure; fetching is the only
/// asynchronous, fallible-with-retryable-causes part, and it lives
/// here, outside the stages.
pub struct RankingOrchestrator {
    provider: Arc<dyn SeriesProvider>,
    config: AnalysisConfig,
    series_cache: DashMap<String, CacheEntry>,
    cache_ttl_secs: i64,
}

impl RankingOrchestrator {
    pub fn new(
        provider: Arc<dyn SeriesProvider>,
        config: AnalysisConfig,
    ) -> Result<Self, RankingError> {
        config.validate()?;
        Ok(Self {
            provider,
            config,
            series_cache: DashMap::new(),
            cache_ttl_secs: SERIES_CACHE_TTL_SECS,
        })
    }

    pub fn with_cache_ttl(mut self, secs: i64) -> Self {
        self.cache_ttl_secs = secs;
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Fetch series for the universe (through the cache) and run the
    /// full scoring pipeline on them.
    pub async fn analyze(&self, symbols: &[String]) -> Result<PipelineOutput, RankingError> {
        if symbols.is_empty() {
            return Err(RankingError::EmptyUniverse);
        }
        let series = self.fetch_cached(symbols).await?;
        let (prices, volumes) = split_price_points(&series);
        run_pipeline(&prices, &volumes, &self.config)
    }

    async fn fetch_cached(
        &self,
        symbols: &[String],
    ) -> Result<BTreeMap<String, Vec<PricePoint>>, RankingError> {
        let mut sorted: Vec<String> = symbols.to_vec();
        sorted.sort();
        sorted.dedup();
        let key = sorted.join(",");

        if let Some(entry) = self.series_cache.get(&key) {
            if Utc::now() - entry.cached_at < Duration::seconds(self.cache_ttl_secs) {
                debug!(universe = %key, "series cache hit");
                return Ok(entry.data.clone());
            }
        }

        let data = self.provider.fetch(&sorted).await?;
        self.series_cache.insert(
            key,
            CacheEntry {
                data: data.clone(),
                cached_at: Utc::now(),
            },
        );
        Ok(data)
    }
}

/// Split provider output into the separate price and volume series the
/// preprocessor aligns.
pub fn split_price_points(
    series: &BTreeMap<String, Vec<PricePoint>>,
) -> (
    BTreeMap<String, Vec<DatedValue>>,
    BTreeMap<String, Vec<DatedValue>>,
) {
    let mut prices = BTreeMap::new();
    let mut volumes = BTreeMap::new();
    for (symbol, points) in series {
        prices.insert(
            symbol.clone(),
            points
                .iter()
                .map(|p| DatedValue {
                    date: p.date,
                    value: p.adjclose,
                })
                .collect(),
        );
        volumes.insert(
            symbol.clone(),
            points
                .iter()
                .map(|p| DatedValue {
                    date: p.date,
                    value: p.volume,
                })
                .collect(),
        );
    }
    (prices, volumes)
}

/// Run the pure scoring pipeline on already-fetched series.
///
/// Stages run in order and abort on the first failure; there is no
/// partial-result recovery.
pub fn run_pipeline(
    prices: &BTreeMap<String, Vec<DatedValue>>,
    volumes: &BTreeMap<String, Vec<DatedValue>>,
    config: &AnalysisConfig,
) -> Result<PipelineOutput, RankingError> {
    config.validate()?;

    let preprocessor = SeriesPreprocessor::new(config.min_aligned_rows);
    let (returns, volume_panel) = preprocessor.align(prices, volumes)?;
    debug!(
        rows = returns.n_rows(),
        assets = returns.symbols.len(),
        "series aligned"
    );

    let extractor = CriteriaExtractor::new(config.annualization_days);
    let criteria = extractor.extract(&returns, &volume_panel, &config.criteria)?;

    let normalized = MatrixNormalizer::new().normalize(&criteria, &config.criteria)?;

    let scorer = FuzzyTopsisScorer::new(config.fuzzy_multipliers);
    let fuzzy = scorer.score(&normalized, &config.criteria, &config.scenarios)?;

    let ranking = ScenarioBlender::default().blend(&fuzzy, &config.scenarios)?;
    info!(
        assets = ranking.len(),
        top = %ranking[0].symbol,
        "expected ranking computed"
    );

    Ok(PipelineOutput {
        criteria,
        normalized,
        fuzzy,
        ranking,
    })
}
