use crate::{PricePoint, RankingError};
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Trait for historical series providers.
///
/// Implementors fetch date-ordered (date, adjusted close, volume)
/// observations per symbol. Dates must already be timezone-normalized;
/// the scoring pipeline never touches timezones.
#[async_trait]
pub trait SeriesProvider: Send + Sync {
    async fn fetch(
        &self,
        symbols: &[String],
    ) -> Result<BTreeMap<String, Vec<PricePoint>>, RankingError>;
}
