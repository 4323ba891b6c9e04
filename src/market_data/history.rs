// src/market_data/history.rs
use crate::domain::errors::{MarketDataError, MarketDataResult};
use crate::domain::models::{Bar, PriceSeries};
use crate::exchange::client::HistorySource;
use crate::exchange::eastmoney::normalize_code;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Daily history persisted as `{dir}/{code}.json`, an array of bars
pub struct JsonHistoryStore {
    dir: PathBuf,
}

impl JsonHistoryStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, code6: &str) -> PathBuf {
        self.dir.join(format!("{}.json", code6))
    }
}

#[async_trait]
impl HistorySource for JsonHistoryStore {
    async fn fetch_history(&self, instrument: &str, limit: usize) -> MarketDataResult<PriceSeries> {
        let code6 = normalize_code(instrument)?;
        let path = self.path_for(&code6);

        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::warn!("No stored history for {} at {}", code6, path.display());
                return Ok(PriceSeries::new(&code6, Vec::new()));
            }
            Err(e) => {
                return Err(MarketDataError::Storage(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let mut bars: Vec<Bar> = serde_json::from_str(&contents).map_err(|e| {
            MarketDataError::InvalidFormat(format!("{}: {}", path.display(), e))
        })?;
        bars.sort_by_key(|b| b.date);
        bars.dedup_by_key(|b| b.date);

        // Keep the newest `limit` bars
        let excess = bars.len().saturating_sub(limit);
        bars.drain(0..excess);

        Ok(PriceSeries::new(&code6, bars))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(day: u32, close: f64) -> Bar {
        Bar::close_only(NaiveDate::from_ymd_opt(2025, 12, day).unwrap(), close)
    }

    #[tokio::test]
    async fn reads_newest_bars_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let bars = vec![bar(3, 1.3), bar(1, 1.1), bar(2, 1.2)];
        std::fs::write(
            dir.path().join("159218.json"),
            serde_json::to_string(&bars).unwrap(),
        )
        .unwrap();

        let store = JsonHistoryStore::new(dir.path());
        let series = store.fetch_history("159218.SZ", 2).await.unwrap();

        assert_eq!(series.instrument, "159218");
        assert_eq!(series.close_prices(), vec![1.2, 1.3]);
    }

    #[tokio::test]
    async fn missing_file_yields_empty_series() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonHistoryStore::new(dir.path());
        let series = store.fetch_history("159840", 200).await.unwrap();
        assert!(series.is_empty());
    }

    #[tokio::test]
    async fn corrupt_file_is_unparsable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("159840.json"), "not json").unwrap();
        let store = JsonHistoryStore::new(dir.path());
        assert!(matches!(
            store.fetch_history("159840", 200).await,
            Err(MarketDataError::InvalidFormat(_))
        ));
    }
}
