// src/exchange/client.rs
use crate::domain::errors::MarketDataResult;
use crate::domain::models::{Bar, PriceSeries};
use async_trait::async_trait;

/// Live quote interface
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Most recent, possibly still-changing daily bar for the current session
    async fn fetch_live_bar(&self, instrument: &str) -> MarketDataResult<Bar>;
}

/// Persisted daily history interface
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Up to `limit` most recent daily bars, ascending by date
    async fn fetch_history(&self, instrument: &str, limit: usize) -> MarketDataResult<PriceSeries>;
}
