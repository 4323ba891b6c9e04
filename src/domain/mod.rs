// src/domain/mod.rs
pub mod errors;
pub mod models;

// Re-export common types for convenience
pub use errors::{
    AdvisorError, AdvisorResult, AnalysisError, AnalysisResult, AppError, AppResult,
    MarketDataError, MarketDataResult, NotifyError, NotifyResult,
};
pub use models::{Bar, MovingAverageState, Position, PriceSeries, Signal};
