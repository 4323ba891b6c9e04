// src/domain/errors.rs
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Market data error: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Advisor error: {0}")]
    Advisor(#[from] AdvisorError),

    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures of the quote/history adapters.
#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("No data available for: {0}")]
    NoData(String),

    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Insufficient history for {0}, load more daily bars first")]
    InsufficientHistory(String),
}

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Insufficient data for analysis: {0}")]
    InsufficientData(String),

    #[error("Field '{0}' missing from report")]
    ExtractionMiss(String),
}

/// Failures of the text-generation call.
#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Sink rejected message: {0}")]
    Rejected(String),
}

// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
pub type MarketDataResult<T> = Result<T, MarketDataError>;
pub type AnalysisResult<T> = Result<T, AnalysisError>;
pub type AdvisorResult<T> = Result<T, AdvisorError>;
pub type NotifyResult<T> = Result<T, NotifyError>;
