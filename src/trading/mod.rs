// src/trading/mod.rs
pub mod signals;
pub mod strategies;

pub use signals::SignalTracker;
pub use strategies::{classify, MovingAverageCrossStrategy, SignalAssessment};
