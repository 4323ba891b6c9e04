// src/market_data/mod.rs
pub mod history;
pub mod processor;

pub use history::JsonHistoryStore;
pub use processor::merge_live_bar;
