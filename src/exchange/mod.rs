// src/exchange/mod.rs
pub mod client;
pub mod eastmoney;

pub use client::{HistorySource, QuoteSource};
pub use eastmoney::EastMoneyClient;
