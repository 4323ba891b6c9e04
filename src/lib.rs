// src/lib.rs
// Main library module declarations

pub mod advisor;
pub mod analysis;
pub mod config;
pub mod domain;
pub mod exchange;
pub mod http;
pub mod market_data;
pub mod monitor;
pub mod notify;
pub mod report;
pub mod trading;
