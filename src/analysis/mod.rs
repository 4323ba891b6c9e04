// src/analysis/mod.rs
pub mod indicators;
