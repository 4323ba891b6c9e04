// src/report/mod.rs
pub mod extractor;
pub mod formatter;

pub use extractor::{extract_field, extract_list_field, ReportFields};
pub use formatter::{labels, render_signal_report};
