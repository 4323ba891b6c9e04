// src/trading/signals.rs
use std::collections::HashMap;

/// Last surfaced signal label per instrument.
///
/// Labels compare by exact text, so `bias-buy` and `buy` are different
/// signals. Memory lives for the process lifetime and is never persisted.
#[derive(Debug, Default)]
pub struct SignalTracker {
    last_surfaced: HashMap<String, String>,
}

impl SignalTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `label` for `instrument` and report whether it is new.
    ///
    /// The first label seen for an instrument always counts as new.
    pub fn observe(&mut self, instrument: &str, label: &str) -> bool {
        if self.last_signal(instrument) == Some(label) {
            return false;
        }
        let previous = self
            .last_surfaced
            .insert(instrument.to_string(), label.to_string());
        log::debug!("{}: signal changed {:?} -> {}", instrument, previous, label);
        true
    }

    pub fn last_signal(&self, instrument: &str) -> Option<&str> {
        self.last_surfaced.get(instrument).map(String::as_str)
    }

    pub fn tracked_instruments(&self) -> Vec<String> {
        self.last_surfaced.keys().cloned().collect()
    }
}
