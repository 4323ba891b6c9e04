// src/monitor/labels.rs
use crate::advisor::labels as ai;
use crate::config::MonitorMode;
use crate::report::labels as rule;

/// Which report fields the monitor reads for one mode
#[derive(Debug, Clone, PartialEq)]
pub struct LabelMapping {
    /// Shown in brackets on every surfaced message
    pub strategy_label: String,
    pub signal: String,
    pub reason: String,
    /// Candidate labels for the session date, first present wins
    pub dates: Vec<String>,
    /// (report label, message key) pairs appended to the message
    pub extras: Vec<(String, String)>,
}

impl LabelMapping {
    pub fn rule() -> Self {
        Self {
            strategy_label: "Rule Strategy".to_string(),
            signal: rule::SIGNAL.to_string(),
            reason: rule::RATIONALE.to_string(),
            dates: vec![rule::DATE.to_string()],
            extras: Vec::new(),
        }
    }

    pub fn ai_intraday() -> Self {
        Self {
            strategy_label: "AI Intraday Strategy".to_string(),
            signal: ai::AI_ACTION.to_string(),
            reason: ai::KEY_REASON.to_string(),
            dates: vec![rule::DATE.to_string()],
            extras: vec![
                (ai::SUGGESTED_SIZE.to_string(), "size".to_string()),
                (ai::TARGET_PRICE.to_string(), "target".to_string()),
                (ai::STOP_LOSS.to_string(), "stop-loss".to_string()),
            ],
        }
    }

    pub fn for_mode(mode: MonitorMode) -> Self {
        match mode {
            MonitorMode::Rule => Self::rule(),
            MonitorMode::AiIntraday => Self::ai_intraday(),
        }
    }

    /// Every label this mapping extracts
    pub fn labels(&self) -> Vec<&str> {
        let mut labels = vec![self.signal.as_str(), self.reason.as_str()];
        labels.extend(self.dates.iter().map(String::as_str));
        labels.extend(self.extras.iter().map(|(label, _)| label.as_str()));
        labels
    }
}
