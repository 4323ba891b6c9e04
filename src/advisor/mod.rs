// src/advisor/mod.rs
pub mod deepseek;
pub mod prompts;

use crate::domain::errors::AdvisorResult;
use crate::domain::models::{Position, Signal};
use crate::report::extractor::{extract_field, extract_list_field};
use crate::report::formatter::{field_line, format_avg, format_pct};
use crate::report::labels as report_labels;
use crate::trading::strategies::SignalAssessment;
use async_trait::async_trait;
use std::fmt::Write;

pub use deepseek::DeepSeekClient;

/// Black-box text generation
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, temperature: f64) -> AdvisorResult<String>;
}

/// Format-A labels of the advisor reports
pub mod labels {
    pub const AI_SIGNAL: &str = "AI Signal";
    pub const AI_ACTION: &str = "AI Action";
    pub const KEY_REASON: &str = "Key Reason";
    pub const STOP_LOSS: &str = "Stop Loss";
    pub const TARGET: &str = "Target";
    pub const SUGGESTED_SIZE: &str = "Suggested Size";
    pub const TARGET_PRICE: &str = "Target Price";
}

// Labels the model is asked to answer with
const RESPONSE_SIGNAL: &str = "Signal";
const RESPONSE_REASON: &str = "Reason";
const RESPONSE_ACTION: &str = "Action";

// Labels that end a multi-line reason
const TRADE_SECTIONS: [&str; 3] = [RESPONSE_SIGNAL, labels::STOP_LOSS, labels::TARGET];
const INTRADAY_SECTIONS: [&str; 4] = [
    RESPONSE_ACTION,
    labels::SUGGESTED_SIZE,
    labels::TARGET_PRICE,
    labels::STOP_LOSS,
];

// Models like to echo the template's brackets and emphasis
fn clean(value: String) -> String {
    value
        .trim_matches(|c: char| c == '[' || c == ']' || c == '*' || c.is_whitespace())
        .to_string()
}

/// Canonical label when the answer names a known signal, raw text otherwise
fn normalize_signal(value: String) -> String {
    let value = clean(value);
    match value.parse::<Signal>() {
        Ok(signal) => signal.as_label().to_string(),
        Err(_) => value,
    }
}

fn field(text: &str, label: &str) -> Option<String> {
    extract_field(text, label).map(clean).filter(|v| !v.is_empty())
}

/// Parsed buy/sell/hold answer
#[derive(Debug, Clone, PartialEq)]
pub struct TradeAdvice {
    pub signal: Option<String>,
    pub reason: Option<String>,
    pub stop_loss: Option<String>,
    pub target: Option<String>,
    pub raw: String,
}

impl TradeAdvice {
    pub fn parse(raw: &str) -> Self {
        Self {
            signal: field(raw, RESPONSE_SIGNAL).map(normalize_signal),
            reason: extract_list_field(raw, RESPONSE_REASON, &TRADE_SECTIONS).map(clean),
            stop_loss: field(raw, labels::STOP_LOSS),
            target: field(raw, labels::TARGET),
            raw: raw.trim().to_string(),
        }
    }
}

/// Parsed intraday swing answer
#[derive(Debug, Clone, PartialEq)]
pub struct IntradayAdvice {
    pub action: Option<String>,
    pub reason: Option<String>,
    pub size: Option<String>,
    pub target_price: Option<String>,
    pub stop_loss: Option<String>,
    pub raw: String,
}

impl IntradayAdvice {
    pub fn parse(raw: &str) -> Self {
        Self {
            action: field(raw, RESPONSE_ACTION).map(normalize_signal),
            reason: extract_list_field(raw, labels::KEY_REASON, &INTRADAY_SECTIONS).map(clean),
            size: field(raw, labels::SUGGESTED_SIZE),
            target_price: field(raw, labels::TARGET_PRICE),
            stop_loss: field(raw, labels::STOP_LOSS),
            raw: raw.trim().to_string(),
        }
    }
}

// Absent answers render blank so the extractor reports them as absent
fn value_or_blank(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

fn live_section(report: &mut String, assessment: &SignalAssessment) {
    let live = &assessment.live;
    report.push_str(&field_line(
        report_labels::DATE,
        &live.date.format("%Y-%m-%d").to_string(),
    ));
    report.push_str(&field_line(
        report_labels::OHLC,
        &format!("{} / {} / {} / {}", live.open, live.close, live.high, live.low),
    ));
    report.push_str(&field_line(
        report_labels::CHANGE,
        &format_pct(assessment.pct_change),
    ));
    report.push_str(&field_line(
        report_labels::AVERAGES,
        &format!(
            "MA{}={}, MA{}={}",
            assessment.short_period,
            format_avg(assessment.averages.short_avg),
            assessment.long_period,
            format_avg(assessment.averages.long_avg)
        ),
    ));
}

fn raw_section(report: &mut String, raw: &str) {
    let _ = write!(report, "\n---\n\n**Full AI analysis**:\n{}\n", raw);
}

pub fn render_trade_report(assessment: &SignalAssessment, advice: &TradeAdvice) -> String {
    let mut report = String::new();
    let _ = writeln!(report, "### AI Trade Signal Report: {}", assessment.instrument);
    live_section(&mut report, assessment);
    report.push_str("\n---\n\n");
    report.push_str(&field_line(labels::AI_SIGNAL, value_or_blank(&advice.signal)));
    report.push_str(&field_line(labels::KEY_REASON, value_or_blank(&advice.reason)));
    report.push_str(&field_line(
        labels::STOP_LOSS,
        advice.stop_loss.as_deref().unwrap_or("N/A"),
    ));
    report.push_str(&field_line(
        labels::TARGET,
        advice.target.as_deref().unwrap_or("N/A"),
    ));
    raw_section(&mut report, &advice.raw);
    report
}

pub fn render_intraday_report(
    assessment: &SignalAssessment,
    position: Option<&Position>,
    advice: &IntradayAdvice,
) -> String {
    let mut report = String::new();
    let _ = writeln!(report, "### AI Intraday Signal: {}", assessment.instrument);
    live_section(&mut report, assessment);
    report.push_str(&field_line(
        "Intraday Range",
        &format!(
            "{} (price at {:.1}% of the day range)",
            format_pct(prompts::intraday_range_pct(assessment)),
            prompts::position_in_range(assessment) * 100.0
        ),
    ));
    if let Some(position) = position {
        if let (Some(cost), Some(pnl)) = (position.cost, position.floating_pct(assessment.live.close)) {
            report.push_str(&field_line(
                "Position Cost",
                &format!("{} (floating P/L {:+.2}%)", cost, pnl),
            ));
        }
        if position.ratio > 0.0 {
            report.push_str(&field_line(
                "Position Ratio",
                &format!("{:.1}%", position.ratio * 100.0),
            ));
        }
    }
    report.push_str("\n---\n\n");
    report.push_str(&field_line(labels::AI_ACTION, value_or_blank(&advice.action)));
    report.push_str(&field_line(labels::KEY_REASON, value_or_blank(&advice.reason)));
    report.push_str(&field_line(
        labels::SUGGESTED_SIZE,
        advice.size.as_deref().unwrap_or("standard"),
    ));
    report.push_str(&field_line(
        labels::TARGET_PRICE,
        advice.target_price.as_deref().unwrap_or("N/A"),
    ));
    report.push_str(&field_line(
        labels::STOP_LOSS,
        advice.stop_loss.as_deref().unwrap_or("N/A"),
    ));
    raw_section(&mut report, &advice.raw);
    report
}

/// Ask the model for a buy/sell/hold call and render it as a report
pub async fn trade_signal_report(
    generator: &dyn TextGenerator,
    assessment: &SignalAssessment,
) -> AdvisorResult<String> {
    let prompt = prompts::trade_signal_prompt(assessment);
    let raw = generator
        .generate(&prompt, prompts::TRADE_TEMPERATURE)
        .await?;
    let advice = TradeAdvice::parse(&raw);
    log::debug!("{}: AI trade signal {:?}", assessment.instrument, advice.signal);
    Ok(render_trade_report(assessment, &advice))
}

/// Ask the model for an intraday swing action and render it as a report
pub async fn intraday_t_report(
    generator: &dyn TextGenerator,
    assessment: &SignalAssessment,
    position: Option<&Position>,
) -> AdvisorResult<String> {
    let prompt = prompts::intraday_t_prompt(assessment, position);
    let raw = generator
        .generate(&prompt, prompts::INTRADAY_TEMPERATURE)
        .await?;
    let advice = IntradayAdvice::parse(&raw);
    log::debug!("{}: AI intraday action {:?}", assessment.instrument, advice.action);
    Ok(render_intraday_report(assessment, position, &advice))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::AdvisorError;
    use crate::domain::models::{Bar, PriceSeries};
    use crate::report::extractor::ReportFields;
    use crate::trading::strategies::MovingAverageCrossStrategy;
    use chrono::{Duration, NaiveDate};
    use std::sync::Mutex;

    struct CannedGenerator {
        reply: AdvisorResult<String>,
        temperatures: Mutex<Vec<f64>>,
    }

    impl CannedGenerator {
        fn new(reply: AdvisorResult<String>) -> Self {
            Self {
                reply,
                temperatures: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate(&self, _prompt: &str, temperature: f64) -> AdvisorResult<String> {
            self.temperatures.lock().unwrap().push(temperature);
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(AdvisorError::Http(e.to_string())),
            }
        }
    }

    fn assessment() -> SignalAssessment {
        let start = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();
        let bars: Vec<Bar> = (0..21)
            .map(|i| Bar::close_only(start + Duration::days(i), 0.9 - i as f64 * 0.002))
            .collect();
        let live = bars[20].clone();
        MovingAverageCrossStrategy::default()
            .evaluate(&PriceSeries::new("159840", bars), &live)
            .unwrap()
    }

    #[test]
    fn trade_answer_is_normalized() {
        let advice = TradeAdvice::parse(
            "Signal: [Hold]\nReason: no clear trend; volume shrinking\nStop Loss: N/A\nTarget: N/A\n",
        );
        assert_eq!(advice.signal.as_deref(), Some("hold"));
        assert_eq!(advice.reason.as_deref(), Some("no clear trend; volume shrinking"));
        assert_eq!(advice.target.as_deref(), Some("N/A"));
    }

    #[test]
    fn intraday_answer_joins_reason_list() {
        let advice = IntradayAdvice::parse(
            "Action: **reduce position**\nKey Reason:\n1. near the day high\n2. volume fading\nSuggested Size: light 10-20%\nTarget Price: 0.851\nStop Loss: 0.872\n",
        );
        assert_eq!(advice.action.as_deref(), Some("reduce-position"));
        assert_eq!(
            advice.reason.as_deref(),
            Some("1. near the day high; 2. volume fading")
        );
        assert_eq!(advice.size.as_deref(), Some("light 10-20%"));
        assert_eq!(advice.target_price.as_deref(), Some("0.851"));
    }

    #[test]
    fn intraday_reason_keeps_first_line_and_items() {
        let advice = IntradayAdvice::parse(
            "Action: add-position\nKey Reason: pullback to MA5\n1. volume drying up\nStop Loss: 0.84\n- not part of the reason\n",
        );
        assert_eq!(
            advice.reason.as_deref(),
            Some("pullback to MA5; 1. volume drying up")
        );
        assert_eq!(advice.stop_loss.as_deref(), Some("0.84"));
    }

    #[test]
    fn unknown_action_text_is_kept_verbatim() {
        let advice = IntradayAdvice::parse("Action: wait and see\n");
        assert_eq!(advice.action.as_deref(), Some("wait and see"));
        assert_eq!(advice.reason, None);
    }

    #[tokio::test]
    async fn intraday_report_is_parseable_in_format_a() {
        let generator = CannedGenerator::new(Ok(
            "Action: immediate-sell\nKey Reason: price at resistance\nSuggested Size: standard 20-30%\nTarget Price: 0.85\nStop Loss: 0.87".to_string(),
        ));
        let report = intraday_t_report(&generator, &assessment(), None).await.unwrap();

        let fields = ReportFields::parse(
            &report,
            &[
                report_labels::DATE,
                labels::AI_ACTION,
                labels::KEY_REASON,
                labels::TARGET_PRICE,
            ],
        );
        assert_eq!(fields.get(report_labels::DATE), Some("2025-12-21"));
        assert_eq!(fields.get(labels::AI_ACTION), Some("immediate-sell"));
        assert_eq!(fields.get(labels::KEY_REASON), Some("price at resistance"));
        assert_eq!(fields.get(labels::TARGET_PRICE), Some("0.85"));
        assert_eq!(
            *generator.temperatures.lock().unwrap(),
            vec![prompts::INTRADAY_TEMPERATURE]
        );
    }

    #[tokio::test]
    async fn missing_action_stays_absent_in_report() {
        let generator = CannedGenerator::new(Ok("I cannot decide today.".to_string()));
        let report = intraday_t_report(&generator, &assessment(), None).await.unwrap();
        assert_eq!(extract_field(&report, labels::AI_ACTION), None);
        assert!(report.contains("I cannot decide today."));
    }

    #[tokio::test]
    async fn trade_report_carries_signal() {
        let generator = CannedGenerator::new(Ok(
            "Signal: sell\nReason: death cross\nStop Loss: 0.88\nTarget: 0.84".to_string(),
        ));
        let report = trade_signal_report(&generator, &assessment()).await.unwrap();
        assert_eq!(extract_field(&report, labels::AI_SIGNAL).as_deref(), Some("sell"));
        assert_eq!(extract_field(&report, labels::TARGET).as_deref(), Some("0.84"));
        assert_eq!(extract_field(&report, labels::STOP_LOSS).as_deref(), Some("0.88"));
    }

    #[tokio::test]
    async fn generator_failure_propagates() {
        let generator = CannedGenerator::new(Err(AdvisorError::Http("503".to_string())));
        let result = trade_signal_report(&generator, &assessment()).await;
        assert!(matches!(result, Err(AdvisorError::Http(_))));
    }
}
