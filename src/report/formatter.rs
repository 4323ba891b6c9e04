// src/report/formatter.rs
use crate::trading::strategies::SignalAssessment;
use std::fmt::Write;

/// Section labels of the canonical report.
///
/// The extractor's format A is matched against these; renaming one here
/// changes the parsing contract for every consumer of the report.
pub mod labels {
    pub const DATE: &str = "Date";
    pub const OHLC: &str = "Open/Current/High/Low";
    pub const VOLUME: &str = "Volume/Amount";
    pub const CHANGE: &str = "Change (vs prev close)";
    pub const AVERAGES: &str = "Moving Averages";
    pub const SIGNAL: &str = "Signal";
    pub const RATIONALE: &str = "Rationale";
}

pub const UNKNOWN: &str = "unknown";

pub fn format_pct(pct: Option<f64>) -> String {
    pct.map(|p| format!("{:.2}%", p))
        .unwrap_or_else(|| UNKNOWN.to_string())
}

pub fn format_avg(avg: Option<f64>) -> String {
    avg.map(|a| format!("{:.4}", a))
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// `- **Label**: value` line
pub fn field_line(label: &str, value: &str) -> String {
    format!("- **{}**: {}\n", label, value)
}

/// Render the operator-facing report for one assessment
pub fn render_signal_report(assessment: &SignalAssessment) -> String {
    let live = &assessment.live;
    let averages = &assessment.averages;

    let mut report = String::new();
    let _ = writeln!(report, "### Intraday Signal Report: {}", assessment.instrument);
    report.push_str(&field_line(labels::DATE, &live.date.format("%Y-%m-%d").to_string()));
    report.push_str(&field_line(
        labels::OHLC,
        &format!("{} / {} / {} / {}", live.open, live.close, live.high, live.low),
    ));
    report.push_str(&field_line(
        labels::VOLUME,
        &format!("{} / {}", live.volume, live.amount),
    ));
    report.push_str(&field_line(labels::CHANGE, &format_pct(assessment.pct_change)));
    report.push_str(&field_line(
        labels::AVERAGES,
        &format!(
            "MA{}={}, MA{}={}",
            assessment.short_period,
            format_avg(averages.short_avg),
            assessment.long_period,
            format_avg(averages.long_avg)
        ),
    ));
    report.push_str(&field_line(labels::SIGNAL, assessment.signal.as_label()));
    report.push_str(&field_line(labels::RATIONALE, &assessment.rationale()));
    report.push_str(
        "\n**Note**: simplified moving-average signal for reference only; \
         intraday prices keep moving, weigh volume and market context too.\n",
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Bar, MovingAverageState, PriceSeries, Signal};
    use crate::report::extractor::extract_field;
    use chrono::NaiveDate;

    fn assessment(pct_change: Option<f64>, long_avg: Option<f64>) -> SignalAssessment {
        let live = Bar {
            date: NaiveDate::from_ymd_opt(2025, 12, 26).unwrap(),
            open: 1.2,
            high: 1.215,
            low: 1.198,
            close: 1.21,
            volume: 98000.0,
            amount: 11800000.0,
            pct_change: None,
        };
        SignalAssessment {
            instrument: "159218".to_string(),
            short_period: 5,
            long_period: 20,
            live: live.clone(),
            averages: MovingAverageState {
                short_avg: Some(1.205),
                long_avg,
                prev_short_avg: Some(1.2),
                prev_long_avg: Some(1.19),
            },
            signal: Signal::BiasBuy,
            reasons: vec![
                "bullish alignment (MA5 > MA20)".to_string(),
                "price above MA20".to_string(),
            ],
            prev_close: Some(1.2),
            pct_change,
            series: PriceSeries::new("159218", vec![live]),
        }
    }

    #[test]
    fn report_round_trips_through_extractor() {
        let report = render_signal_report(&assessment(Some(0.8333), Some(1.19)));

        assert_eq!(extract_field(&report, labels::DATE).as_deref(), Some("2025-12-26"));
        assert_eq!(extract_field(&report, labels::SIGNAL).as_deref(), Some("bias-buy"));
        assert_eq!(
            extract_field(&report, labels::RATIONALE).as_deref(),
            Some("bullish alignment (MA5 > MA20); price above MA20")
        );
        assert_eq!(extract_field(&report, labels::CHANGE).as_deref(), Some("0.83%"));
        assert_eq!(
            extract_field(&report, labels::AVERAGES).as_deref(),
            Some("MA5=1.2050, MA20=1.1900")
        );
    }

    #[test]
    fn unknown_values_are_spelled_out() {
        let report = render_signal_report(&assessment(None, None));
        assert!(report.contains("- **Change (vs prev close)**: unknown\n"));
        assert!(report.contains("MA20=unknown"));
    }
}
