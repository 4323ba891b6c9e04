// src/trading/strategies.rs
use crate::analysis::indicators;
use crate::domain::errors::{AnalysisError, AnalysisResult};
use crate::domain::models::{Bar, MovingAverageState, PriceSeries, Signal};

pub const SHORT_WINDOW: usize = 5;
pub const LONG_WINDOW: usize = 20;

/// Classify an instrument from its moving averages.
///
/// Golden/death crosses take precedence over the trend fallback. Any
/// comparison that needs an undefined average falls through to `Hold`.
pub fn classify(state: &MovingAverageState) -> Signal {
    let (short, long) = match (state.short_avg, state.long_avg) {
        (Some(short), Some(long)) => (short, long),
        _ => return Signal::Hold,
    };

    if let (Some(prev_short), Some(prev_long)) = (state.prev_short_avg, state.prev_long_avg) {
        if prev_short <= prev_long && short > long {
            return Signal::Buy;
        }
        if prev_short >= prev_long && short < long {
            return Signal::Sell;
        }
    }

    if short > long {
        Signal::BiasBuy
    } else {
        Signal::BiasSell
    }
}

/// Outcome of one evaluation of the moving-average engine
#[derive(Debug, Clone)]
pub struct SignalAssessment {
    pub instrument: String,
    pub short_period: usize,
    pub long_period: usize,
    pub live: Bar,
    pub averages: MovingAverageState,
    pub signal: Signal,
    // Primary reason first, advisory annotations after it
    pub reasons: Vec<String>,
    pub prev_close: Option<f64>,
    pub pct_change: Option<f64>,
    pub series: PriceSeries,
}

impl SignalAssessment {
    pub fn rationale(&self) -> String {
        if self.reasons.is_empty() {
            "none".to_string()
        } else {
            self.reasons.join("; ")
        }
    }
}

/// Moving Average Crossover engine over a merged daily series
#[derive(Debug, Clone)]
pub struct MovingAverageCrossStrategy {
    short_period: usize,
    long_period: usize,
}

impl MovingAverageCrossStrategy {
    pub fn new(short_period: usize, long_period: usize) -> Self {
        Self {
            short_period,
            long_period,
        }
    }

    /// Evaluate the merged series whose newest point is `live`
    pub fn evaluate(&self, merged: &PriceSeries, live: &Bar) -> AnalysisResult<SignalAssessment> {
        if merged.len() < self.long_period {
            return Err(AnalysisError::InsufficientData(format!(
                "{} has only {} daily bars, need {} for MA{}",
                merged.instrument,
                merged.len(),
                self.long_period,
                self.long_period
            )));
        }

        let closes = merged.close_prices();
        let averages =
            indicators::moving_average_state(&closes, self.short_period, self.long_period);
        let signal = classify(&averages);

        let mut reasons = Vec::new();
        if let Some(primary) = self.primary_reason(signal) {
            reasons.push(primary);
        }
        reasons.extend(self.annotations(&averages, live));

        let prev_close = closes.len().checked_sub(2).map(|idx| closes[idx]);
        let pct_change = prev_close
            .filter(|prev| *prev != 0.0)
            .map(|prev| (live.close - prev) / prev * 100.0);

        log::debug!(
            "{}: MA{}={:?} MA{}={:?} prev=({:?}, {:?}) -> {}",
            merged.instrument,
            self.short_period,
            averages.short_avg,
            self.long_period,
            averages.long_avg,
            averages.prev_short_avg,
            averages.prev_long_avg,
            signal
        );

        Ok(SignalAssessment {
            instrument: merged.instrument.clone(),
            short_period: self.short_period,
            long_period: self.long_period,
            live: live.clone(),
            averages,
            signal,
            reasons,
            prev_close,
            pct_change,
            series: merged.clone(),
        })
    }

    fn primary_reason(&self, signal: Signal) -> Option<String> {
        let (short, long) = (self.short_period, self.long_period);
        match signal {
            Signal::Buy => Some(format!("MA{} crossed above MA{} (golden cross)", short, long)),
            Signal::Sell => Some(format!("MA{} crossed below MA{} (death cross)", short, long)),
            Signal::BiasBuy => Some(format!("bullish alignment (MA{} > MA{})", short, long)),
            Signal::BiasSell => Some(format!("bearish alignment (MA{} <= MA{})", short, long)),
            _ => None,
        }
    }

    // Advisory only: never feeds back into the classification
    fn annotations(&self, averages: &MovingAverageState, live: &Bar) -> Vec<String> {
        let mut notes = Vec::new();
        if let Some(long) = averages.long_avg {
            if live.close >= long {
                notes.push(format!("price above MA{}", self.long_period));
            } else {
                notes.push(format!("price below MA{}", self.long_period));
            }
        }
        if live.close > live.open {
            notes.push("current stronger than open".to_string());
        } else if live.close < live.open {
            notes.push("current weaker than open".to_string());
        }
        notes
    }
}

impl Default for MovingAverageCrossStrategy {
    fn default() -> Self {
        Self::new(SHORT_WINDOW, LONG_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use proptest::prelude::*;

    fn series(closes: &[f64]) -> (PriceSeries, Bar) {
        let start = NaiveDate::from_ymd_opt(2025, 11, 3).unwrap();
        let bars: Vec<Bar> = closes
            .iter()
            .enumerate()
            .map(|(i, c)| Bar::close_only(start + Duration::days(i as i64), *c))
            .collect();
        let live = bars.last().cloned().unwrap_or_else(|| Bar::close_only(start, 1.0));
        (PriceSeries::new("159218", bars), live)
    }

    fn state(short: f64, long: f64, prev_short: f64, prev_long: f64) -> MovingAverageState {
        MovingAverageState {
            short_avg: Some(short),
            long_avg: Some(long),
            prev_short_avg: Some(prev_short),
            prev_long_avg: Some(prev_long),
        }
    }

    #[test]
    fn equal_previous_then_short_above_is_golden_cross() {
        assert_eq!(classify(&state(1.0001, 1.0, 1.0, 1.0)), Signal::Buy);
    }

    #[test]
    fn equal_previous_then_short_below_is_death_cross() {
        assert_eq!(classify(&state(0.9999, 1.0, 1.0, 1.0)), Signal::Sell);
    }

    #[test]
    fn trend_fallback_without_cross() {
        assert_eq!(classify(&state(1.2, 1.0, 1.1, 1.0)), Signal::BiasBuy);
        assert_eq!(classify(&state(0.8, 1.0, 0.9, 1.0)), Signal::BiasSell);
        // Equal averages with no cross lean bearish
        assert_eq!(classify(&state(1.0, 1.0, 1.0, 1.0)), Signal::BiasSell);
    }

    #[test]
    fn undefined_current_average_is_neutral() {
        let undefined = MovingAverageState {
            short_avg: Some(1.0),
            long_avg: None,
            prev_short_avg: Some(0.5),
            prev_long_avg: Some(0.9),
        };
        assert_eq!(classify(&undefined), Signal::Hold);
    }

    #[test]
    fn undefined_previous_average_never_crosses() {
        let no_prev = MovingAverageState {
            short_avg: Some(1.2),
            long_avg: Some(1.0),
            prev_short_avg: Some(0.9),
            prev_long_avg: None,
        };
        assert_eq!(classify(&no_prev), Signal::BiasBuy);
    }

    #[test]
    fn steady_rise_is_bias_buy() {
        let closes: Vec<f64> = (0..25).map(|i| 1.0 + i as f64 * 0.01).collect();
        let (merged, live) = series(&closes);

        let assessment = MovingAverageCrossStrategy::default()
            .evaluate(&merged, &live)
            .unwrap();

        assert_eq!(assessment.signal, Signal::BiasBuy);
        assert!(assessment.reasons.contains(&"price above MA20".to_string()));
        let expected_pct = (1.24 - 1.23) / 1.23 * 100.0;
        assert!((assessment.pct_change.unwrap() - expected_pct).abs() < 1e-9);
    }

    #[test]
    fn live_spike_after_flat_history_is_golden_cross() {
        let mut closes = vec![1.0; 24];
        closes.push(1.5);
        let (merged, mut live) = series(&closes);
        live.open = 1.6;

        let assessment = MovingAverageCrossStrategy::default()
            .evaluate(&merged, &live)
            .unwrap();

        assert_eq!(assessment.signal, Signal::Buy);
        assert_eq!(assessment.reasons[0], "MA5 crossed above MA20 (golden cross)");
        // Annotation says weaker than open but the signal stays a golden cross
        assert!(assessment.reasons.contains(&"current weaker than open".to_string()));
    }

    #[test]
    fn zero_previous_close_leaves_change_unknown() {
        let mut closes = vec![1.0; 23];
        closes.push(0.0);
        closes.push(1.0);
        let (merged, live) = series(&closes);
        let assessment = MovingAverageCrossStrategy::default()
            .evaluate(&merged, &live)
            .unwrap();
        assert_eq!(assessment.pct_change, None);
    }

    proptest! {
        #[test]
        fn short_series_never_yields_a_signal(
            closes in prop::collection::vec(0.01f64..1000.0, 0..20)
        ) {
            let (merged, live) = series(&closes);
            let result = MovingAverageCrossStrategy::default().evaluate(&merged, &live);
            prop_assert!(matches!(result, Err(AnalysisError::InsufficientData(_))));
        }

        #[test]
        fn golden_cross_beats_trend(
            prev_short in 0.5f64..1.5,
            gap in 0.0f64..0.5,
            lift in 0.0001f64..0.5,
            long in 0.5f64..1.5,
        ) {
            let prev_long = prev_short + gap;
            let signal = classify(&state(long + lift, long, prev_short, prev_long));
            prop_assert_eq!(signal, Signal::Buy);
        }
    }
}
