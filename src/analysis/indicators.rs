// src/analysis/indicators.rs
use crate::domain::errors::{AnalysisError, AnalysisResult};
use crate::domain::models::MovingAverageState;

/// Simple Moving Average (SMA)
pub fn calculate_sma(prices: &[f64], period: usize) -> AnalysisResult<Vec<f64>> {
    if period == 0 || prices.len() < period {
        return Err(AnalysisError::InsufficientData(format!(
            "Not enough data for SMA calculation. Need at least {} points, got {}",
            period,
            prices.len()
        )));
    }

    let mut result = Vec::with_capacity(prices.len() - period + 1);
    let mut sum = prices.iter().take(period).sum::<f64>();

    // First SMA value
    result.push(sum / period as f64);

    // Calculate remaining values with sliding window
    for i in period..prices.len() {
        sum = sum - prices[i - period] + prices[i];
        result.push(sum / period as f64);
    }

    Ok(result)
}

/// Rolling SMA aligned with `prices`: entry `i` is the mean of the window
/// ending at `i`, or `None` while the window is not yet full.
pub fn rolling_sma(prices: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut aligned = vec![None; prices.len()];
    if let Ok(values) = calculate_sma(prices, period) {
        for (offset, value) in values.into_iter().enumerate() {
            aligned[offset + period - 1] = Some(value);
        }
    }
    aligned
}

/// Short/long averages at the last two steps of `prices`
pub fn moving_average_state(
    prices: &[f64],
    short_period: usize,
    long_period: usize,
) -> MovingAverageState {
    let short = rolling_sma(prices, short_period);
    let long = rolling_sma(prices, long_period);
    let at = |values: &[Option<f64>], back: usize| -> Option<f64> {
        values
            .len()
            .checked_sub(back + 1)
            .and_then(|idx| values[idx])
    };

    MovingAverageState {
        short_avg: at(&short, 0),
        long_avg: at(&long, 0),
        prev_short_avg: at(&short, 1),
        prev_long_avg: at(&long, 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_slides_over_window() {
        let sma = calculate_sma(&[1.0, 2.0, 3.0, 4.0, 5.0], 3).unwrap();
        assert_eq!(sma, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn sma_rejects_short_input() {
        assert!(matches!(
            calculate_sma(&[1.0, 2.0], 3),
            Err(AnalysisError::InsufficientData(_))
        ));
    }

    #[test]
    fn rolling_sma_pads_undefined_head() {
        let rolled = rolling_sma(&[2.0, 4.0, 6.0], 2);
        assert_eq!(rolled, vec![None, Some(3.0), Some(5.0)]);
    }

    #[test]
    fn state_leaves_prev_long_undefined_at_exact_window() {
        let prices: Vec<f64> = (1..=20).map(f64::from).collect();
        let state = moving_average_state(&prices, 5, 20);
        assert_eq!(state.long_avg, Some(10.5));
        assert_eq!(state.prev_long_avg, None);
        assert_eq!(state.short_avg, Some(18.0));
        assert_eq!(state.prev_short_avg, Some(17.0));
    }

    #[test]
    fn state_of_empty_series_is_undefined() {
        assert_eq!(moving_average_state(&[], 5, 20), MovingAverageState::default());
    }
}
