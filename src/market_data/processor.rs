// src/market_data/processor.rs
use crate::domain::errors::{MarketDataError, MarketDataResult};
use crate::domain::models::{Bar, PriceSeries};

/// Merge the live bar into persisted history.
///
/// A live bar whose date already exists overwrites that date's close in
/// place; otherwise it is appended. The result is re-sorted by date.
pub fn merge_live_bar(history: &PriceSeries, live: &Bar) -> MarketDataResult<PriceSeries> {
    if history.is_empty() {
        return Err(MarketDataError::InsufficientHistory(history.instrument.clone()));
    }

    let mut merged = history.clone();
    let mut replaced = false;
    for bar in merged.bars.iter_mut().filter(|b| b.date == live.date) {
        bar.close = live.close;
        replaced = true;
    }

    if replaced {
        log::debug!(
            "{}: live close {} replaces persisted close for {}",
            history.instrument,
            live.close,
            live.date
        );
    } else {
        merged.bars.push(live.clone());
    }

    merged.bars.sort_by_key(|b| b.date);
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use proptest::prelude::*;

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + Duration::days(offset)
    }

    fn history(closes: &[f64]) -> PriceSeries {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, c)| Bar::close_only(day(i as i64), *c))
            .collect();
        PriceSeries::new("159218", bars)
    }

    #[test]
    fn same_day_live_bar_replaces_close() {
        let hist = history(&[1.0, 1.1, 1.2]);
        let live = Bar::close_only(day(2), 1.5);

        let merged = merge_live_bar(&hist, &live).unwrap();

        assert_eq!(merged.close_prices(), vec![1.0, 1.1, 1.5]);
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn new_day_live_bar_is_appended() {
        let hist = history(&[1.0, 1.1]);
        let live = Bar::close_only(day(5), 1.3);

        let merged = merge_live_bar(&hist, &live).unwrap();

        assert_eq!(merged.close_prices(), vec![1.0, 1.1, 1.3]);
        assert_eq!(merged.last().map(|b| b.date), Some(day(5)));
    }

    #[test]
    fn unsorted_history_comes_back_sorted() {
        let mut hist = history(&[1.0, 1.1, 1.2]);
        hist.bars.reverse();
        let merged = merge_live_bar(&hist, &Bar::close_only(day(3), 1.3)).unwrap();
        assert!(merged.is_strictly_ascending());
    }

    #[test]
    fn empty_history_is_insufficient() {
        let hist = PriceSeries::new("159840", Vec::new());
        let result = merge_live_bar(&hist, &Bar::close_only(day(0), 1.0));
        assert!(matches!(
            result,
            Err(MarketDataError::InsufficientHistory(code)) if code == "159840"
        ));
    }

    proptest! {
        #[test]
        fn merging_is_idempotent(
            closes in prop::collection::vec(0.1f64..100.0, 1..60),
            live_offset in 0i64..80,
            live_close in 0.1f64..100.0,
        ) {
            let hist = history(&closes);
            let live = Bar::close_only(day(live_offset), live_close);

            let once = merge_live_bar(&hist, &live).unwrap();
            let again = merge_live_bar(&hist, &live).unwrap();
            let remerged = merge_live_bar(&once, &live).unwrap();

            prop_assert_eq!(&once, &again);
            prop_assert_eq!(&once, &remerged);
            prop_assert!(once.is_strictly_ascending());
        }
    }
}
