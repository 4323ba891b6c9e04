// src/monitor/schedule.rs
use chrono::{Duration as ChronoDuration, NaiveDateTime, Timelike, Utc};
use std::time::Duration;

const BEIJING_UTC_OFFSET_HOURS: i64 = 8;

/// Current wall-clock time in Beijing (UTC+8)
pub fn beijing_now() -> NaiveDateTime {
    (Utc::now() + ChronoDuration::hours(BEIJING_UTC_OFFSET_HOURS)).naive_utc()
}

// Seconds since midnight
fn hm(hour: u32, minute: u32) -> u32 {
    hour * 3600 + minute * 60
}

/// Whether `now` (Beijing time) falls in the 09:30-11:30 or 13:00-15:00
/// sessions, both ends inclusive
pub fn is_trading_time(now: &NaiveDateTime) -> bool {
    let time = now.time().num_seconds_from_midnight();
    let morning = hm(9, 30) <= time && time <= hm(11, 30);
    let afternoon = hm(13, 0) <= time && time <= hm(15, 0);
    morning || afternoon
}

/// Pause before the next tick so ticks start `interval` apart
pub fn next_sleep(interval: Duration, elapsed: Duration) -> Duration {
    interval.saturating_sub(elapsed)
}
