// src/utils/format.rs

use crate::config::SECONDS_PER_MINUTE;

/// Countdown display, e.g. `4:07`.
pub fn format_countdown(seconds: u64) -> String {
    let minutes = seconds / SECONDS_PER_MINUTE;
    let rest = seconds % SECONDS_PER_MINUTE;
    format!("{minutes}:{rest:02}")
}

/// Whole minutes, rounded down, e.g. `1 minute` or `12 minutes`.
pub fn format_minutes(seconds: u64) -> String {
    let minutes = seconds / SECONDS_PER_MINUTE;
    if minutes == 1 {
        "1 minute".to_string()
    } else {
        format!("{minutes} minutes")
    }
}

/// Percentage with at most two decimals and no trailing zeros.
pub fn format_percentage(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    let text = format!("{rounded:.2}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    format!("{text}%")
}
