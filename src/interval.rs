//! Sync interval strings.
//!
//! Accepts `<n>m`, `<n>h`, `<n>d`, or a bare `<n>` which older configs used
//! for hours. Anything else falls back to a week.

use std::time::Duration;

use tracing::warn;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Shortest interval the scheduler will run at.
pub const MIN_INTERVAL: Duration = Duration::from_secs(15 * 60);

pub fn parse_interval(value: &str) -> Duration {
    let value = value.trim();

    if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
        return value
            .parse::<u64>()
            .ok()
            .and_then(|hours| hours.checked_mul(60 * 60))
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_INTERVAL);
    }

    let Some(digits) = value.strip_suffix(['m', 'h', 'd']) else {
        return DEFAULT_INTERVAL;
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return DEFAULT_INTERVAL;
    }

    humantime::parse_duration(value).unwrap_or(DEFAULT_INTERVAL)
}

/// Parsed interval clamped to `MIN_INTERVAL`.
pub fn effective_interval(value: &str) -> Duration {
    let parsed = parse_interval(value);
    if parsed < MIN_INTERVAL {
        warn!(
            requested = %format_interval(parsed),
            minimum = %format_interval(MIN_INTERVAL),
            "sync interval below minimum, using minimum"
        );
        return MIN_INTERVAL;
    }
    parsed
}

pub fn format_interval(duration: Duration) -> String {
    humantime::format_duration(duration).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minutes(value: &str) -> u64 {
        parse_interval(value).as_secs() / 60
    }

    #[test]
    fn suffixed_values() {
        assert_eq!(minutes("30m"), 30);
        assert_eq!(minutes("2h"), 120);
        assert_eq!(minutes("7d"), 10_080);
    }

    #[test]
    fn bare_number_is_hours() {
        assert_eq!(minutes("24"), 1_440);
        assert_eq!(minutes(" 6 "), 360);
    }

    #[test]
    fn garbage_is_a_week() {
        for value in ["garbage", "", "7w", "-5h", "h", "1.5h", "30 m", "99999999999999999999"] {
            assert_eq!(parse_interval(value), DEFAULT_INTERVAL, "{value:?}");
        }
    }

    #[test]
    fn floor_applies_only_to_effective_interval() {
        assert_eq!(parse_interval("5m"), Duration::from_secs(300));
        assert_eq!(effective_interval("5m"), MIN_INTERVAL);
        assert_eq!(effective_interval("0"), MIN_INTERVAL);
        assert_eq!(effective_interval("1h"), Duration::from_secs(3_600));
    }

    #[test]
    fn formats_with_humantime() {
        assert_eq!(format_interval(Duration::from_secs(7_200)), "2h");
    }
}
