//! Publisher object-key conventions.
//!
//! Producers write one object per collection window under
//! `{exchange}/{collector}/{t_start}-{t_end}.json`, where the bounds are
//! Unix-second floats formatted with exactly six fractional digits.
//! Windows are 300 seconds wide and aligned to wall-clock minute
//! boundaries divisible by five; the first window after producer startup
//! may be short. The index itself never parses this convention - it keys
//! off the `.json` suffix only - but embedders constructing or matching
//! producer keys use these helpers.

/// Width of a producer collection window in seconds.
pub const WINDOW_SECONDS: f64 = 300.0;

/// Formats the object key for one collection window.
#[must_use]
pub fn window_key(exchange: &str, collector: &str, start_secs: f64, end_secs: f64) -> String {
    format!("{exchange}/{collector}/{start_secs:.6}-{end_secs:.6}.json")
}

/// Returns the next clean five-minute boundary at or after `now_secs`.
#[must_use]
pub fn next_window_boundary(now_secs: f64) -> f64 {
    (now_secs / WINDOW_SECONDS).ceil() * WINDOW_SECONDS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_key_format() {
        let key = window_key("coinbase", "coinbase-btc-usd", 1_700_000_100.0, 1_700_000_400.0);
        assert_eq!(
            key,
            "coinbase/coinbase-btc-usd/1700000100.000000-1700000400.000000.json"
        );
        assert!(key.ends_with(".json"));
    }

    #[test]
    fn test_window_key_keeps_fractional_seconds() {
        let key = window_key("kraken", "kraken-btc-usd", 1_700_000_087.25, 1_700_000_100.0);
        assert!(key.contains("1700000087.250000-1700000100.000000"));
    }

    #[test]
    fn test_next_window_boundary_alignment() {
        assert_eq!(next_window_boundary(1_700_000_100.0), 1_700_000_100.0);
        assert_eq!(next_window_boundary(1_700_000_101.5), 1_700_000_400.0);
    }
}
