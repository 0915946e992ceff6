//! Elapsed-time percentage of an SLA window

use chrono::{DateTime, Utc};

/// Percentage of the `start..due` window that has elapsed at `now`.
///
/// - Missing `start` or `due` yields 0: there is no deadline to measure.
/// - An empty or inverted window (`due <= start`) yields 100.
/// - Otherwise the value is capped at 100 but not floored, so a `now`
///   before `start` is negative and sits below every milestone.
pub fn elapsed_percentage(
    start: Option<DateTime<Utc>>,
    due: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> f64 {
    let (start, due) = match (start, due) {
        (Some(start), Some(due)) => (start, due),
        _ => return 0.0,
    };

    let total_ms = (due - start).num_milliseconds();
    if total_ms <= 0 {
        return 100.0;
    }

    let elapsed_ms = (now - start).num_milliseconds();
    (elapsed_ms as f64 / total_ms as f64 * 100.0).min(100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_missing_bounds_are_zero() {
        let now = Utc::now();
        assert_eq!(elapsed_percentage(None, Some(now), now), 0.0);
        assert_eq!(elapsed_percentage(Some(now), None, now), 0.0);
        assert_eq!(elapsed_percentage(None, None, now), 0.0);
    }

    #[test]
    fn test_degenerate_window_is_expired() {
        let t0 = Utc::now();
        assert_eq!(elapsed_percentage(Some(t0), Some(t0), t0), 100.0);
        assert_eq!(
            elapsed_percentage(Some(t0), Some(t0 - Duration::hours(1)), t0 - Duration::days(1)),
            100.0
        );
    }

    #[test]
    fn test_midpoint() {
        let t0 = Utc::now();
        let pct = elapsed_percentage(
            Some(t0),
            Some(t0 + Duration::seconds(100)),
            t0 + Duration::seconds(50),
        );
        assert!((pct - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_clamped_after_due() {
        let t0 = Utc::now();
        let pct = elapsed_percentage(
            Some(t0),
            Some(t0 + Duration::seconds(100)),
            t0 + Duration::seconds(200),
        );
        assert_eq!(pct, 100.0);
    }

    #[test]
    fn test_before_start_is_negative() {
        let t0 = Utc::now();
        let pct = elapsed_percentage(
            Some(t0),
            Some(t0 + Duration::seconds(100)),
            t0 - Duration::seconds(25),
        );
        assert!((pct + 25.0).abs() < 1e-9);
    }
}
