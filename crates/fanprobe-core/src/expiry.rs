//! End-of-run certificate expiry check and day/duration helpers.

use crate::stats::ResultStats;
use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;

const SECS_PER_DAY: f64 = 86_400.0;

/// Number of days in `d`.
pub fn days(d: Duration) -> f64 {
    d.as_secs_f64() / SECS_PER_DAY
}

/// Duration of `days` days. Negative or NaN gives zero.
pub fn dur_days(days: f64) -> Duration {
    Duration::try_from_secs_f64(days * SECS_PER_DAY).unwrap_or(if days > 0.0 {
        Duration::MAX
    } else {
        Duration::ZERO
    })
}

/// Days between two instants (negative when `until` is in the past).
pub fn days_between(from: DateTime<Utc>, until: DateTime<Utc>) -> f64 {
    (until - from).num_milliseconds() as f64 / (SECS_PER_DAY * 1000.0)
}

/// Returns false when the shortest certificate expiry seen during the run is
/// strictly closer to `run_start` than `threshold`. Passes when no certificate
/// was seen.
pub fn check_cert_expiry(stats: &ResultStats, run_start: DateTime<Utc>, threshold: Duration) -> bool {
    let Some(floor) = stats.shortest_cert_expiry else {
        return true;
    };
    let remaining = floor - run_start;
    let good = match TimeDelta::from_std(threshold) {
        Ok(limit) => remaining >= limit,
        // Threshold beyond what TimeDelta can hold: nothing can satisfy it.
        Err(_) => false,
    };
    let days_left = days_between(run_start, floor);
    if good {
        tracing::info!(
            "shortest cert expiry is {} ({:.1} days from now)",
            floor,
            days_left
        );
    } else {
        tracing::error!(
            "shortest cert expiry is {} ({:.1} days from now), below the {:.1} days threshold",
            floor,
            days_left,
            days(threshold)
        );
    }
    good
}
