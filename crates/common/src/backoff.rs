//! Exponential backoff with jitter, shared by the rate limiter's wait path
//! and the worker's retry scheduler.

use std::time::Duration;

pub const DEFAULT_BASE_SECONDS: f64 = 2.0;
pub const DEFAULT_CAP_SECONDS: f64 = 60.0;
const JITTER_MIN: f64 = 0.75;
const JITTER_MAX: f64 = 0.25;

/// `base * 2^attempt`, capped, then scaled by a uniform jitter factor in
/// `[0.75, 1.25)` so a burst of retries doesn't all wake up on the same
/// tick.
pub fn compute_backoff_delay(attempt: u32, base_seconds: f64, cap_seconds: f64) -> Duration {
    let exp = base_seconds * 2f64.powi(attempt as i32);
    let capped = exp.min(cap_seconds);
    let jitter = JITTER_MIN + rand::random::<f64>() * JITTER_MAX * 2.0;
    Duration::from_secs_f64(capped * jitter)
}

pub fn default_backoff_delay(attempt: u32) -> Duration {
    compute_backoff_delay(attempt, DEFAULT_BASE_SECONDS, DEFAULT_CAP_SECONDS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_within_jittered_bounds() {
        for attempt in 0..10 {
            let d = compute_backoff_delay(attempt, 2.0, 60.0);
            let capped = (2.0 * 2f64.powi(attempt as i32)).min(60.0);
            assert!(d.as_secs_f64() >= capped * 0.75 - 0.001);
            assert!(d.as_secs_f64() <= capped * 1.25 + 0.001);
        }
    }

    #[test]
    fn respects_the_cap_at_high_attempt_counts() {
        let d = compute_backoff_delay(20, 2.0, 60.0);
        assert!(d.as_secs_f64() <= 60.0 * 1.25 + 0.001);
    }
}
