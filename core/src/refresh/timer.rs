//! Exponential-backoff scheduling for periodic refresh.

use rand::Rng;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Attempt counts beyond this no longer grow the backoff exponent.
const MAX_BACKOFF_ATTEMPTS: u32 = 30;

/// Shortest refresh interval accepted at construction.
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// Errors raised by the refresh scheduler and refreshable sources.
#[derive(Debug, Clone, Error)]
pub enum RefreshError {
    /// The configured refresh interval is below the supported minimum.
    #[error("refresh interval must be at least {min:?}, got {actual:?}")]
    IntervalTooShort { min: Duration, actual: Duration },

    /// A refresh attempt against the underlying source failed.
    #[error("refresh failed: {reason}")]
    Failed { reason: String },
}

/// Configuration for a [`RefreshTimer`].
#[derive(Debug, Clone)]
pub struct RefreshTimerConfig {
    /// Time between successful refreshes.
    pub interval: Duration,
    /// Smallest delay before retrying a failed refresh.
    pub min_backoff: Duration,
    /// Largest delay before retrying a failed refresh.
    pub max_backoff: Duration,
}

impl Default for RefreshTimerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            min_backoff: Duration::from_secs(30),
            max_backoff: Duration::from_secs(600),
        }
    }
}

/// Schedules periodic refreshes, backing off exponentially on failure.
///
/// After a successful refresh ([`reset`](Self::reset)) the next refresh is
/// due one full interval later. After a failure ([`backoff`](Self::backoff))
/// the next attempt is due after a jittered exponential delay, clamped so a
/// retry never waits longer than a regular refresh period. Not internally
/// thread-safe; the owner synchronizes access.
#[derive(Debug)]
pub struct RefreshTimer {
    interval: Duration,
    min_backoff: Duration,
    max_backoff: Duration,
    attempts: u32,
    next_refresh: Instant,
}

impl RefreshTimer {
    /// Build a timer, validating the interval. Backoff bounds wider than
    /// the interval are clamped to it.
    pub fn new(config: RefreshTimerConfig) -> Result<Self, RefreshError> {
        if config.interval < MIN_REFRESH_INTERVAL {
            return Err(RefreshError::IntervalTooShort {
                min: MIN_REFRESH_INTERVAL,
                actual: config.interval,
            });
        }
        Ok(Self {
            interval: config.interval,
            min_backoff: config.min_backoff.min(config.interval),
            max_backoff: config.max_backoff.min(config.interval),
            attempts: 1,
            next_refresh: Instant::now() + config.interval,
        })
    }

    /// Whether a refresh is due.
    pub fn needs_refresh(&self) -> bool {
        Instant::now() >= self.next_refresh
    }

    /// Time remaining until the next refresh is due (zero if overdue).
    pub fn until_next_refresh(&self) -> Duration {
        self.next_refresh.saturating_duration_since(Instant::now())
    }

    /// Consecutive failed attempts recorded so far (starts at 1).
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Record a successful refresh: schedule the next one a full interval
    /// out and reset the attempt counter.
    pub fn reset(&mut self) {
        self.next_refresh = Instant::now() + self.interval;
        self.attempts = 1;
    }

    /// Record a failed refresh: schedule the retry after a jittered
    /// exponential backoff and bump the attempt counter.
    pub fn backoff(&mut self) {
        let delay = self.jittered_backoff();
        self.next_refresh = Instant::now() + delay;
        self.attempts = self.attempts.saturating_add(1);
    }

    /// The pre-jitter backoff cap for the current attempt count.
    ///
    /// Monotonically non-decreasing in the attempt count, always at least
    /// `min_backoff`, and clamped to `max_backoff`.
    pub fn current_backoff_cap(&self) -> Duration {
        let min_ms = self.min_backoff.as_millis().max(1) as u64;
        let max_ms = self.max_backoff.as_millis() as u64;
        if max_ms <= min_ms {
            return Duration::from_millis(min_ms);
        }
        let exp = self.attempts.min(MAX_BACKOFF_ATTEMPTS);
        let calculated = min_ms.saturating_mul(1u64 << exp);
        Duration::from_millis(calculated.min(max_ms))
    }

    fn jittered_backoff(&self) -> Duration {
        let cap = self.current_backoff_cap();
        let min_ms = self.min_backoff.as_millis().max(1) as u64;
        let cap_ms = cap.as_millis() as u64;
        if cap_ms <= min_ms {
            return Duration::from_millis(min_ms);
        }
        let jitter = rand::thread_rng().gen_range(0..=cap_ms - min_ms);
        Duration::from_millis(min_ms + jitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timer(interval: u64, min: u64, max: u64) -> RefreshTimer {
        RefreshTimer::new(RefreshTimerConfig {
            interval: Duration::from_secs(interval),
            min_backoff: Duration::from_secs(min),
            max_backoff: Duration::from_secs(max),
        })
        .unwrap()
    }

    #[test]
    fn test_sub_second_interval_rejected() {
        let err = RefreshTimer::new(RefreshTimerConfig {
            interval: Duration::from_millis(200),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, RefreshError::IntervalTooShort { .. }));
    }

    #[test]
    fn test_fresh_timer_is_not_due() {
        let t = timer(30, 1, 10);
        assert!(!t.needs_refresh());
        assert!(t.until_next_refresh() <= Duration::from_secs(30));
    }

    #[test]
    fn test_backoff_cap_grows_until_max() {
        let mut t = timer(600, 1, 60);
        let mut last = Duration::ZERO;
        for _ in 0..20 {
            let cap = t.current_backoff_cap();
            assert!(cap >= Duration::from_secs(1));
            assert!(cap <= Duration::from_secs(60));
            assert!(cap >= last, "cap must not shrink as attempts grow");
            last = cap;
            t.backoff();
        }
        assert_eq!(last, Duration::from_secs(60));
    }

    #[test]
    fn test_backoff_bounds_clamped_to_interval() {
        // min 30s / max 600s against a 10s interval collapse to 10s.
        let t = timer(10, 30, 600);
        assert_eq!(t.current_backoff_cap(), Duration::from_secs(10));
    }

    #[test]
    fn test_reset_restores_attempt_counter() {
        let mut t = timer(600, 1, 60);
        t.backoff();
        t.backoff();
        assert_eq!(t.attempts(), 3);
        t.reset();
        assert_eq!(t.attempts(), 1);
        assert!(!t.needs_refresh());
    }

    #[test]
    fn test_backoff_schedules_within_bounds() {
        let mut t = timer(600, 2, 16);
        t.backoff();
        // Next attempt due no sooner than min_backoff and no later than max.
        let wait = t.until_next_refresh();
        assert!(wait >= Duration::from_millis(1900), "wait was {wait:?}");
        assert!(wait <= Duration::from_secs(16));
    }
}
