//! Daily request quota against the extraction provider.
//!
//! The window is a rolling 24 hours that starts at the first reservation
//! after the previous window ran out. Resets happen lazily inside
//! [`QuotaLimiter::check_and_reserve`]; no timer task is involved.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::SearchError;
use crate::clock::{Clock, SystemClock};

/// Length of a quota window.
pub const QUOTA_WINDOW_HOURS: i64 = 24;

#[derive(Debug)]
struct QuotaState {
    count: u32,
    window_start: DateTime<Utc>,
    limit: u32,
}

impl QuotaState {
    fn reset_time(&self) -> DateTime<Utc> {
        self.window_start + Duration::hours(QUOTA_WINDOW_HOURS)
    }

    fn roll_if_elapsed(&mut self, now: DateTime<Utc>) {
        if now - self.window_start >= Duration::hours(QUOTA_WINDOW_HOURS) {
            *self = QuotaState { count: 0, window_start: now, limit: self.limit };
        }
    }
}

/// Point-in-time view of the quota for usage reporting.
#[derive(Debug, Clone, PartialEq, Serialize, schemars::JsonSchema)]
pub struct QuotaSnapshot {
    pub count: u32,
    pub limit: u32,
    pub remaining: u32,
    pub window_start: DateTime<Utc>,
    pub reset_time: DateTime<Utc>,
}

/// Rolling daily counter of provider requests.
#[derive(Debug)]
pub struct QuotaLimiter {
    state: Mutex<QuotaState>,
    clock: Arc<dyn Clock>,
}

impl QuotaLimiter {
    /// Create a limiter allowing `limit` requests per window, on the system clock.
    pub fn new(limit: u32) -> Self {
        Self::with_clock(limit, Arc::new(SystemClock))
    }

    pub fn with_clock(limit: u32, clock: Arc<dyn Clock>) -> Self {
        let window_start = clock.now();
        Self { state: Mutex::new(QuotaState { count: 0, window_start, limit }), clock }
    }

    fn lock(&self) -> MutexGuard<'_, QuotaState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Reserve one request slot in the current window.
    ///
    /// The window check, the limit check and the increment run under a single
    /// lock, so concurrent callers can never overshoot the limit.
    pub fn check_and_reserve(&self) -> Result<(), SearchError> {
        let now = self.clock.now();
        let mut state = self.lock();
        state.roll_if_elapsed(now);

        if state.count >= state.limit {
            tracing::warn!(
                count = state.count,
                limit = state.limit,
                reset_time = %state.reset_time(),
                "daily provider quota exhausted"
            );
            return Err(SearchError::QuotaExceeded { limit: state.limit, reset_time: state.reset_time() });
        }

        state.count += 1;
        tracing::debug!(count = state.count, limit = state.limit, "reserved provider quota slot");
        Ok(())
    }

    /// Current usage, with an elapsed window reported as already reset.
    pub fn snapshot(&self) -> QuotaSnapshot {
        let now = self.clock.now();
        let mut state = self.lock();
        state.roll_if_elapsed(now);

        QuotaSnapshot {
            count: state.count,
            limit: state.limit,
            remaining: state.limit.saturating_sub(state.count),
            window_start: state.window_start,
            reset_time: state.reset_time(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn limiter(limit: u32) -> (QuotaLimiter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        (QuotaLimiter::with_clock(limit, clock.clone()), clock)
    }

    #[test]
    fn test_quota_boundary_and_reset() {
        let (limiter, clock) = limiter(3);

        for _ in 0..3 {
            limiter.check_and_reserve().unwrap();
        }

        let err = limiter.check_and_reserve().unwrap_err();
        assert!(matches!(err, SearchError::QuotaExceeded { limit: 3, .. }));
        assert_eq!(limiter.snapshot().count, 3);

        clock.advance(Duration::hours(24));
        limiter.check_and_reserve().unwrap();
        assert_eq!(limiter.snapshot().count, 1);
    }

    #[test]
    fn test_reset_time_is_window_end() {
        let (limiter, clock) = limiter(1);
        let start = clock.now();
        limiter.check_and_reserve().unwrap();

        match limiter.check_and_reserve() {
            Err(SearchError::QuotaExceeded { reset_time, .. }) => {
                assert_eq!(reset_time, start + Duration::hours(24));
            }
            other => panic!("expected QuotaExceeded, got {other:?}"),
        }
    }

    #[test]
    fn test_window_not_reset_early() {
        let (limiter, clock) = limiter(1);
        limiter.check_and_reserve().unwrap();

        clock.advance(Duration::hours(23) + Duration::minutes(59));
        assert!(limiter.check_and_reserve().is_err());
    }

    #[test]
    fn test_snapshot_reports_remaining() {
        let (limiter, _clock) = limiter(5);
        limiter.check_and_reserve().unwrap();
        limiter.check_and_reserve().unwrap();

        let snapshot = limiter.snapshot();
        assert_eq!(snapshot.count, 2);
        assert_eq!(snapshot.remaining, 3);
        assert_eq!(snapshot.reset_time, snapshot.window_start + Duration::hours(24));
    }

    #[test]
    fn test_concurrent_reservations_never_overshoot() {
        let limiter = Arc::new(QuotaLimiter::new(50));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || (0..20).filter(|_| limiter.check_and_reserve().is_ok()).count())
            })
            .collect();

        let granted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(granted, 50);
        assert_eq!(limiter.snapshot().count, 50);
    }
}
