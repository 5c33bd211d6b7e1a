//! Core rate limiter implementation.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::{debug, trace};

use super::window::RateWindow;
use crate::error::{GatekeeperError, Result};

/// Outcome of a rate limit check.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The request fits in the window and has been recorded
    Admit,
    /// The window is full; nothing was recorded
    Reject,
}

impl Decision {
    pub fn is_admit(self) -> bool {
        matches!(self, Decision::Admit)
    }
}

/// Sliding-window rate limiter keyed by identity.
///
/// This struct is thread-safe and can be shared across multiple tasks. Each
/// check-and-record runs under the map shard lock that owns the identity, so
/// concurrent calls for one identity can never over-admit.
#[derive(Debug)]
pub struct RateLimiter {
    /// Request windows indexed by identity
    windows: DashMap<String, RateWindow>,
    /// Maximum admitted requests per window
    limit: usize,
    /// Length of the sliding window
    interval: Duration,
}

impl RateLimiter {
    /// Create a rate limiter admitting `limit` requests per `interval`.
    pub fn new(limit: usize, interval: Duration) -> Result<Self> {
        if limit == 0 {
            return Err(GatekeeperError::Config(
                "rate limit must be at least 1".to_string(),
            ));
        }
        if interval <= Duration::zero() {
            return Err(GatekeeperError::Config(
                "rate limit interval must be positive".to_string(),
            ));
        }

        Ok(Self {
            windows: DashMap::new(),
            limit,
            interval,
        })
    }

    /// Check the window for `identity` at `now` and record the request if it
    /// fits.
    pub fn check_and_record(&self, identity: &str, now: DateTime<Utc>) -> Decision {
        let mut window = self.windows.entry(identity.to_owned()).or_default();

        let pruned = window.prune(now, self.interval);
        trace!(
            identity = %identity,
            pruned = pruned,
            in_window = window.len(),
            "Checking rate limit"
        );

        if window.len() >= self.limit {
            debug!(identity = %identity, limit = self.limit, "Rate limit exceeded");
            return Decision::Reject;
        }

        window.record(now);
        Decision::Admit
    }

    /// Number of requests counted against `identity` at `now`, without
    /// recording anything.
    pub fn window_len(&self, identity: &str, now: DateTime<Utc>) -> usize {
        self.windows
            .get(identity)
            .map(|w| w.live_count(now, self.interval))
            .unwrap_or(0)
    }

    /// Requests `identity` may still make at `now`.
    pub fn remaining(&self, identity: &str, now: DateTime<Utc>) -> usize {
        self.limit.saturating_sub(self.window_len(identity, now))
    }

    /// Remove windows with no live entries at `now`.
    ///
    /// Returns the number of identities dropped. A later check for a dropped
    /// identity starts again from an empty window.
    pub fn purge_idle(&self, now: DateTime<Utc>) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, window| {
            window.prune(now, self.interval);
            !window.is_empty()
        });
        let purged = before.saturating_sub(self.windows.len());
        if purged > 0 {
            debug!(purged = purged, "Purged idle rate windows");
        }
        purged
    }

    /// Get the number of identities currently tracked.
    pub fn tracked_identities(&self) -> usize {
        self.windows.len()
    }

    /// Clear all windows.
    ///
    /// This is primarily useful for testing.
    pub fn clear(&self) {
        self.windows.clear();
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn limiter(limit: usize, interval_secs: i64) -> RateLimiter {
        RateLimiter::new(limit, Duration::seconds(interval_secs)).unwrap()
    }

    #[test]
    fn test_rate_limiter_creation() {
        let limiter = limiter(5, 60);
        assert_eq!(limiter.tracked_identities(), 0);
        assert_eq!(limiter.limit(), 5);
        assert_eq!(limiter.interval(), Duration::seconds(60));
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        assert!(RateLimiter::new(0, Duration::seconds(60)).is_err());
        assert!(RateLimiter::new(1, Duration::zero()).is_err());
        assert!(RateLimiter::new(1, Duration::seconds(-1)).is_err());
    }

    #[test]
    fn test_unknown_identity_is_admitted() {
        let limiter = limiter(1, 60);
        assert_eq!(limiter.check_and_record("new", at(0)), Decision::Admit);
        assert_eq!(limiter.tracked_identities(), 1);
    }

    #[test]
    fn test_limit_plus_one_is_rejected() {
        let limiter = limiter(5, 60);
        for i in 0..5 {
            assert_eq!(limiter.check_and_record("u", at(i)), Decision::Admit);
        }
        assert_eq!(limiter.check_and_record("u", at(5)), Decision::Reject);
        // Rejections are not recorded.
        assert_eq!(limiter.window_len("u", at(5)), 5);
    }

    #[test]
    fn test_scenario_two_per_minute() {
        let limiter = limiter(2, 60);
        assert_eq!(limiter.check_and_record("u1", at(0)), Decision::Admit);
        assert_eq!(limiter.check_and_record("u1", at(10)), Decision::Admit);
        assert_eq!(limiter.check_and_record("u1", at(20)), Decision::Reject);
        assert_eq!(limiter.check_and_record("u1", at(61)), Decision::Admit);
        assert_eq!(limiter.window_len("u1", at(61)), 2);
    }

    #[test]
    fn test_window_boundary_is_exclusive_of_exact_interval() {
        let limiter = limiter(1, 60);
        assert!(limiter.check_and_record("u", at(0)).is_admit());
        assert_eq!(limiter.check_and_record("u", at(59)), Decision::Reject);
        assert_eq!(limiter.check_and_record("u", at(60)), Decision::Admit);
    }

    #[test]
    fn test_identities_have_separate_windows() {
        let limiter = limiter(1, 60);
        assert!(limiter.check_and_record("a", at(0)).is_admit());
        assert!(limiter.check_and_record("b", at(0)).is_admit());
        assert!(!limiter.check_and_record("a", at(1)).is_admit());
        assert_eq!(limiter.tracked_identities(), 2);
    }

    #[test]
    fn test_remaining_tracks_window() {
        let limiter = limiter(3, 60);
        assert_eq!(limiter.remaining("u", at(0)), 3);
        let _ = limiter.check_and_record("u", at(0));
        assert_eq!(limiter.remaining("u", at(1)), 2);
        assert_eq!(limiter.remaining("u", at(60)), 3);
    }

    #[test]
    fn test_purge_idle_drops_only_empty_windows() {
        let limiter = limiter(2, 60);
        let _ = limiter.check_and_record("old", at(0));
        let _ = limiter.check_and_record("fresh", at(50));

        assert_eq!(limiter.purge_idle(at(70)), 1);
        assert_eq!(limiter.tracked_identities(), 1);
        assert_eq!(limiter.window_len("fresh", at(70)), 1);

        // A purged identity starts over from an empty window.
        assert!(limiter.check_and_record("old", at(71)).is_admit());
        assert!(limiter.check_and_record("old", at(72)).is_admit());
        assert!(!limiter.check_and_record("old", at(73)).is_admit());
    }

    #[test]
    fn test_clear_windows() {
        let limiter = limiter(2, 60);
        let _ = limiter.check_and_record("u", at(0));
        limiter.clear();
        assert_eq!(limiter.tracked_identities(), 0);
    }

    #[test]
    fn test_concurrent_threads_never_over_admit() {
        let limiter = limiter(10, 60);
        let admitted = AtomicUsize::new(0);
        let rejected = AtomicUsize::new(0);

        std::thread::scope(|s| {
            for _ in 0..64 {
                s.spawn(|| match limiter.check_and_record("shared", at(0)) {
                    Decision::Admit => admitted.fetch_add(1, Ordering::SeqCst),
                    Decision::Reject => rejected.fetch_add(1, Ordering::SeqCst),
                });
            }
        });

        assert_eq!(admitted.load(Ordering::SeqCst), 10);
        assert_eq!(rejected.load(Ordering::SeqCst), 54);
        assert_eq!(limiter.window_len("shared", at(0)), 10);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_tasks_never_over_admit() {
        let limiter = Arc::new(limiter(7, 60));

        let tasks = (0..100).map(|_| {
            let limiter = Arc::clone(&limiter);
            tokio::spawn(async move { limiter.check_and_record("shared", at(5)) })
        });
        let decisions = futures::future::join_all(tasks).await;

        let admitted = decisions
            .into_iter()
            .map(|d| d.unwrap())
            .filter(|d| d.is_admit())
            .count();
        assert_eq!(admitted, 7);
    }
}
