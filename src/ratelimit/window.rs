//! Per-identity sliding window of request timestamps.

use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;

/// Timestamps of recently admitted requests for one identity.
///
/// An entry is live while `now - ts < interval`; an entry exactly `interval`
/// old is expired. Windows are pruned lazily, right before each decision.
#[derive(Debug, Clone, Default)]
pub struct RateWindow {
    timestamps: VecDeque<DateTime<Utc>>,
}

impl RateWindow {
    /// Create an empty window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every entry that has aged out of the window ending at `now`.
    ///
    /// Returns the number of entries removed.
    pub fn prune(&mut self, now: DateTime<Utc>, interval: Duration) -> usize {
        let before = self.timestamps.len();
        // Concurrent callers may record slightly out of order, so scan the
        // whole window instead of stopping at the first live entry.
        self.timestamps.retain(|&ts| now - ts < interval);
        before - self.timestamps.len()
    }

    /// Number of entries that would survive a prune at `now`.
    pub fn live_count(&self, now: DateTime<Utc>, interval: Duration) -> usize {
        self.timestamps
            .iter()
            .filter(|&&ts| now - ts < interval)
            .count()
    }

    /// Record an admitted request.
    pub fn record(&mut self, now: DateTime<Utc>) {
        self.timestamps.push_back(now);
    }

    /// Number of recorded entries, without pruning.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Oldest recorded entry, if any.
    pub fn oldest(&self) -> Option<DateTime<Utc>> {
        self.timestamps.iter().min().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn test_new_window_is_empty() {
        let window = RateWindow::new();
        assert!(window.is_empty());
        assert_eq!(window.oldest(), None);
    }

    #[test]
    fn test_prune_drops_entries_at_exact_boundary() {
        let mut window = RateWindow::new();
        window.record(at(0));
        window.record(at(10));

        let interval = Duration::seconds(60);
        assert_eq!(window.prune(at(59), interval), 0);
        assert_eq!(window.prune(at(60), interval), 1);
        assert_eq!(window.len(), 1);
        assert_eq!(window.oldest(), Some(at(10)));
    }

    #[test]
    fn test_prune_handles_out_of_order_entries() {
        let mut window = RateWindow::new();
        window.record(at(30));
        window.record(at(5));

        assert_eq!(window.prune(at(40), Duration::seconds(20)), 1);
        assert_eq!(window.oldest(), Some(at(30)));
    }

    #[test]
    fn test_live_count_does_not_mutate() {
        let mut window = RateWindow::new();
        window.record(at(0));
        window.record(at(50));

        assert_eq!(window.live_count(at(70), Duration::seconds(60)), 1);
        assert_eq!(window.len(), 2);
    }
}
