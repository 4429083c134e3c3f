//! Per-subject rolling history, owned exclusively by the anomaly consumer's
//! control thread.
//!
//! A bounded FIFO window of the last `N` readings per `customer_id`. Created
//! empty per process start; never persisted across restarts (see
//! non-goals); the key set is never shrunk — one small ring buffer per
//! subject that has ever been observed is an acceptable cost at the
//! simulation's customer cardinality.

use std::collections::{HashMap, VecDeque};

/// Default window capacity: the last 6 readings per subject.
pub const DEFAULT_CAPACITY: usize = 6;

/// A hash map from subject id to a bounded FIFO of recent readings.
#[derive(Debug, Clone)]
pub struct RollingHistory {
    capacity: usize,
    windows: HashMap<String, VecDeque<i32>>,
}

impl RollingHistory {
    /// Create an empty history with the given per-subject window capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            windows: HashMap::new(),
        }
    }

    /// The most recent reading recorded for `customer_id`, if any.
    #[must_use]
    pub fn last(&self, customer_id: &str) -> Option<i32> {
        self.windows.get(customer_id).and_then(|w| w.back().copied())
    }

    /// All readings currently held for `customer_id`, oldest first.
    #[must_use]
    pub fn recent_rates(&self, customer_id: &str) -> Vec<i32> {
        self.windows
            .get(customer_id)
            .map(|w| w.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Append a new reading for `customer_id`, evicting the oldest entry
    /// automatically once the window exceeds capacity.
    pub fn record(&mut self, customer_id: &str, rate: i32) {
        let window = self
            .windows
            .entry(customer_id.to_string())
            .or_insert_with(|| VecDeque::with_capacity(self.capacity));
        if window.len() == self.capacity {
            window.pop_front();
        }
        window.push_back(rate);
    }

    /// Number of distinct subjects currently tracked.
    #[must_use]
    pub fn subject_count(&self) -> usize {
        self.windows.len()
    }
}

impl Default for RollingHistory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_history_has_no_last_value() {
        let history = RollingHistory::default();
        assert_eq!(history.last("cust_00001"), None);
    }

    #[test]
    fn records_and_returns_last_value() {
        let mut history = RollingHistory::default();
        history.record("cust_00001", 72);
        history.record("cust_00001", 90);
        assert_eq!(history.last("cust_00001"), Some(90));
    }

    #[test]
    fn evicts_oldest_beyond_capacity() {
        let mut history = RollingHistory::new(3);
        for rate in [10, 20, 30, 40] {
            history.record("cust_00001", rate);
        }
        assert_eq!(history.recent_rates("cust_00001"), vec![20, 30, 40]);
    }

    #[test]
    fn subjects_are_independent() {
        let mut history = RollingHistory::default();
        history.record("cust_a", 60);
        history.record("cust_b", 150);
        assert_eq!(history.last("cust_a"), Some(60));
        assert_eq!(history.last("cust_b"), Some(150));
    }

    #[test]
    fn subject_count_tracks_distinct_keys() {
        let mut history = RollingHistory::default();
        history.record("cust_a", 60);
        history.record("cust_b", 70);
        history.record("cust_a", 65);
        assert_eq!(history.subject_count(), 2);
    }
}
