//! Rotation over the active proxy set.
//!
//! One selector instance lives inside the manager for its whole lifetime and
//! owns the shared rotation cursor. The snapshot it rotates over is the
//! active set ordered by id; the manager refreshes it whenever membership or
//! an `is_active` flag changes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use rand::seq::SliceRandom;

use crate::error::{PoolError, Result};
use crate::models::ProxyRecord;

/// Stateful chooser over the active proxy snapshot
///
/// Uses an atomic cursor so concurrent `next()` callers each observe a
/// distinct read-increment; fairness across snapshot refreshes is not
/// attempted.
pub struct RotationSelector {
    active: RwLock<Vec<Arc<ProxyRecord>>>,
    cursor: AtomicUsize,
}

impl RotationSelector {
    pub fn new() -> Self {
        Self {
            active: RwLock::new(Vec::new()),
            cursor: AtomicUsize::new(0),
        }
    }

    /// Round-robin selection: record at `cursor mod len`, then advance
    pub fn next(&self) -> Result<Arc<ProxyRecord>> {
        let active = self.active.read();

        if active.is_empty() {
            return Err(PoolError::EmptyPool);
        }

        let len = active.len();
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % len;

        active.get(idx).cloned().ok_or(PoolError::EmptyPool)
    }

    /// Uniformly random selection; does not touch the cursor
    pub fn random(&self) -> Result<Arc<ProxyRecord>> {
        let active = self.active.read();

        if active.is_empty() {
            return Err(PoolError::EmptyPool);
        }

        let mut rng = rand::thread_rng();
        active.choose(&mut rng).cloned().ok_or(PoolError::EmptyPool)
    }

    /// Replace the snapshot with a fresh active set (ordered by id).
    /// The cursor restarts; membership churn fairness is a non-goal.
    pub fn refresh(&self, records: Vec<ProxyRecord>) {
        let mut guard = self.active.write();
        *guard = records.into_iter().map(Arc::new).collect();
        self.cursor.store(0, Ordering::Relaxed);
    }

    pub fn available_count(&self) -> usize {
        self.active.read().len()
    }
}

impl Default for RotationSelector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProxyProtocol;
    use chrono::Utc;
    use std::collections::HashMap;

    fn record(id: i64) -> ProxyRecord {
        ProxyRecord {
            id,
            host: format!("10.0.0.{}", id),
            port: 1080,
            protocol: ProxyProtocol::Socks5,
            username: None,
            password_encrypted: None,
            is_active: true,
            success_count: 0,
            fail_count: 0,
            latency_ms: None,
            last_tested_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_next_on_empty_snapshot() {
        let selector = RotationSelector::new();
        assert!(matches!(selector.next(), Err(PoolError::EmptyPool)));
        assert!(matches!(selector.random(), Err(PoolError::EmptyPool)));
    }

    #[test]
    fn test_round_robin_order_and_wraparound() {
        let selector = RotationSelector::new();
        selector.refresh(vec![record(1), record(2), record(3)]);

        let ids: Vec<i64> = (0..6).map(|_| selector.next().unwrap().id).collect();
        assert_eq!(ids, vec![1, 2, 3, 1, 2, 3]);
    }

    #[test]
    fn test_round_robin_visits_each_at_least_floor_n_over_k() {
        let selector = RotationSelector::new();
        selector.refresh(vec![record(1), record(2), record(3)]);

        let n = 100;
        let mut visits: HashMap<i64, usize> = HashMap::new();
        for _ in 0..n {
            *visits.entry(selector.next().unwrap().id).or_default() += 1;
        }
        for id in [1, 2, 3] {
            assert!(visits[&id] >= n / 3, "proxy {} starved: {:?}", id, visits);
        }
    }

    #[test]
    fn test_refresh_restarts_cursor() {
        let selector = RotationSelector::new();
        selector.refresh(vec![record(1), record(2)]);

        selector.next().unwrap();
        selector.next().unwrap();

        selector.refresh(vec![record(10), record(20)]);
        assert_eq!(selector.next().unwrap().id, 10);
    }

    #[test]
    fn test_random_does_not_advance_cursor() {
        let selector = RotationSelector::new();
        selector.refresh(vec![record(1), record(2), record(3)]);

        for _ in 0..10 {
            let id = selector.random().unwrap().id;
            assert!((1..=3).contains(&id));
        }

        // Cursor untouched by random(): next() still starts at the beginning
        assert_eq!(selector.next().unwrap().id, 1);
    }

    #[test]
    fn test_available_count() {
        let selector = RotationSelector::new();
        assert_eq!(selector.available_count(), 0);
        selector.refresh(vec![record(1), record(2)]);
        assert_eq!(selector.available_count(), 2);
    }
}
