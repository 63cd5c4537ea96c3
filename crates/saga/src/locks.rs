//! Per-booking-id advisory locks.
//!
//! The upstream provider gives no ordering guarantees for concurrent
//! operations on one booking, so the saga serializes
//! reserve → confirm → cancel/reschedule per booking id locally.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Registry of async mutexes keyed by external booking id.
///
/// Locks are created lazily on first use and kept for the lifetime of
/// the registry; the key space is bounded by the set of bookings this
/// process has touched.
#[derive(Debug, Default)]
pub struct BookingLocks {
    inner: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl BookingLocks {
    /// Creates an empty lock registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock for `key`, waiting if another operation on
    /// the same booking holds it.
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().unwrap();
            map.entry(key.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Number of distinct keys seen so far.
    pub fn key_count(&self) -> usize {
        self.inner.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_key_is_mutually_exclusive() {
        let locks = Arc::new(BookingLocks::new());
        let trace = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for task in 0..4u32 {
            let locks = locks.clone();
            let trace = trace.clone();
            handles.push(tokio::spawn(async move {
                let _guard = locks.acquire("B123").await;
                trace.lock().unwrap().push((task, "enter"));
                tokio::time::sleep(Duration::from_millis(5)).await;
                trace.lock().unwrap().push((task, "exit"));
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // Every enter must be followed by the same task's exit.
        let trace = trace.lock().unwrap();
        for pair in trace.chunks(2) {
            assert_eq!(pair[0].0, pair[1].0);
            assert_eq!(pair[0].1, "enter");
            assert_eq!(pair[1].1, "exit");
        }
        assert_eq!(locks.key_count(), 1);
    }

    #[tokio::test]
    async fn different_keys_do_not_block_each_other() {
        let locks = BookingLocks::new();
        let guard_a = locks.acquire("B123").await;
        // Acquiring another key while holding the first must not hang.
        let guard_b = locks.acquire("B456").await;
        drop(guard_a);
        drop(guard_b);
        assert_eq!(locks.key_count(), 2);
    }
}
