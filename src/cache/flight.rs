//! In-flight Request Guard
//!
//! Serializes concurrent cache misses for the same key so the wrapped
//! handler runs once while later callers wait and then read the stored
//! result.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type KeyLock = Arc<AsyncMutex<()>>;

// == Single Flight ==
/// Per-key async locks for in-flight misses.
///
/// A key's lock only exists while at least one caller holds or awaits it.
#[derive(Debug, Default)]
pub struct SingleFlight {
    locks: Mutex<HashMap<String, KeyLock>>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    // == Acquire ==
    /// Waits until no other caller holds `key`, then holds it until the
    /// returned guard is dropped.
    pub async fn acquire(&self, key: &str) -> FlightGuard<'_> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks.entry(key.to_string()).or_default().clone()
        };

        FlightGuard {
            flights: self,
            key: key.to_string(),
            guard: Some(lock.lock_owned().await),
        }
    }

    /// Number of keys currently in flight.
    #[cfg(test)]
    fn in_flight(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn release(&self, key: &str, guard: OwnedMutexGuard<()>) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        // One reference in the map and one inside `guard` means nobody waits
        let idle = locks
            .get(key)
            .is_some_and(|lock| Arc::strong_count(lock) <= 2);
        if idle {
            locks.remove(key);
        }
        drop(guard);
    }
}

// == Flight Guard ==
/// Holds a key's in-flight lock.
#[derive(Debug)]
pub struct FlightGuard<'a> {
    flights: &'a SingleFlight,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if let Some(guard) = self.guard.take() {
            self.flights.release(&self.key, guard);
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_lock_removed_after_release() {
        let flights = SingleFlight::new();
        {
            let _guard = flights.acquire("/a").await;
            assert_eq!(flights.in_flight(), 1);
        }
        assert_eq!(flights.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_block() {
        let flights = SingleFlight::new();
        let _a = flights.acquire("/a").await;
        let _b = flights.acquire("/b").await;
        assert_eq!(flights.in_flight(), 2);
    }

    #[tokio::test]
    async fn test_same_key_is_exclusive() {
        let flights = Arc::new(SingleFlight::new());
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let flights = flights.clone();
                let active = active.clone();
                let peak = peak.clone();
                tokio::spawn(async move {
                    let _guard = flights.acquire("/same").await;
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert_eq!(flights.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_waiter_blocks_until_release() {
        let flights = Arc::new(SingleFlight::new());
        let first = flights.acquire("/k").await;

        let waiter = {
            let flights = flights.clone();
            tokio::spawn(async move {
                let _guard = flights.acquire("/k").await;
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        drop(first);
        waiter.await.unwrap();
        assert_eq!(flights.in_flight(), 0);
    }
}
