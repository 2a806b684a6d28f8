// src/cache.rs
//! Single-slot TTL cache for discovery feeds.

use chrono::{DateTime, Utc};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
pub struct Cached<T> {
    pub value: T,
    pub refreshed_at: DateTime<Utc>,
    stored: Instant,
}

/// Holds the last good value for `ttl`. The lock is held across a refresh so
/// concurrent callers wait for one upstream fetch instead of starting many.
pub struct TtlCache<T> {
    ttl: Duration,
    slot: Mutex<Option<Cached<T>>>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// Return the cached value while fresh; otherwise run `refresh`. The
    /// result is stored only when `keep` accepts it, so failed fetches are
    /// retried on the next call.
    pub async fn get_or_refresh<F, Fut, K>(&self, refresh: F, keep: K) -> Cached<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
        K: FnOnce(&T) -> bool,
    {
        let mut slot = self.slot.lock().await;
        if let Some(c) = slot.as_ref() {
            if c.stored.elapsed() < self.ttl {
                return c.clone();
            }
        }

        let value = refresh().await;
        let fresh = Cached {
            value,
            refreshed_at: Utc::now(),
            stored: Instant::now(),
        };
        if keep(&fresh.value) {
            *slot = Some(fresh.clone());
        }
        fresh
    }

    pub async fn invalidate(&self) {
        *self.slot.lock().await = None;
    }
}
