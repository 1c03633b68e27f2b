//! Background refresh of stale or missing entries.

use chrono::{Duration, Utc};
use marquee_core::{Record, ResourceClient};
use marquee_store::{QueryKey, ResourceCache};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Refreshes cache entries from the server, deduplicating concurrent
/// requests for the same key and debouncing keys fetched moments ago.
///
/// The in-flight set is the truth for deduplication; entry status is
/// presentation. Completions run through fetch tickets, so a refresh that
/// lost a race with a local write is discarded by the store.
pub struct Refetcher<T: Record> {
    client: Arc<dyn ResourceClient<T>>,
    cache: ResourceCache<T>,
    in_flight: Mutex<HashSet<QueryKey>>,
    debounce: Duration,
}

impl<T: Record> Refetcher<T> {
    pub fn new(
        client: Arc<dyn ResourceClient<T>>,
        cache: ResourceCache<T>,
        debounce: Duration,
    ) -> Self {
        Self {
            client,
            cache,
            in_flight: Mutex::new(HashSet::new()),
            debounce,
        }
    }

    fn lock_in_flight(&self) -> std::sync::MutexGuard<'_, HashSet<QueryKey>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Refresh one key unless an equivalent fetch is already in flight or
    /// the entry was fetched within the debounce window. Returns true when
    /// a fetch ran and its result was applied.
    pub async fn refresh(&self, key: &QueryKey) -> bool {
        if !self.admit(key) {
            return false;
        }
        self.run_fetch(key).await
    }

    /// Refresh now, bypassing deduplication and the debounce window.
    pub async fn force_refresh(&self, key: &QueryKey) -> bool {
        self.lock_in_flight().insert(key.clone());
        self.run_fetch(key).await
    }

    /// Spawn `refresh` on the runtime.
    pub fn spawn_refresh(self: &Arc<Self>, key: QueryKey) {
        let refetcher = Arc::clone(self);
        tokio::spawn(async move {
            refetcher.refresh(&key).await;
        });
    }

    /// Spawn `force_refresh` on the runtime.
    pub fn spawn_force_refresh(self: &Arc<Self>, key: QueryKey) {
        let refetcher = Arc::clone(self);
        tokio::spawn(async move {
            refetcher.force_refresh(&key).await;
        });
    }

    fn admit(&self, key: &QueryKey) -> bool {
        let fresh = match key {
            QueryKey::Collection { .. } => self
                .cache
                .lists()
                .peek(key)
                .is_some_and(|entry| entry.is_fresh_within(self.debounce, Utc::now())),
            QueryKey::Detail { .. } => self
                .cache
                .details()
                .peek(key)
                .is_some_and(|entry| entry.is_fresh_within(self.debounce, Utc::now())),
        };
        if fresh {
            debug!(key = %key, "Skipping refresh of a fresh entry");
            return false;
        }
        let mut in_flight = self.lock_in_flight();
        if in_flight.contains(key) {
            debug!(key = %key, "Refresh already in flight");
            return false;
        }
        in_flight.insert(key.clone());
        true
    }

    async fn run_fetch(&self, key: &QueryKey) -> bool {
        let applied = match key {
            QueryKey::Collection { params, .. } => {
                let ticket = self.cache.lists().begin_fetch(key);
                let result = self.client.list(params).await;
                if let Err(err) = &result {
                    debug!(key = %key, error = %err, "List refresh failed");
                }
                self.cache.lists().complete_fetch(&ticket, result)
            }
            QueryKey::Detail { id, .. } => {
                let ticket = self.cache.details().begin_fetch(key);
                let result = self.client.get(*id).await;
                if let Err(err) = &result {
                    debug!(key = %key, error = %err, "Detail refresh failed");
                }
                self.cache.details().complete_fetch(&ticket, result)
            }
        };
        self.lock_in_flight().remove(key);
        applied
    }
}
