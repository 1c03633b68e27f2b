//! Cache entry state.

use chrono::{DateTime, Duration, Utc};
use marquee_core::Error;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Fetch lifecycle of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    /// Created but never fetched.
    Idle,
    /// A fetch is in flight; any previous data stays visible.
    Loading,
    Success,
    Error,
}

/// Stored state for one query key.
///
/// `stale` is a visible substate of success: the data keeps rendering
/// while a refresh is pending. On fetch errors the last known-good data is
/// kept so consumers can show something alongside the error.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub data: Option<V>,
    pub status: FetchStatus,
    pub stale: bool,
    pub error: Option<Arc<Error>>,
    pub last_fetched_at: Option<DateTime<Utc>>,
    /// Bumped on every write to the entry. Fetch completions issued
    /// against an older generation are discarded.
    pub generation: u64,
    pub subscriber_count: usize,
}

impl<V> CacheEntry<V> {
    pub fn idle() -> Self {
        Self {
            data: None,
            status: FetchStatus::Idle,
            stale: false,
            error: None,
            last_fetched_at: None,
            generation: 0,
            subscriber_count: 0,
        }
    }

    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    pub fn is_success(&self) -> bool {
        self.status == FetchStatus::Success
    }

    pub fn value(&self) -> Option<&V> {
        self.data.as_ref()
    }

    /// True when a subscriber should trigger a fetch: never fetched,
    /// marked stale, or the last fetch failed.
    pub fn needs_refresh(&self) -> bool {
        match self.status {
            FetchStatus::Idle | FetchStatus::Error => true,
            FetchStatus::Loading => false,
            FetchStatus::Success => self.stale,
        }
    }

    /// True when the entry was fetched successfully within `window` and
    /// has not been invalidated since.
    pub fn is_fresh_within(&self, window: Duration, now: DateTime<Utc>) -> bool {
        if self.status != FetchStatus::Success || self.stale {
            return false;
        }
        match self.last_fetched_at {
            Some(at) => now - at < window,
            None => false,
        }
    }
}

impl<V> Default for CacheEntry<V> {
    fn default() -> Self {
        Self::idle()
    }
}

/// Structural equality ignores the bookkeeping counters: a restored
/// snapshot compares equal to the original even though the generation
/// advanced. Errors compare by identity since failures are not `Eq`.
impl<V: PartialEq> PartialEq for CacheEntry<V> {
    fn eq(&self, other: &Self) -> bool {
        let errors_match = match (&self.error, &other.error) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        };
        self.data == other.data
            && self.status == other.status
            && self.stale == other.stale
            && self.last_fetched_at == other.last_fetched_at
            && errors_match
    }
}
