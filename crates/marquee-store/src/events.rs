//! Subscriber notification payloads.

use crate::entry::CacheEntry;
use crate::key::QueryKey;
use serde::{Deserialize, Serialize};

/// Why a subscriber is being notified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateKind {
    /// A fetch started for the key.
    Loading,
    /// A fetch completed and replaced the data.
    Fetched,
    /// A fetch failed; previous data, if any, is still present.
    FetchFailed,
    /// A speculative local edit was applied.
    Patched,
    /// The server confirmed a mutation and the entry now holds
    /// authoritative data.
    Committed,
    /// A failed mutation restored the entry to its pre-mutation state.
    RolledBack,
    /// The entry was marked stale and awaits a refresh.
    Invalidated,
    /// The entry was removed; this is the final notification for it.
    Evicted,
}

/// One notification delivered to entry subscribers.
#[derive(Debug, Clone)]
pub struct EntryUpdate<V> {
    pub key: QueryKey,
    pub kind: UpdateKind,
    pub entry: CacheEntry<V>,
}
