//! Keyed cache of query results with subscriber notification.

use crate::entry::{CacheEntry, FetchStatus};
use crate::events::{EntryUpdate, UpdateKind};
use crate::key::{KeyPredicate, QueryKey};
use chrono::{Duration, Utc};
use futures::Stream;
use marquee_core::Result;
use std::collections::{HashMap, VecDeque};
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Subscriber callback, invoked outside the store lock.
pub type UpdateCallback<V> = Arc<dyn Fn(&EntryUpdate<V>) + Send + Sync>;

/// Ties a fetch completion to the entry state the fetch was issued against.
///
/// If the entry is written between `begin_fetch` and `complete_fetch`, the
/// generations no longer match and the completion is discarded, so a slow
/// response can never overwrite newer local state.
#[derive(Debug, Clone)]
pub struct FetchTicket {
    pub key: QueryKey,
    pub generation: u64,
}

/// Keys matched by an invalidation pass, partitioned by subscriber
/// presence. Subscribed keys want an immediate refresh; the rest refresh
/// lazily on next subscription.
#[derive(Debug, Clone, Default)]
pub struct InvalidatedKeys {
    pub subscribed: Vec<QueryKey>,
    pub unsubscribed: Vec<QueryKey>,
}

impl InvalidatedKeys {
    pub fn len(&self) -> usize {
        self.subscribed.len() + self.unsubscribed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribed.is_empty() && self.unsubscribed.is_empty()
    }
}

struct EntryState<V> {
    entry: CacheEntry<V>,
    subscribers: Vec<(u64, UpdateCallback<V>)>,
}

impl<V> EntryState<V> {
    fn with_generation(generation: u64) -> Self {
        let mut entry = CacheEntry::idle();
        entry.generation = generation;
        Self {
            entry,
            subscribers: Vec::new(),
        }
    }

    fn callbacks(&self) -> Vec<UpdateCallback<V>> {
        self.subscribers.iter().map(|(_, cb)| cb.clone()).collect()
    }
}

struct PendingNotice<V> {
    update: EntryUpdate<V>,
    callbacks: Vec<UpdateCallback<V>>,
}

struct StoreInner<V> {
    entries: HashMap<QueryKey, EntryState<V>>,
    /// Store-wide write counter. Generations taken from it stay unique
    /// even when a key is evicted and recreated mid-fetch.
    write_clock: u64,
    queue: VecDeque<PendingNotice<V>>,
    notifying: bool,
    next_subscriber_id: u64,
}

impl<V> StoreInner<V> {
    fn tick(&mut self) -> u64 {
        self.write_clock += 1;
        self.write_clock
    }

    fn state_mut(&mut self, key: &QueryKey) -> &mut EntryState<V> {
        let clock = &mut self.write_clock;
        self.entries.entry(key.clone()).or_insert_with(|| {
            *clock += 1;
            EntryState::with_generation(*clock)
        })
    }

    /// Queue a notice; returns true when the caller must run the drain
    /// loop because no drain is active yet.
    fn queue_notice(&mut self, notice: PendingNotice<V>) -> bool {
        self.queue.push_back(notice);
        if self.notifying {
            false
        } else {
            self.notifying = true;
            true
        }
    }
}

/// Cache of query results keyed by [`QueryKey`].
///
/// All operations are synchronous and never hold the internal lock across
/// a subscriber callback. A callback may call back into the store; the
/// nested notification is queued and delivered after the current one
/// finishes, never recursively.
pub struct QueryStore<V> {
    inner: Arc<Mutex<StoreInner<V>>>,
}

impl<V> Clone for QueryStore<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> Default for QueryStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> QueryStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreInner {
                entries: HashMap::new(),
                write_clock: 0,
                queue: VecDeque::new(),
                notifying: false,
                next_subscriber_id: 0,
            })),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreInner<V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current entry for a key, creating an idle placeholder if absent.
    pub fn read(&self, key: &QueryKey) -> CacheEntry<V> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        inner.state_mut(key).entry.clone()
    }

    /// Current entry without creating a placeholder.
    pub fn peek(&self, key: &QueryKey) -> Option<CacheEntry<V>> {
        self.lock().entries.get(key).map(|state| state.entry.clone())
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.lock().entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    pub fn keys(&self) -> Vec<QueryKey> {
        self.lock().entries.keys().cloned().collect()
    }

    /// Generation of the entry, or zero if the key is not cached.
    pub fn generation(&self, key: &QueryKey) -> u64 {
        self.lock()
            .entries
            .get(key)
            .map(|state| state.entry.generation)
            .unwrap_or(0)
    }

    /// Apply `mutate` to the entry, advance its generation, and notify the
    /// key's subscribers.
    pub fn write(&self, key: &QueryKey, kind: UpdateKind, mutate: impl FnOnce(&mut CacheEntry<V>)) {
        let drain = {
            let mut guard = self.lock();
            let inner = &mut *guard;
            let generation = inner.tick();
            let state = inner.state_mut(key);
            mutate(&mut state.entry);
            state.entry.generation = generation;
            let notice = PendingNotice {
                update: EntryUpdate {
                    key: key.clone(),
                    kind,
                    entry: state.entry.clone(),
                },
                callbacks: state.callbacks(),
            };
            inner.queue_notice(notice)
        };
        if drain {
            self.drain_notices();
        }
    }

    /// Mark a fetch as started. The entry shows `loading` while keeping
    /// whatever data it already has; the generation is left alone so a
    /// quiet fetch completes against the state it started from.
    pub fn begin_fetch(&self, key: &QueryKey) -> FetchTicket {
        let (ticket, drain) = {
            let mut guard = self.lock();
            let inner = &mut *guard;
            let state = inner.state_mut(key);
            state.entry.status = FetchStatus::Loading;
            let ticket = FetchTicket {
                key: key.clone(),
                generation: state.entry.generation,
            };
            let notice = PendingNotice {
                update: EntryUpdate {
                    key: key.clone(),
                    kind: UpdateKind::Loading,
                    entry: state.entry.clone(),
                },
                callbacks: state.callbacks(),
            };
            (ticket, inner.queue_notice(notice))
        };
        if drain {
            self.drain_notices();
        }
        ticket
    }

    /// Fold a fetch result into the entry, unless the key moved on while
    /// the fetch was in flight.
    ///
    /// Returns false when the completion was discarded: the entry is gone,
    /// or its generation advanced past the ticket's.
    pub fn complete_fetch(&self, ticket: &FetchTicket, result: Result<V>) -> bool {
        let drain = {
            let mut guard = self.lock();
            let inner = &mut *guard;
            let generation = inner.tick();
            let Some(state) = inner.entries.get_mut(&ticket.key) else {
                debug!(key = %ticket.key, "Fetch completed for an evicted key");
                return false;
            };
            if state.entry.generation != ticket.generation {
                warn!(
                    key = %ticket.key,
                    ticket = ticket.generation,
                    current = state.entry.generation,
                    "Discarding stale fetch completion"
                );
                // Leave the data alone, but do not stay stuck in loading.
                if state.entry.status == FetchStatus::Loading {
                    state.entry.status = if state.entry.has_data() {
                        FetchStatus::Success
                    } else {
                        FetchStatus::Idle
                    };
                }
                return false;
            }
            let kind = match result {
                Ok(value) => {
                    state.entry.data = Some(value);
                    state.entry.status = FetchStatus::Success;
                    state.entry.stale = false;
                    state.entry.error = None;
                    state.entry.last_fetched_at = Some(Utc::now());
                    UpdateKind::Fetched
                }
                Err(err) => {
                    state.entry.status = FetchStatus::Error;
                    state.entry.error = Some(Arc::new(err));
                    UpdateKind::FetchFailed
                }
            };
            state.entry.generation = generation;
            let notice = PendingNotice {
                update: EntryUpdate {
                    key: ticket.key.clone(),
                    kind,
                    entry: state.entry.clone(),
                },
                callbacks: state.callbacks(),
            };
            inner.queue_notice(notice)
        };
        if drain {
            self.drain_notices();
        }
        true
    }

    /// Mark matching entries stale and advance their generation, so
    /// fetch completions from before the invalidation are discarded.
    /// Idle placeholders with nothing cached are skipped.
    pub fn invalidate(&self, predicate: &KeyPredicate) -> InvalidatedKeys {
        let (result, drain) = {
            let mut guard = self.lock();
            let inner = &mut *guard;
            let keys: Vec<QueryKey> = inner
                .entries
                .keys()
                .filter(|key| predicate.matches(key))
                .cloned()
                .collect();
            let mut result = InvalidatedKeys::default();
            let mut drain = false;
            for key in keys {
                let generation = inner.tick();
                let Some(state) = inner.entries.get_mut(&key) else {
                    continue;
                };
                if state.entry.status == FetchStatus::Idle && !state.entry.has_data() {
                    continue;
                }
                state.entry.stale = true;
                state.entry.generation = generation;
                if state.entry.subscriber_count > 0 {
                    result.subscribed.push(key.clone());
                } else {
                    result.unsubscribed.push(key.clone());
                }
                let notice = PendingNotice {
                    update: EntryUpdate {
                        key,
                        kind: UpdateKind::Invalidated,
                        entry: state.entry.clone(),
                    },
                    callbacks: state.callbacks(),
                };
                drain |= inner.queue_notice(notice);
            }
            if !result.is_empty() {
                debug!(matched = result.len(), "Invalidated cache entries");
            }
            (result, drain)
        };
        if drain {
            self.drain_notices();
        }
        result
    }

    /// Remove an entry outright. Its subscribers receive a final eviction
    /// notice; a later subscribe starts over from an idle placeholder.
    pub fn evict(&self, key: &QueryKey) -> bool {
        let drain = {
            let mut guard = self.lock();
            let inner = &mut *guard;
            let Some(mut state) = inner.entries.remove(key) else {
                return false;
            };
            debug!(key = %key, "Evicted cache entry");
            state.entry.subscriber_count = 0;
            let notice = PendingNotice {
                update: EntryUpdate {
                    key: key.clone(),
                    kind: UpdateKind::Evicted,
                    entry: state.entry.clone(),
                },
                callbacks: state.callbacks(),
            };
            inner.queue_notice(notice)
        };
        if drain {
            self.drain_notices();
        }
        true
    }

    /// Write a snapshot back verbatim, or remove the entry if the snapshot
    /// says it did not exist. The generation still advances; the
    /// structural state is restored exactly.
    pub fn restore(&self, key: &QueryKey, snapshot: Option<CacheEntry<V>>) {
        match snapshot {
            Some(snap) => self.write(key, UpdateKind::RolledBack, move |entry| {
                entry.data = snap.data;
                entry.status = snap.status;
                entry.stale = snap.stale;
                entry.error = snap.error;
                entry.last_fetched_at = snap.last_fetched_at;
            }),
            None => {
                self.evict(key);
            }
        }
    }

    /// Register a subscriber for one key. Registration does not replay the
    /// current entry; `read` it first. The guard unsubscribes on drop.
    pub fn subscribe(
        &self,
        key: &QueryKey,
        callback: impl Fn(&EntryUpdate<V>) + Send + Sync + 'static,
    ) -> SubscriptionGuard<V> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        let id = inner.next_subscriber_id;
        inner.next_subscriber_id += 1;
        let state = inner.state_mut(key);
        state.subscribers.push((id, Arc::new(callback)));
        state.entry.subscriber_count = state.subscribers.len();
        SubscriptionGuard {
            inner: Arc::downgrade(&self.inner),
            key: key.clone(),
            id,
        }
    }

    /// The same feed as [`subscribe`](Self::subscribe), exposed as a
    /// stream.
    pub fn updates(&self, key: &QueryKey) -> EntryUpdates<V> {
        let (tx, rx) = mpsc::unbounded_channel();
        let guard = self.subscribe(key, move |update| {
            let _ = tx.send(update.clone());
        });
        EntryUpdates { _guard: guard, rx }
    }

    /// Drop zero-subscriber entries whose last fetch is older than
    /// `idle_for`. Entries with a fetch in flight are kept. Returns how
    /// many entries were removed.
    pub fn sweep(&self, idle_for: Duration) -> usize {
        let now = Utc::now();
        let mut guard = self.lock();
        let before = guard.entries.len();
        guard.entries.retain(|_, state| {
            if !state.subscribers.is_empty() || state.entry.status == FetchStatus::Loading {
                return true;
            }
            match state.entry.last_fetched_at {
                Some(at) => now - at < idle_for,
                None => false,
            }
        });
        let removed = before - guard.entries.len();
        if removed > 0 {
            debug!(removed, "Swept idle cache entries");
        }
        removed
    }

    /// Deliver queued notices until the queue is empty. Runs on whichever
    /// thread queued first; callbacks run without the lock held.
    fn drain_notices(&self) {
        loop {
            let notice = {
                let mut inner = self.lock();
                match inner.queue.pop_front() {
                    Some(notice) => notice,
                    None => {
                        inner.notifying = false;
                        return;
                    }
                }
            };
            for callback in &notice.callbacks {
                callback(&notice.update);
            }
        }
    }
}

/// Active subscription to one key; unsubscribes when dropped.
pub struct SubscriptionGuard<V> {
    inner: Weak<Mutex<StoreInner<V>>>,
    key: QueryKey,
    id: u64,
}

impl<V> SubscriptionGuard<V> {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }
}

impl<V> Drop for SubscriptionGuard<V> {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            let mut inner = inner.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(state) = inner.entries.get_mut(&self.key) {
                state.subscribers.retain(|(id, _)| *id != self.id);
                state.entry.subscriber_count = state.subscribers.len();
            }
        }
    }
}

/// Stream of entry updates for one key. Dropping the stream unsubscribes.
pub struct EntryUpdates<V> {
    _guard: SubscriptionGuard<V>,
    rx: mpsc::UnboundedReceiver<EntryUpdate<V>>,
}

impl<V> Stream for EntryUpdates<V> {
    type Item = EntryUpdate<V>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}
