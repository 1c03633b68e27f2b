//! Pre-mutation snapshots for rollback.

use marquee_core::{Page, Record};
use marquee_store::{CacheEntry, QueryKey, ResourceCache};

/// Verbatim pre-mutation state of every key a mutation targets.
///
/// Captured before the optimistic patch runs, and the single source of
/// truth for rollback. Restoring writes every captured entry back exactly
/// and removes entries that did not exist, all targets or none.
pub struct Snapshot<T: Record> {
    pages: Vec<(QueryKey, Option<CacheEntry<Page<T>>>)>,
    items: Vec<(QueryKey, Option<CacheEntry<T>>)>,
}

impl<T: Record> Snapshot<T> {
    pub fn capture(cache: &ResourceCache<T>, targets: &[QueryKey]) -> Self {
        let mut pages = Vec::new();
        let mut items = Vec::new();
        for key in targets {
            if key.is_collection() {
                pages.push((key.clone(), cache.lists().peek(key)));
            } else {
                items.push((key.clone(), cache.details().peek(key)));
            }
        }
        Self { pages, items }
    }

    /// Write every captured entry back.
    pub fn restore(self, cache: &ResourceCache<T>) {
        for (key, snapshot) in self.pages {
            cache.lists().restore(&key, snapshot);
        }
        for (key, snapshot) in self.items {
            cache.details().restore(&key, snapshot);
        }
    }

    pub fn len(&self) -> usize {
        self.pages.len() + self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty() && self.items.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &QueryKey> {
        self.pages
            .iter()
            .map(|(key, _)| key)
            .chain(self.items.iter().map(|(key, _)| key))
    }
}
