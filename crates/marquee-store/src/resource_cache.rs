//! Paired collection and detail stores for one resource.

use crate::key::{KeyPredicate, QueryKey};
use crate::store::{InvalidatedKeys, QueryStore};
use chrono::Duration;
use marquee_core::params::ListParams;
use marquee_core::{EntityId, Page, Record, Resource};

/// Both keyspaces of one resource: collection pages and entity details.
pub struct ResourceCache<T: Record> {
    lists: QueryStore<Page<T>>,
    details: QueryStore<T>,
}

impl<T: Record> ResourceCache<T> {
    pub fn new() -> Self {
        Self {
            lists: QueryStore::new(),
            details: QueryStore::new(),
        }
    }

    pub fn resource(&self) -> Resource {
        T::RESOURCE
    }

    pub fn list_key(params: &ListParams) -> QueryKey {
        QueryKey::collection(T::RESOURCE, params.clone())
    }

    pub fn detail_key(id: EntityId) -> QueryKey {
        QueryKey::detail(T::RESOURCE, id)
    }

    pub fn lists(&self) -> &QueryStore<Page<T>> {
        &self.lists
    }

    pub fn details(&self) -> &QueryStore<T> {
        &self.details
    }

    /// Apply a predicate across both keyspaces.
    pub fn invalidate(&self, predicate: &KeyPredicate) -> InvalidatedKeys {
        let mut keys = self.lists.invalidate(predicate);
        let details = self.details.invalidate(predicate);
        keys.subscribed.extend(details.subscribed);
        keys.unsubscribed.extend(details.unsubscribed);
        keys
    }

    /// Sweep both keyspaces; returns the number of entries removed.
    pub fn sweep(&self, idle_for: Duration) -> usize {
        self.lists.sweep(idle_for) + self.details.sweep(idle_for)
    }
}

impl<T: Record> Clone for ResourceCache<T> {
    fn clone(&self) -> Self {
        Self {
            lists: self.lists.clone(),
            details: self.details.clone(),
        }
    }
}

impl<T: Record> Default for ResourceCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
