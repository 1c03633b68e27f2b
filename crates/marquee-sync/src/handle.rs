//! Per-resource consumer surface.

use crate::coordinator::MutationCoordinator;
use crate::mutation::MutationSpec;
use crate::refetch::Refetcher;
use crate::registry::{CacheRegistry, InvalidationTarget};
use crate::reorder;
use async_trait::async_trait;
use marquee_core::params::ListParams;
use marquee_core::{
    EntityId, Error, Ordered, Page, Record, Resource, ResourceClient, Result, SyncConfig,
};
use marquee_store::{
    CacheEntry, EntryUpdate, EntryUpdates, KeyPredicate, QueryKey, ResourceCache,
    SubscriptionGuard,
};
use std::sync::Arc;
use tracing::debug;

use crate::invalidation::RefreshMode;

/// Everything a screen needs for one resource: cached reads, fetches,
/// subscriptions, and optimistic mutations.
///
/// Handles are cheap to share behind their `Arc`; all state lives in the
/// cache and in the refetcher's dedup set.
pub struct ResourceHandle<T: Record> {
    cache: ResourceCache<T>,
    client: Arc<dyn ResourceClient<T>>,
    refetcher: Arc<Refetcher<T>>,
    coordinator: MutationCoordinator<T>,
    config: SyncConfig,
}

impl<T: Record> ResourceHandle<T> {
    pub fn new(
        client: Arc<dyn ResourceClient<T>>,
        registry: Arc<CacheRegistry>,
        config: SyncConfig,
    ) -> Arc<Self> {
        let cache = ResourceCache::new();
        let refetcher = Arc::new(Refetcher::new(
            Arc::clone(&client),
            cache.clone(),
            config.debounce(),
        ));
        let coordinator = MutationCoordinator::new(Arc::clone(&client), cache.clone(), registry);
        Arc::new(Self {
            cache,
            client,
            refetcher,
            coordinator,
            config,
        })
    }

    pub fn resource(&self) -> Resource {
        T::RESOURCE
    }

    /// Direct access to the underlying stores, mainly for inspection.
    pub fn cache(&self) -> &ResourceCache<T> {
        &self.cache
    }

    pub fn list_key(&self, params: &ListParams) -> QueryKey {
        ResourceCache::<T>::list_key(params)
    }

    pub fn detail_key(&self, id: EntityId) -> QueryKey {
        ResourceCache::<T>::detail_key(id)
    }

    /// First page under the configured page size.
    pub fn first_page(&self) -> ListParams {
        ListParams::page(1).with_page_size(self.config.default_page_size)
    }

    /// Cached collection entry without fetching.
    pub fn read_list(&self, params: &ListParams) -> CacheEntry<Page<T>> {
        self.cache.lists().read(&self.list_key(params))
    }

    /// Cached detail entry without fetching.
    pub fn read_detail(&self, id: EntityId) -> CacheEntry<T> {
        self.cache.details().read(&self.detail_key(id))
    }

    /// The page for `params`, fetching only when nothing usable is cached.
    /// Stale data comes back immediately and refreshes in the background.
    pub async fn list(&self, params: &ListParams) -> Result<Page<T>> {
        let key = self.list_key(params);
        let entry = self.cache.lists().read(&key);
        if let Some(page) = entry.data {
            if entry.stale {
                self.refetcher.spawn_refresh(key);
            }
            return Ok(page);
        }
        let ticket = self.cache.lists().begin_fetch(&key);
        let result = self.client.list(params).await;
        self.cache.lists().complete_fetch(&ticket, result.clone());
        result
    }

    /// The entity for `id`, fetching only when nothing usable is cached.
    pub async fn detail(&self, id: EntityId) -> Result<T> {
        let key = self.detail_key(id);
        let entry = self.cache.details().read(&key);
        if let Some(item) = entry.data {
            if entry.stale {
                self.refetcher.spawn_refresh(key);
            }
            return Ok(item);
        }
        let ticket = self.cache.details().begin_fetch(&key);
        let result = self.client.get(id).await;
        self.cache.details().complete_fetch(&ticket, result.clone());
        result
    }

    /// Subscribe to one collection view. Entries that were never fetched,
    /// are stale, or errored are refreshed in the background.
    pub fn subscribe_list(
        &self,
        params: &ListParams,
        callback: impl Fn(&EntryUpdate<Page<T>>) + Send + Sync + 'static,
    ) -> SubscriptionGuard<Page<T>> {
        let key = self.list_key(params);
        let guard = self.cache.lists().subscribe(&key, callback);
        if self.cache.lists().read(&key).needs_refresh() {
            self.refetcher.spawn_refresh(key);
        }
        guard
    }

    /// Subscribe to one detail view, refreshing like
    /// [`subscribe_list`](Self::subscribe_list).
    pub fn subscribe_detail(
        &self,
        id: EntityId,
        callback: impl Fn(&EntryUpdate<T>) + Send + Sync + 'static,
    ) -> SubscriptionGuard<T> {
        let key = self.detail_key(id);
        let guard = self.cache.details().subscribe(&key, callback);
        if self.cache.details().read(&key).needs_refresh() {
            self.refetcher.spawn_refresh(key);
        }
        guard
    }

    /// Stream of updates for one collection view, refreshing on
    /// subscription like [`subscribe_list`](Self::subscribe_list).
    pub fn watch_list(&self, params: &ListParams) -> EntryUpdates<Page<T>> {
        let key = self.list_key(params);
        let updates = self.cache.lists().updates(&key);
        if self.cache.lists().read(&key).needs_refresh() {
            self.refetcher.spawn_refresh(key);
        }
        updates
    }

    /// Stream of updates for one detail view.
    pub fn watch_detail(&self, id: EntityId) -> EntryUpdates<T> {
        let key = self.detail_key(id);
        let updates = self.cache.details().updates(&key);
        if self.cache.details().read(&key).needs_refresh() {
            self.refetcher.spawn_refresh(key);
        }
        updates
    }

    /// Create an entity, showing it in the `params` view immediately.
    pub async fn create(&self, params: &ListParams, draft: T::Draft) -> Result<T> {
        match self.coordinator.run(MutationSpec::create(params, draft)).await? {
            Some(entity) => Ok(entity),
            None => Err(Error::Internal("Create confirmed without an entity".into())),
        }
    }

    /// Update an entity, patching the `params` view and the detail entry
    /// immediately.
    pub async fn update(&self, params: &ListParams, id: EntityId, patch: T::Patch) -> Result<T> {
        match self
            .coordinator
            .run(MutationSpec::update(params, id, patch))
            .await?
        {
            Some(entity) => Ok(entity),
            None => Err(Error::Internal("Update confirmed without an entity".into())),
        }
    }

    /// Delete an entity, removing it from the `params` view immediately.
    pub async fn delete(&self, params: &ListParams, id: EntityId) -> Result<()> {
        self.coordinator
            .run(MutationSpec::delete(params, id))
            .await
            .map(|_| ())
    }

    /// Run a caller-assembled mutation, for screens that target more
    /// views than the convenience methods assume.
    pub async fn mutate(&self, spec: MutationSpec<T>) -> Result<Option<T>> {
        self.coordinator.run(spec).await
    }

    /// Evict entries nobody has touched within the configured window.
    pub fn sweep(&self) -> usize {
        self.cache.sweep(self.config.evict_after())
    }
}

impl<T: Ordered> ResourceHandle<T> {
    /// Move the row at `source` to `destination` within the cached page
    /// for `params`, then persist the dense ordering. Equal indices are a
    /// no-op and nothing reaches the server.
    pub async fn reorder(
        &self,
        params: &ListParams,
        source: usize,
        destination: usize,
    ) -> Result<()> {
        let key = self.list_key(params);
        let entry = self.cache.lists().read(&key);
        let Some(page) = entry.data else {
            return Err(Error::InvalidReorder(format!("No cached page for {key}")));
        };
        let Some(plan) = reorder::resolve_move(&page.items, source, destination)? else {
            debug!(resource = %T::RESOURCE, source, destination, "Reorder is a no-op");
            return Ok(());
        };
        self.coordinator
            .run(MutationSpec::reorder(params, plan))
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl<T: Record> InvalidationTarget for ResourceHandle<T> {
    fn resource(&self) -> Resource {
        T::RESOURCE
    }

    async fn invalidate(&self, predicate: &KeyPredicate, mode: RefreshMode) {
        let keys = self.cache.invalidate(predicate);
        match mode {
            RefreshMode::MarkStale => {
                // Only views someone is watching refresh now; the rest
                // refresh lazily when next subscribed.
                for key in keys.subscribed {
                    self.refetcher.spawn_refresh(key);
                }
            }
            RefreshMode::ForceRefetch => {
                for key in keys.subscribed.into_iter().chain(keys.unsubscribed) {
                    self.refetcher.spawn_force_refresh(key);
                }
            }
        }
    }
}
