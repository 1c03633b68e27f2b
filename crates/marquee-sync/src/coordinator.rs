//! Mutation coordination: optimistic apply, server call, reconcile on
//! success, roll back on failure.

use crate::invalidation::InvalidationPlanner;
use crate::mutation::{MutationKind, MutationSpec};
use crate::patch::PatchOp;
use crate::registry::CacheRegistry;
use crate::snapshot::Snapshot;
use chrono::Utc;
use marquee_core::{EntityId, Page, Record, Result, ResourceClient};
use marquee_store::{FetchStatus, QueryKey, ResourceCache, UpdateKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Lifecycle of a mutation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationPhase {
    Idle,
    /// Optimistic patch being applied to the targets.
    Applying,
    /// Patch visible locally; the server call is in flight.
    AwaitingServer,
    Committed,
    RolledBack,
}

/// Runs mutations against one resource: applies the optimistic patch,
/// issues the server call, then either reconciles the confirmed entity
/// into the cache or restores the pre-mutation snapshot.
pub struct MutationCoordinator<T: Record> {
    client: Arc<dyn ResourceClient<T>>,
    cache: ResourceCache<T>,
    registry: Arc<CacheRegistry>,
    planner: InvalidationPlanner,
}

impl<T: Record> MutationCoordinator<T> {
    pub fn new(
        client: Arc<dyn ResourceClient<T>>,
        cache: ResourceCache<T>,
        registry: Arc<CacheRegistry>,
    ) -> Self {
        Self {
            client,
            cache,
            registry,
            planner: InvalidationPlanner::new(),
        }
    }

    /// Run one mutation attempt to completion.
    ///
    /// Returns the confirmed entity for creates and updates. On failure
    /// every target is restored to its pre-mutation snapshot before the
    /// error is handed back, and the error keeps the server's taxonomy so
    /// callers can tell validation problems from lost connectivity.
    pub async fn run(&self, spec: MutationSpec<T>) -> Result<Option<T>> {
        let patch = spec.patch_op();
        debug!(
            mutation = %spec.id,
            resource = %T::RESOURCE,
            phase = ?MutationPhase::Applying,
            targets = spec.targets.len(),
            "Applying optimistic patch"
        );
        let snapshot = Snapshot::capture(&self.cache, &spec.targets);
        self.apply_patch(&spec.targets, &patch);

        debug!(
            mutation = %spec.id,
            resource = %T::RESOURCE,
            phase = ?MutationPhase::AwaitingServer,
            "Issuing server call"
        );
        match self.call_server(&spec).await {
            Ok(confirmed) => {
                self.reconcile(&spec, confirmed.as_ref());
                // Plan against the confirmed id: for creates the mutation
                // only knows the provisional one.
                let subject = confirmed
                    .as_ref()
                    .map(Record::id)
                    .or_else(|| spec.subject());
                let plan = self.planner.after_commit(T::RESOURCE, subject);
                self.registry.apply(&plan).await;
                info!(
                    mutation = %spec.id,
                    resource = %T::RESOURCE,
                    phase = ?MutationPhase::Committed,
                    "Mutation committed"
                );
                Ok(confirmed)
            }
            Err(err) => {
                snapshot.restore(&self.cache);
                warn!(
                    mutation = %spec.id,
                    resource = %T::RESOURCE,
                    phase = ?MutationPhase::RolledBack,
                    error = %err,
                    "Mutation failed, snapshot restored"
                );
                if let Some(plan) =
                    self.planner
                        .after_failure(T::RESOURCE, spec.subject(), &err)
                {
                    self.registry.apply(&plan).await;
                }
                Err(err)
            }
        }
    }

    /// Apply the patch to every target that has data. Targets with nothing
    /// cached are left alone; there is nothing to speculate over and the
    /// next fetch returns confirmed state anyway.
    fn apply_patch(&self, targets: &[QueryKey], patch: &PatchOp<T>) {
        for key in targets {
            if key.is_collection() {
                let cached = self
                    .cache
                    .lists()
                    .peek(key)
                    .is_some_and(|entry| entry.has_data());
                if !cached {
                    continue;
                }
                self.cache.lists().write(key, UpdateKind::Patched, |entry| {
                    if let Some(page) = &entry.data {
                        entry.data = Some(patch.apply_to_page(page));
                    }
                });
            } else {
                let Some(current) = self.cache.details().peek(key).and_then(|entry| entry.data)
                else {
                    continue;
                };
                match patch.apply_to_item(&current) {
                    Some(next) => {
                        self.cache.details().write(key, UpdateKind::Patched, |entry| {
                            entry.data = Some(next);
                        });
                    }
                    None => {
                        self.cache.details().evict(key);
                    }
                }
            }
        }
    }

    async fn call_server(&self, spec: &MutationSpec<T>) -> Result<Option<T>> {
        match &spec.kind {
            MutationKind::Create { draft, .. } => self.client.create(draft).await.map(Some),
            MutationKind::Update { id, patch } => self.client.update(*id, patch).await.map(Some),
            MutationKind::Delete { id } => self.client.delete(*id).await.map(|_| None),
            MutationKind::Reorder { mapping, .. } => {
                self.client.reorder(mapping).await.map(|_| None)
            }
        }
    }

    /// Fold the server's reply into the cache. Detail entries become
    /// authoritative; for creates, the provisional row is replaced by the
    /// confirmed entity wherever the optimistic insert put it.
    fn reconcile(&self, spec: &MutationSpec<T>, confirmed: Option<&T>) {
        match (&spec.kind, confirmed) {
            (MutationKind::Create { provisional, .. }, Some(entity)) => {
                let local_id = provisional.id();
                for key in &spec.targets {
                    if !key.is_collection() {
                        continue;
                    }
                    self.cache.lists().write(key, UpdateKind::Committed, |entry| {
                        if let Some(page) = &mut entry.data {
                            replace_or_append(page, local_id, entity);
                        }
                    });
                }
                self.write_detail(entity);
            }
            (MutationKind::Update { .. }, Some(entity)) => {
                self.write_detail(entity);
            }
            (MutationKind::Delete { id }, _) => {
                self.cache
                    .details()
                    .evict(&ResourceCache::<T>::detail_key(*id));
            }
            _ => {}
        }
    }

    /// Write a confirmed entity through to its detail entry.
    fn write_detail(&self, entity: &T) {
        let key = ResourceCache::<T>::detail_key(entity.id());
        let entity = entity.clone();
        self.cache.details().write(&key, UpdateKind::Committed, move |entry| {
            entry.data = Some(entity);
            entry.status = FetchStatus::Success;
            entry.stale = false;
            entry.error = None;
            entry.last_fetched_at = Some(Utc::now());
        });
    }
}

/// Swap the provisional row for the confirmed entity. If a refetch
/// replaced the page while the call was in flight the provisional row may
/// be gone; the confirmed entity still has to appear, unless the refetched
/// page already carries it.
fn replace_or_append<T: Record>(page: &mut Page<T>, local_id: EntityId, entity: &T) {
    if let Some(slot) = page.items.iter_mut().find(|item| item.id() == local_id) {
        *slot = entity.clone();
    } else if page.items.iter().all(|item| item.id() != entity.id()) {
        page.items.push(entity.clone());
        page.total_count += 1;
    }
}
