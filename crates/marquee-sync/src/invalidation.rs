//! Invalidation planning: which cached views a settled mutation leaves
//! untrustworthy.

use marquee_core::{EntityId, Error, Resource};
use marquee_store::KeyPredicate;

/// How urgently invalidated entries must be refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// Mark stale. Subscribed entries refresh in the background; the rest
    /// refresh lazily on their next subscription.
    MarkStale,
    /// Refetch everything matched right away, bypassing deduplication.
    /// Used when cached data is known wrong, not merely old.
    ForceRefetch,
}

/// Keys to refresh after a mutation settles, produced by the planner and
/// routed through the cache registry.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidationPlan {
    pub mode: RefreshMode,
    pub predicates: Vec<KeyPredicate>,
}

impl InvalidationPlan {
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Resources the plan touches, deduplicated, in predicate order.
    pub fn resources(&self) -> Vec<Resource> {
        let mut seen = Vec::new();
        for predicate in &self.predicates {
            let resource = predicate.resource();
            if !seen.contains(&resource) {
                seen.push(resource);
            }
        }
        seen
    }
}

/// Maps a settled mutation to the cache entries it leaves stale.
///
/// The rules deliberately over-invalidate: a changed entity cannot be
/// cheaply checked against every collection's filters and pagination, so
/// all collection views of the resource (and of its dependents) are
/// refreshed rather than risking a stale row somewhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvalidationPlanner;

impl InvalidationPlanner {
    pub fn new() -> Self {
        Self
    }

    /// Plan for a committed mutation on `resource`. `subject` is the
    /// confirmed entity id, when the mutation was about a single entity.
    pub fn after_commit(&self, resource: Resource, subject: Option<EntityId>) -> InvalidationPlan {
        let mut predicates = vec![KeyPredicate::Collections(resource)];
        if let Some(id) = subject {
            if !id.is_local() {
                predicates.push(KeyPredicate::Detail { resource, id });
            }
        }
        for dependent in resource.dependents() {
            predicates.push(KeyPredicate::Collections(*dependent));
        }
        InvalidationPlan {
            mode: RefreshMode::MarkStale,
            predicates,
        }
    }

    /// Plan for a failed mutation, when the failure says local state is
    /// wrong beyond what rollback repairs. Transport and validation
    /// failures need no plan: the snapshot restore already settled things.
    pub fn after_failure(
        &self,
        resource: Resource,
        subject: Option<EntityId>,
        error: &Error,
    ) -> Option<InvalidationPlan> {
        let mode = if error.is_conflict() {
            RefreshMode::ForceRefetch
        } else if error.is_not_found() {
            RefreshMode::MarkStale
        } else {
            return None;
        };
        let mut predicates = vec![KeyPredicate::Collections(resource)];
        if let Some(id) = subject {
            if !id.is_local() {
                predicates.push(KeyPredicate::Detail { resource, id });
            }
        }
        Some(InvalidationPlan { mode, predicates })
    }
}
