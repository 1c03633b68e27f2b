//! Traits shared by every cached entity type.

use crate::ids::EntityId;
use crate::resource::Resource;
use std::fmt;

/// A server-backed entity the cache can hold.
///
/// `from_draft` and `with_patch` are pure: they build the speculative
/// entity a mutation shows before the server confirms, and never touch
/// shared state.
pub trait Record: Clone + fmt::Debug + PartialEq + Send + Sync + 'static {
    /// Collection this entity belongs to.
    const RESOURCE: Resource;

    /// Payload for creating a new entity.
    type Draft: Clone + fmt::Debug + Send + Sync + 'static;

    /// Partial payload for updating an existing entity. Fields left `None`
    /// are unchanged.
    type Patch: Clone + fmt::Debug + Send + Sync + 'static;

    fn id(&self) -> EntityId;

    /// Build a provisional entity from a draft. `id` is expected to be a
    /// local id until the server assigns the real one.
    fn from_draft(draft: &Self::Draft, id: EntityId) -> Self;

    /// Copy of the entity with the patch's populated fields applied.
    fn with_patch(&self, patch: &Self::Patch) -> Self;
}

/// Entities ordered inside a parent scope and reorderable by the admin.
pub trait Ordered: Record {
    /// One-based position within the parent scope.
    fn order(&self) -> i64;

    fn with_order(&self, order: i64) -> Self;

    /// Parent the ordering lives under; reorders never cross scopes.
    fn scope(&self) -> EntityId;
}
