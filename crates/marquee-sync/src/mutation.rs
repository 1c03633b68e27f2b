//! Declarative mutation specifications.

use crate::patch::PatchOp;
use crate::reorder::ReorderPlan;
use marquee_core::params::ListParams;
use marquee_core::{EntityId, MutationId, OrderMapping, Record};
use marquee_store::{QueryKey, ResourceCache};

/// What a mutation asks the server to do.
#[derive(Debug, Clone)]
pub enum MutationKind<T: Record> {
    /// Create from a draft. `provisional` is the local stand-in shown
    /// until the server assigns the real entity.
    Create { draft: T::Draft, provisional: T },
    Update { id: EntityId, patch: T::Patch },
    Delete { id: EntityId },
    /// Persist `mapping`; `items` is the already-resolved row order shown
    /// optimistically.
    Reorder { mapping: OrderMapping, items: Vec<T> },
}

/// One mutation attempt: the server call to make, the cached views it
/// speculatively edits, and (derived) the patch applied to them.
#[derive(Debug, Clone)]
pub struct MutationSpec<T: Record> {
    pub id: MutationId,
    pub kind: MutationKind<T>,
    pub targets: Vec<QueryKey>,
}

impl<T: Record> MutationSpec<T> {
    /// Create mutation: a provisional entity under a fresh local id shows
    /// up in the given collection view immediately.
    pub fn create(params: &ListParams, draft: T::Draft) -> Self {
        let provisional = T::from_draft(&draft, EntityId::next_local());
        Self {
            id: MutationId::new(),
            kind: MutationKind::Create { draft, provisional },
            targets: vec![ResourceCache::<T>::list_key(params)],
        }
    }

    /// Update mutation targeting the collection view and the detail entry.
    pub fn update(params: &ListParams, id: EntityId, patch: T::Patch) -> Self {
        Self {
            id: MutationId::new(),
            kind: MutationKind::Update { id, patch },
            targets: vec![
                ResourceCache::<T>::list_key(params),
                ResourceCache::<T>::detail_key(id),
            ],
        }
    }

    /// Delete mutation targeting the collection view and the detail entry.
    pub fn delete(params: &ListParams, id: EntityId) -> Self {
        Self {
            id: MutationId::new(),
            kind: MutationKind::Delete { id },
            targets: vec![
                ResourceCache::<T>::list_key(params),
                ResourceCache::<T>::detail_key(id),
            ],
        }
    }

    /// Reorder mutation built from a resolved plan.
    pub fn reorder(params: &ListParams, plan: ReorderPlan<T>) -> Self {
        Self {
            id: MutationId::new(),
            kind: MutationKind::Reorder {
                mapping: plan.mapping,
                items: plan.items,
            },
            targets: vec![ResourceCache::<T>::list_key(params)],
        }
    }

    /// Add further cached views the optimistic patch should cover, for
    /// callers that know the entity is visible elsewhere.
    pub fn also_targeting(mut self, keys: impl IntoIterator<Item = QueryKey>) -> Self {
        self.targets.extend(keys);
        self
    }

    /// The optimistic patch this mutation applies to its targets.
    pub fn patch_op(&self) -> PatchOp<T> {
        match &self.kind {
            MutationKind::Create { provisional, .. } => PatchOp::Insert {
                entity: provisional.clone(),
            },
            MutationKind::Update { id, patch } => PatchOp::Update {
                id: *id,
                patch: patch.clone(),
            },
            MutationKind::Delete { id } => PatchOp::Remove { id: *id },
            MutationKind::Reorder { items, .. } => PatchOp::Replace {
                items: items.clone(),
            },
        }
    }

    /// The entity the server call is about, when there is a single one.
    /// For creates this is the provisional local id.
    pub fn subject(&self) -> Option<EntityId> {
        match &self.kind {
            MutationKind::Create { provisional, .. } => Some(provisional.id()),
            MutationKind::Update { id, .. } | MutationKind::Delete { id } => Some(*id),
            MutationKind::Reorder { .. } => None,
        }
    }
}
