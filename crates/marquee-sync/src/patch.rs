//! Optimistic patches as explicit, replayable values.

use marquee_core::{EntityId, Page, Record};

/// A speculative local edit applied ahead of server confirmation.
///
/// Patches are plain values and applying one is a pure function, so the
/// same patch can be applied to several cached views and reasoned about
/// without a live cache.
#[derive(Debug, Clone)]
pub enum PatchOp<T: Record> {
    /// Append a provisional entity (carrying a local id) to a collection.
    Insert { entity: T },
    /// Apply a partial payload to one entity wherever it appears.
    Update { id: EntityId, patch: T::Patch },
    /// Remove one entity wherever it appears.
    Remove { id: EntityId },
    /// Replace a collection's rows wholesale; reorders resolve to this.
    Replace { items: Vec<T> },
}

impl<T: Record> PatchOp<T> {
    /// Apply the patch to a collection page, keeping the page's counters
    /// consistent with the visible rows.
    pub fn apply_to_page(&self, page: &Page<T>) -> Page<T> {
        let mut next = page.clone();
        match self {
            PatchOp::Insert { entity } => {
                next.items.push(entity.clone());
                next.total_count += 1;
            }
            PatchOp::Update { id, patch } => {
                for item in &mut next.items {
                    if item.id() == *id {
                        *item = item.with_patch(patch);
                    }
                }
            }
            PatchOp::Remove { id } => {
                let before = next.items.len();
                next.items.retain(|item| item.id() != *id);
                let removed = (before - next.items.len()) as u64;
                next.total_count = next.total_count.saturating_sub(removed);
            }
            PatchOp::Replace { items } => {
                next.items = items.clone();
            }
        }
        next
    }

    /// Apply the patch to a detail entity. `None` means the entity is gone
    /// and its entry should be evicted.
    pub fn apply_to_item(&self, item: &T) -> Option<T> {
        match self {
            PatchOp::Update { id, patch } if item.id() == *id => Some(item.with_patch(patch)),
            PatchOp::Remove { id } if item.id() == *id => None,
            _ => Some(item.clone()),
        }
    }
}
