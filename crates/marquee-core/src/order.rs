//! Order mappings for reorderable collections.

use crate::ids::EntityId;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Entity-to-position map persisted after a reorder.
///
/// Positions are one-based and dense over the rows the reorder touched.
/// Rows absent from the mapping keep their stored order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct OrderMapping(BTreeMap<EntityId, i64>);

impl OrderMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, id: EntityId, position: i64) {
        self.0.insert(id, position);
    }

    pub fn position(&self, id: EntityId) -> Option<i64> {
        self.0.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, i64)> + '_ {
        self.0.iter().map(|(id, position)| (*id, *position))
    }
}

impl FromIterator<(EntityId, i64)> for OrderMapping {
    fn from_iter<I: IntoIterator<Item = (EntityId, i64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
