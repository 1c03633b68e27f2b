//! Event type entities.

use crate::ids::EntityId;
use crate::record::Record;
use crate::resource::Resource;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A category of event the platform hosts, such as a conference or gala.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EventType {
    pub id: EntityId,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating an event type.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EventTypeDraft {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

/// Partial update payload; `None` fields are unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct EventTypePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

impl Record for EventType {
    const RESOURCE: Resource = Resource::EventTypes;
    type Draft = EventTypeDraft;
    type Patch = EventTypePatch;

    fn id(&self) -> EntityId {
        self.id
    }

    fn from_draft(draft: &Self::Draft, id: EntityId) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: draft.name.clone(),
            description: draft.description.clone(),
            is_active: draft.is_active,
            created_at: now,
            updated_at: now,
        }
    }

    fn with_patch(&self, patch: &Self::Patch) -> Self {
        let mut next = self.clone();
        if let Some(name) = &patch.name {
            next.name = name.clone();
        }
        if let Some(description) = &patch.description {
            next.description = Some(description.clone());
        }
        if let Some(is_active) = patch.is_active {
            next.is_active = is_active;
        }
        next.updated_at = Utc::now();
        next
    }
}
