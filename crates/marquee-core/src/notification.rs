//! Notification entities.

use crate::ids::EntityId;
use crate::record::Record;
use crate::resource::Resource;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A message shown to admins in the console's notification feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Notification {
    pub id: EntityId,
    pub title: String,
    pub body: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NotificationDraft {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct NotificationPatch {
    pub title: Option<String>,
    pub body: Option<String>,
    pub is_read: Option<bool>,
}

impl Record for Notification {
    const RESOURCE: Resource = Resource::Notifications;
    type Draft = NotificationDraft;
    type Patch = NotificationPatch;

    fn id(&self) -> EntityId {
        self.id
    }

    fn from_draft(draft: &Self::Draft, id: EntityId) -> Self {
        Self {
            id,
            title: draft.title.clone(),
            body: draft.body.clone(),
            is_read: false,
            created_at: Utc::now(),
        }
    }

    fn with_patch(&self, patch: &Self::Patch) -> Self {
        let mut next = self.clone();
        if let Some(title) = &patch.title {
            next.title = title.clone();
        }
        if let Some(body) = &patch.body {
            next.body = body.clone();
        }
        if let Some(is_read) = patch.is_read {
            next.is_read = is_read;
        }
        next
    }
}
