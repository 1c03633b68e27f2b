//! Questionnaires, their fields, and submitted responses.

use crate::ids::EntityId;
use crate::record::{Ordered, Record};
use crate::resource::Resource;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A form attached to an event type, filled in by attendees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Questionnaire {
    pub id: EntityId,
    pub event_type_id: EntityId,
    pub name: String,
    pub description: Option<String>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QuestionnaireDraft {
    pub event_type_id: EntityId,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct QuestionnairePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_published: Option<bool>,
}

impl Record for Questionnaire {
    const RESOURCE: Resource = Resource::Questionnaires;
    type Draft = QuestionnaireDraft;
    type Patch = QuestionnairePatch;

    fn id(&self) -> EntityId {
        self.id
    }

    fn from_draft(draft: &Self::Draft, id: EntityId) -> Self {
        let now = Utc::now();
        Self {
            id,
            event_type_id: draft.event_type_id,
            name: draft.name.clone(),
            description: draft.description.clone(),
            is_published: false,
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
        if let Some(is_published) = patch.is_published {
            next.is_published = is_published;
        }
        next.updated_at = Utc::now();
        next
    }
}

/// Input widget a questionnaire field renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Number,
    Checkbox,
    Select,
    Date,
}

/// One question within a questionnaire, positioned by `order`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QuestionnaireField {
    pub id: EntityId,
    pub questionnaire_id: EntityId,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
    /// One-based position within the parent questionnaire.
    pub order: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QuestionnaireFieldDraft {
    pub questionnaire_id: EntityId,
    pub label: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    pub order: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct QuestionnaireFieldPatch {
    pub label: Option<String>,
    pub kind: Option<FieldKind>,
    pub required: Option<bool>,
    pub order: Option<i64>,
}

impl Record for QuestionnaireField {
    const RESOURCE: Resource = Resource::QuestionnaireFields;
    type Draft = QuestionnaireFieldDraft;
    type Patch = QuestionnaireFieldPatch;

    fn id(&self) -> EntityId {
        self.id
    }

    fn from_draft(draft: &Self::Draft, id: EntityId) -> Self {
        Self {
            id,
            questionnaire_id: draft.questionnaire_id,
            label: draft.label.clone(),
            kind: draft.kind,
            required: draft.required,
            order: draft.order,
        }
    }

    fn with_patch(&self, patch: &Self::Patch) -> Self {
        let mut next = self.clone();
        if let Some(label) = &patch.label {
            next.label = label.clone();
        }
        if let Some(kind) = patch.kind {
            next.kind = kind;
        }
        if let Some(required) = patch.required {
            next.required = required;
        }
        if let Some(order) = patch.order {
            next.order = order;
        }
        next
    }
}

impl Ordered for QuestionnaireField {
    fn order(&self) -> i64 {
        self.order
    }

    fn with_order(&self, order: i64) -> Self {
        let mut next = self.clone();
        next.order = order;
        next
    }

    fn scope(&self) -> EntityId {
        self.questionnaire_id
    }
}

/// A single answer inside a submitted response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ResponseAnswer {
    pub field_id: EntityId,
    pub value: String,
}

/// One submission of a questionnaire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QuestionnaireResponse {
    pub id: EntityId,
    pub questionnaire_id: EntityId,
    pub respondent: String,
    pub submitted_at: DateTime<Utc>,
    pub answers: Vec<ResponseAnswer>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QuestionnaireResponseDraft {
    pub questionnaire_id: EntityId,
    pub respondent: String,
    pub answers: Vec<ResponseAnswer>,
}

/// Responses are read-mostly; the only admin edit is fixing a respondent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct QuestionnaireResponsePatch {
    pub respondent: Option<String>,
}

impl Record for QuestionnaireResponse {
    const RESOURCE: Resource = Resource::QuestionnaireResponses;
    type Draft = QuestionnaireResponseDraft;
    type Patch = QuestionnaireResponsePatch;

    fn id(&self) -> EntityId {
        self.id
    }

    fn from_draft(draft: &Self::Draft, id: EntityId) -> Self {
        Self {
            id,
            questionnaire_id: draft.questionnaire_id,
            respondent: draft.respondent.clone(),
            submitted_at: Utc::now(),
            answers: draft.answers.clone(),
        }
    }

    fn with_patch(&self, patch: &Self::Patch) -> Self {
        let mut next = self.clone();
        if let Some(respondent) = &patch.respondent {
            next.respondent = respondent.clone();
        }
        next
    }
}
