//! Test fixtures for creating sample data.

use chrono::Utc;
use marquee_core::event_type::{EventType, EventTypeDraft, EventTypePatch};
use marquee_core::notification::{Notification, NotificationDraft};
use marquee_core::questionnaire::{
    FieldKind, Questionnaire, QuestionnaireField, QuestionnaireFieldDraft, QuestionnaireResponse,
    ResponseAnswer,
};
use marquee_core::EntityId;

/// Factory for event type rows and payloads.
pub struct EventTypeFixture;

impl EventTypeFixture {
    pub fn active(id: i64, name: &str) -> EventType {
        let now = Utc::now();
        EventType {
            id: EntityId::new(id),
            name: name.to_string(),
            description: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn draft(name: &str) -> EventTypeDraft {
        EventTypeDraft {
            name: name.to_string(),
            description: None,
            is_active: true,
        }
    }

    pub fn rename(name: &str) -> EventTypePatch {
        EventTypePatch {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    pub fn deactivate() -> EventTypePatch {
        EventTypePatch {
            is_active: Some(false),
            ..Default::default()
        }
    }
}

/// Factory for notification rows and payloads.
pub struct NotificationFixture;

impl NotificationFixture {
    pub fn unread(id: i64, title: &str) -> Notification {
        Notification {
            id: EntityId::new(id),
            title: title.to_string(),
            body: format!("{title} body"),
            is_read: false,
            created_at: Utc::now(),
        }
    }

    pub fn draft(title: &str) -> NotificationDraft {
        NotificationDraft {
            title: title.to_string(),
            body: format!("{title} body"),
        }
    }
}

/// Factory for questionnaire rows.
pub struct QuestionnaireFixture;

impl QuestionnaireFixture {
    pub fn for_event_type(id: i64, event_type_id: i64, name: &str) -> Questionnaire {
        let now = Utc::now();
        Questionnaire {
            id: EntityId::new(id),
            event_type_id: EntityId::new(event_type_id),
            name: name.to_string(),
            description: None,
            is_published: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Factory for questionnaire field rows and payloads.
pub struct FieldFixture;

impl FieldFixture {
    pub fn at(id: i64, questionnaire_id: i64, order: i64) -> QuestionnaireField {
        QuestionnaireField {
            id: EntityId::new(id),
            questionnaire_id: EntityId::new(questionnaire_id),
            label: format!("Question {id}"),
            kind: FieldKind::Text,
            required: false,
            order,
        }
    }

    pub fn draft(questionnaire_id: i64, label: &str, order: i64) -> QuestionnaireFieldDraft {
        QuestionnaireFieldDraft {
            questionnaire_id: EntityId::new(questionnaire_id),
            label: label.to_string(),
            kind: FieldKind::Text,
            required: false,
            order,
        }
    }
}

/// Factory for questionnaire response rows.
pub struct ResponseFixture;

impl ResponseFixture {
    pub fn by(id: i64, questionnaire_id: i64, respondent: &str) -> QuestionnaireResponse {
        QuestionnaireResponse {
            id: EntityId::new(id),
            questionnaire_id: EntityId::new(questionnaire_id),
            respondent: respondent.to_string(),
            submitted_at: Utc::now(),
            answers: vec![ResponseAnswer {
                field_id: EntityId::new(1),
                value: "yes".to_string(),
            }],
        }
    }
}
