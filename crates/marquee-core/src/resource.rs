//! Registry of the admin collections served by the backend.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The named collections of the admin API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Resource {
    EventTypes,
    Notifications,
    Questionnaires,
    QuestionnaireFields,
    QuestionnaireResponses,
}

impl Resource {
    pub const ALL: [Resource; 5] = [
        Resource::EventTypes,
        Resource::Notifications,
        Resource::Questionnaires,
        Resource::QuestionnaireFields,
        Resource::QuestionnaireResponses,
    ];

    /// Wire name of the collection.
    pub fn name(&self) -> &'static str {
        match self {
            Resource::EventTypes => "event-types",
            Resource::Notifications => "notifications",
            Resource::Questionnaires => "questionnaires",
            Resource::QuestionnaireFields => "questionnaire-fields",
            Resource::QuestionnaireResponses => "questionnaire-responses",
        }
    }

    /// Resources whose cached collections go stale when this one changes.
    ///
    /// Fields and responses are scoped to a parent questionnaire, so
    /// questionnaire writes reach into both. Questionnaire rows embed
    /// event-type data, so event-type writes reach into questionnaires.
    pub fn dependents(&self) -> &'static [Resource] {
        match self {
            Resource::EventTypes => &[Resource::Questionnaires],
            Resource::Questionnaires => {
                &[Resource::QuestionnaireFields, Resource::QuestionnaireResponses]
            }
            _ => &[],
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
