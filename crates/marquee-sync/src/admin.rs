//! Facade wiring every resource handle together.

use crate::handle::ResourceHandle;
use crate::registry::CacheRegistry;
use marquee_core::event_type::EventType;
use marquee_core::notification::Notification;
use marquee_core::questionnaire::{Questionnaire, QuestionnaireField, QuestionnaireResponse};
use marquee_core::{ResourceClient, SyncConfig};
use std::sync::Arc;

/// Client implementations for each admin resource, supplied by the
/// surrounding application.
#[derive(Clone)]
pub struct ClientSet {
    pub event_types: Arc<dyn ResourceClient<EventType>>,
    pub notifications: Arc<dyn ResourceClient<Notification>>,
    pub questionnaires: Arc<dyn ResourceClient<Questionnaire>>,
    pub questionnaire_fields: Arc<dyn ResourceClient<QuestionnaireField>>,
    pub questionnaire_responses: Arc<dyn ResourceClient<QuestionnaireResponse>>,
}

/// The admin console's data layer: one handle per resource, sharing an
/// invalidation registry so staleness propagates across resources.
pub struct AdminCache {
    pub event_types: Arc<ResourceHandle<EventType>>,
    pub notifications: Arc<ResourceHandle<Notification>>,
    pub questionnaires: Arc<ResourceHandle<Questionnaire>>,
    pub questionnaire_fields: Arc<ResourceHandle<QuestionnaireField>>,
    pub questionnaire_responses: Arc<ResourceHandle<QuestionnaireResponse>>,
    registry: Arc<CacheRegistry>,
}

impl AdminCache {
    pub async fn new(clients: ClientSet, config: SyncConfig) -> Self {
        let registry = Arc::new(CacheRegistry::new());
        let event_types =
            ResourceHandle::new(clients.event_types, Arc::clone(&registry), config.clone());
        let notifications =
            ResourceHandle::new(clients.notifications, Arc::clone(&registry), config.clone());
        let questionnaires =
            ResourceHandle::new(clients.questionnaires, Arc::clone(&registry), config.clone());
        let questionnaire_fields = ResourceHandle::new(
            clients.questionnaire_fields,
            Arc::clone(&registry),
            config.clone(),
        );
        let questionnaire_responses = ResourceHandle::new(
            clients.questionnaire_responses,
            Arc::clone(&registry),
            config,
        );

        registry.register(event_types.clone()).await;
        registry.register(notifications.clone()).await;
        registry.register(questionnaires.clone()).await;
        registry.register(questionnaire_fields.clone()).await;
        registry.register(questionnaire_responses.clone()).await;

        Self {
            event_types,
            notifications,
            questionnaires,
            questionnaire_fields,
            questionnaire_responses,
            registry,
        }
    }

    pub fn registry(&self) -> &Arc<CacheRegistry> {
        &self.registry
    }

    /// Evict idle entries across every resource; returns how many entries
    /// were removed.
    pub fn sweep(&self) -> usize {
        self.event_types.sweep()
            + self.notifications.sweep()
            + self.questionnaires.sweep()
            + self.questionnaire_fields.sweep()
            + self.questionnaire_responses.sweep()
    }
}
