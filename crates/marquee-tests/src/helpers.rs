//! Test helper functions and utilities.

use crate::server::InMemoryServer;
use marquee_core::event_type::EventType;
use marquee_core::notification::Notification;
use marquee_core::questionnaire::{Questionnaire, QuestionnaireField, QuestionnaireResponse};
use marquee_core::SyncConfig;
use marquee_store::{EntryUpdate, UpdateKind};
use marquee_sync::{AdminCache, ClientSet};
use std::sync::{Arc, Mutex};

/// One in-memory server per admin resource, with the scoping and ordering
/// behaviour the real backend applies.
pub struct TestBackend {
    pub event_types: Arc<InMemoryServer<EventType>>,
    pub notifications: Arc<InMemoryServer<Notification>>,
    pub questionnaires: Arc<InMemoryServer<Questionnaire>>,
    pub questionnaire_fields: Arc<InMemoryServer<QuestionnaireField>>,
    pub questionnaire_responses: Arc<InMemoryServer<QuestionnaireResponse>>,
}

impl TestBackend {
    pub fn new() -> Self {
        let event_types = Arc::new(InMemoryServer::new(Vec::new()).with_filter(
            |record: &EventType, params| match &params.search {
                Some(search) => record.name.to_lowercase().contains(&search.to_lowercase()),
                None => true,
            },
        ));
        let notifications = Arc::new(InMemoryServer::new(Vec::new()));
        let questionnaires = Arc::new(InMemoryServer::new(Vec::new()).with_filter(
            |record: &Questionnaire, params| match params.filter("event_type") {
                Some(id) => record.event_type_id.to_string() == id,
                None => true,
            },
        ));
        let questionnaire_fields = Arc::new(
            InMemoryServer::new(Vec::new())
                .with_filter(|record: &QuestionnaireField, params| {
                    match params.filter("questionnaire") {
                        Some(id) => record.questionnaire_id.to_string() == id,
                        None => true,
                    }
                })
                .with_sort(|a, b| a.order.cmp(&b.order))
                .with_reorder(),
        );
        let questionnaire_responses = Arc::new(InMemoryServer::new(Vec::new()).with_filter(
            |record: &QuestionnaireResponse, params| match params.filter("questionnaire") {
                Some(id) => record.questionnaire_id.to_string() == id,
                None => true,
            },
        ));

        Self {
            event_types,
            notifications,
            questionnaires,
            questionnaire_fields,
            questionnaire_responses,
        }
    }

    pub fn clients(&self) -> ClientSet {
        ClientSet {
            event_types: self.event_types.clone(),
            notifications: self.notifications.clone(),
            questionnaires: self.questionnaires.clone(),
            questionnaire_fields: self.questionnaire_fields.clone(),
            questionnaire_responses: self.questionnaire_responses.clone(),
        }
    }
}

impl Default for TestBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// A data layer wired to a fresh in-memory backend under default config.
pub async fn admin_cache() -> (AdminCache, TestBackend) {
    admin_cache_with(SyncConfig::default()).await
}

/// A data layer wired to a fresh in-memory backend under `config`.
pub async fn admin_cache_with(config: SyncConfig) -> (AdminCache, TestBackend) {
    crate::init_test_logging();
    let backend = TestBackend::new();
    let cache = AdminCache::new(backend.clients(), config).await;
    (cache, backend)
}

/// Yield enough times for spawned tasks and queued notifications to run.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

/// Wait for a condition with timeout.
pub async fn wait_for<F, Fut>(
    timeout: std::time::Duration,
    interval: std::time::Duration,
    mut condition: F,
) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let start = std::time::Instant::now();
    while start.elapsed() < timeout {
        if condition().await {
            return true;
        }
        tokio::time::sleep(interval).await;
    }
    false
}

/// Assert that a future completes within a timeout.
pub async fn assert_completes_within<F, T>(future: F, timeout: std::time::Duration) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(timeout, future)
        .await
        .expect("Operation timed out")
}

/// Records the update kinds a subscriber sees, for asserting notification
/// order.
#[derive(Clone, Default)]
pub struct UpdateLog {
    kinds: Arc<Mutex<Vec<UpdateKind>>>,
}

impl UpdateLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A callback that appends every update's kind to this log.
    pub fn callback<V>(&self) -> impl Fn(&EntryUpdate<V>) + Send + Sync + 'static {
        let sink = Arc::clone(&self.kinds);
        move |update| sink.lock().unwrap().push(update.kind)
    }

    pub fn kinds(&self) -> Vec<UpdateKind> {
        self.kinds.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.kinds.lock().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_wait_for_returns_immediately_when_true() {
        let result = wait_for(
            std::time::Duration::from_secs(1),
            std::time::Duration::from_millis(10),
            || async { true },
        )
        .await;
        assert!(result);
    }

    #[tokio::test]
    async fn test_wait_for_times_out_when_false() {
        let result = wait_for(
            std::time::Duration::from_millis(50),
            std::time::Duration::from_millis(10),
            || async { false },
        )
        .await;
        assert!(!result);
    }
}
