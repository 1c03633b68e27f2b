//! Cross-resource routing of invalidation plans.

use crate::invalidation::{InvalidationPlan, RefreshMode};
use async_trait::async_trait;
use marquee_core::Resource;
use marquee_store::KeyPredicate;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// One resource's cache as an invalidation target, type-erased so a plan
/// for questionnaires can reach into fields and responses.
#[async_trait]
pub trait InvalidationTarget: Send + Sync {
    fn resource(&self) -> Resource;

    /// Mark matching entries stale and schedule refreshes per `mode`.
    async fn invalidate(&self, predicate: &KeyPredicate, mode: RefreshMode);
}

/// Registry of every resource cache, addressed by resource.
#[derive(Default)]
pub struct CacheRegistry {
    targets: RwLock<HashMap<Resource, Arc<dyn InvalidationTarget>>>,
}

impl CacheRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, target: Arc<dyn InvalidationTarget>) {
        self.targets.write().await.insert(target.resource(), target);
    }

    /// Route each predicate to the cache it addresses. Predicates for
    /// unregistered resources are skipped; there is nothing cached to go
    /// stale.
    pub async fn apply(&self, plan: &InvalidationPlan) {
        let targets = self.targets.read().await;
        for predicate in &plan.predicates {
            match targets.get(&predicate.resource()) {
                Some(target) => target.invalidate(predicate, plan.mode).await,
                None => {
                    debug!(
                        resource = %predicate.resource(),
                        "No cache registered for invalidation"
                    );
                }
            }
        }
    }
}
