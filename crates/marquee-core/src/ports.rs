//! Port traits between the data layer and the surrounding application.

use crate::error::{Error, Result};
use crate::ids::EntityId;
use crate::order::OrderMapping;
use crate::page::Page;
use crate::params::ListParams;
use crate::record::Record;
use async_trait::async_trait;

/// Typed CRUD access to one server collection.
///
/// The surrounding application supplies an implementation per resource;
/// transport, authentication, and retries are its concern. Every method
/// maps to exactly one logical server operation.
#[async_trait]
pub trait ResourceClient<T: Record>: Send + Sync {
    async fn list(&self, params: &ListParams) -> Result<Page<T>>;

    async fn get(&self, id: EntityId) -> Result<T>;

    async fn create(&self, draft: &T::Draft) -> Result<T>;

    async fn update(&self, id: EntityId, patch: &T::Patch) -> Result<T>;

    async fn delete(&self, id: EntityId) -> Result<()>;

    /// Persist a new ordering for rows in one parent scope. Only resources
    /// with an order column implement this.
    async fn reorder(&self, mapping: &OrderMapping) -> Result<()> {
        let _ = mapping;
        Err(Error::Internal(format!("Reorder not supported for {}", T::RESOURCE)))
    }
}
