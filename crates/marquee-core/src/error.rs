//! Error types for the Marquee data layer.

use crate::ids::EntityId;
use crate::resource::Resource;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum Error {
    // Transport errors
    #[error("Network error: {0}")]
    Network(String),

    // Server rejections
    #[error("Validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Entity not found: {resource}/{id}")]
    NotFound { resource: Resource, id: EntityId },

    #[error("Conflict with newer server state: {0}")]
    Conflict(String),

    // Local rejections
    #[error("Invalid reorder: {0}")]
    InvalidReorder(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl Error {
    /// True when the server told us the target entity no longer exists,
    /// so local copies of it are wrong rather than merely old.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// True when the server rejected a write against newer state.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }
}
