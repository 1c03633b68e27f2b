//! Core domain types and traits for the Marquee admin data layer.
//!
//! Everything here is shared vocabulary: entity types for the admin
//! collections, identifiers, list parameters, the error taxonomy, and the
//! port the surrounding application implements to reach the server.

pub mod config;
pub mod error;
pub mod event_type;
pub mod ids;
pub mod notification;
pub mod order;
pub mod page;
pub mod params;
pub mod ports;
pub mod questionnaire;
pub mod record;
pub mod resource;

pub use config::SyncConfig;
pub use error::{Error, Result};
pub use ids::{EntityId, MutationId};
pub use order::OrderMapping;
pub use page::Page;
pub use params::ListParams;
pub use ports::ResourceClient;
pub use record::{Ordered, Record};
pub use resource::Resource;
