//! Integration test infrastructure for the Marquee client cache.
//!
//! This crate provides an in-memory resource server plus fixtures and
//! helpers for driving the cache through realistic admin-console flows.
//!
//! # Usage
//!
//! ```ignore
//! use marquee_tests::{admin_cache, EventTypeFixture};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let (cache, backend) = admin_cache().await;
//!     backend.event_types.insert(EventTypeFixture::active(1, "Gala")).await;
//!     // Drive cache.event_types, assert against backend.event_types.
//! }
//! ```

pub mod fixtures;
pub mod helpers;
pub mod server;

pub use fixtures::*;
pub use helpers::*;
pub use server::{CallRecord, InMemoryServer, ServerGate};

/// Initialize test logging (call once per test binary).
pub fn init_test_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,marquee=debug")),
        )
        .with_test_writer()
        .try_init();
}
