//! Keyed query cache for the Marquee admin data layer.
//!
//! Stores collection pages and entity details under structural keys,
//! tracks fetch lifecycle and staleness per entry, and notifies
//! subscribers of every change. Optimistic edits and rollbacks are plain
//! writes here; coordination lives in `marquee-sync`.

pub mod entry;
pub mod events;
pub mod key;
pub mod resource_cache;
pub mod store;

pub use entry::{CacheEntry, FetchStatus};
pub use events::{EntryUpdate, UpdateKind};
pub use key::{KeyPredicate, QueryKey};
pub use resource_cache::ResourceCache;
pub use store::{
    EntryUpdates, FetchTicket, InvalidatedKeys, QueryStore, SubscriptionGuard, UpdateCallback,
};
