//! Optimistic mutation coordination over the Marquee query store.
//!
//! Mutations apply their patch to the cache first, then call the server.
//! Confirmed replies are reconciled into the affected entries and the
//! dependent views are invalidated; failures restore the pre-mutation
//! snapshot exactly. Reorders resolve locally to a dense order mapping
//! before any of that starts.

pub mod admin;
pub mod coordinator;
pub mod handle;
pub mod invalidation;
pub mod mutation;
pub mod patch;
pub mod refetch;
pub mod registry;
pub mod reorder;
pub mod snapshot;

pub use admin::{AdminCache, ClientSet};
pub use coordinator::{MutationCoordinator, MutationPhase};
pub use handle::ResourceHandle;
pub use invalidation::{InvalidationPlan, InvalidationPlanner, RefreshMode};
pub use mutation::{MutationKind, MutationSpec};
pub use patch::PatchOp;
pub use refetch::Refetcher;
pub use registry::{CacheRegistry, InvalidationTarget};
pub use reorder::{merge_mapping, resolve_move, ReorderPlan};
pub use snapshot::Snapshot;
