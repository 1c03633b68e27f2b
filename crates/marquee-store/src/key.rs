//! Cache keys and key predicates.

use marquee_core::params::ListParams;
use marquee_core::{EntityId, Resource};
use std::fmt;

/// Structural identifier of one cached view.
///
/// Keys compare by value: the same page requested with the same parameters
/// always lands on the same entry, and filters compare order-independently
/// because `ListParams` keeps them sorted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// One page of a collection under concrete list parameters.
    Collection { resource: Resource, params: ListParams },
    /// A single entity fetched by id.
    Detail { resource: Resource, id: EntityId },
}

impl QueryKey {
    pub fn collection(resource: Resource, params: ListParams) -> Self {
        Self::Collection { resource, params }
    }

    pub fn detail(resource: Resource, id: EntityId) -> Self {
        Self::Detail { resource, id }
    }

    pub fn resource(&self) -> Resource {
        match self {
            QueryKey::Collection { resource, .. } => *resource,
            QueryKey::Detail { resource, .. } => *resource,
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, QueryKey::Collection { .. })
    }

    pub fn detail_id(&self) -> Option<EntityId> {
        match self {
            QueryKey::Detail { id, .. } => Some(*id),
            QueryKey::Collection { .. } => None,
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::Collection { resource, params } => write!(f, "{resource}?{params}"),
            QueryKey::Detail { resource, id } => write!(f, "{resource}/{id}"),
        }
    }
}

/// Predicate over cache keys, produced by invalidation planning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPredicate {
    /// Every collection view of a resource, regardless of page, search, or
    /// filters.
    Collections(Resource),
    /// The detail view of one entity.
    Detail { resource: Resource, id: EntityId },
}

impl KeyPredicate {
    pub fn resource(&self) -> Resource {
        match self {
            KeyPredicate::Collections(resource) => *resource,
            KeyPredicate::Detail { resource, .. } => *resource,
        }
    }

    pub fn matches(&self, key: &QueryKey) -> bool {
        match self {
            KeyPredicate::Collections(resource) => {
                matches!(key, QueryKey::Collection { resource: r, .. } if r == resource)
            }
            KeyPredicate::Detail { resource, id } => {
                matches!(key, QueryKey::Detail { resource: r, id: i } if r == resource && i == id)
            }
        }
    }
}
