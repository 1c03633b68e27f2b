//! Strongly-typed identifiers used across the data layer.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};
use uuid::Uuid;

/// Identifier of a server-backed entity.
///
/// Server-assigned identifiers are positive. Provisional identifiers are
/// negative, handed out by a process-local monotonic counter, so a
/// provisional id can never collide with anything the server returns.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    JsonSchema,
)]
#[serde(transparent)]
pub struct EntityId(i64);

static NEXT_LOCAL_ID: AtomicI64 = AtomicI64::new(-1);

impl EntityId {
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Allocate a fresh provisional identifier.
    pub fn next_local() -> Self {
        Self(NEXT_LOCAL_ID.fetch_sub(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> i64 {
        self.0
    }

    /// True for provisional identifiers the server has not confirmed yet.
    pub fn is_local(&self) -> bool {
        self.0 < 0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_local() {
            write!(f, "local_{}", -self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl From<i64> for EntityId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

/// Correlation id stamped on every mutation attempt, for log lines and
/// debugging. Never sent to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MutationId(Uuid);

impl MutationId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for MutationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MutationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mut_{}", self.0)
    }
}

impl FromStr for MutationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix("mut_").unwrap_or(s);
        Ok(Self(Uuid::parse_str(raw)?))
    }
}
