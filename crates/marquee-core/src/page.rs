//! Paged collection results.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One page of a collection as the server returned it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total rows matching the parameters across all pages.
    pub total_count: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
            has_next: false,
            has_previous: false,
        }
    }

    /// A single page holding everything, for seeds and fixtures.
    pub fn single(items: Vec<T>) -> Self {
        let total_count = items.len() as u64;
        Self {
            items,
            total_count,
            has_next: false,
            has_previous: false,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::empty()
    }
}
