//! List request parameters.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Rows per collection page when the caller does not say otherwise.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Parameters identifying one view of a collection.
///
/// Filters live in a `BTreeMap` so two parameter sets compare and hash by
/// value regardless of insertion order; any two requests with the same
/// logical parameters land on the same cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct ListParams {
    pub page: u32,
    pub page_size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub filters: BTreeMap<String, String>,
}

impl ListParams {
    pub fn page(page: u32) -> Self {
        Self {
            page,
            page_size: DEFAULT_PAGE_SIZE,
            search: None,
            filters: BTreeMap::new(),
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    pub fn filter(&self, key: &str) -> Option<&str> {
        self.filters.get(key).map(String::as_str)
    }
}

impl Default for ListParams {
    fn default() -> Self {
        Self::page(1)
    }
}

impl fmt::Display for ListParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page={}&size={}", self.page, self.page_size)?;
        if let Some(search) = &self.search {
            write!(f, "&search={search}")?;
        }
        for (key, value) in &self.filters {
            write!(f, "&{key}={value}")?;
        }
        Ok(())
    }
}
