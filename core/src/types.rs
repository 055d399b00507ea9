//! Shapes shared by every resource's list endpoint.
//!
//! # Design
//! Domain models are owned by the domain clients. The only shape the core
//! knows is the paged collection envelope, because bodiless and 404 list
//! responses resolve to its empty value. The mock server defines its own
//! copy; integration tests catch drift between the two.

use serde::{Deserialize, Serialize};

/// One page of a resource list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionModel<T> {
    #[serde(default = "Vec::new")]
    pub item: Vec<T>,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub records_per_page: u32,
    #[serde(default)]
    pub total_records: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embed: Option<String>,
}

impl<T> Default for CollectionModel<T> {
    fn default() -> Self {
        Self {
            item: Vec::new(),
            page: 0,
            records_per_page: 0,
            total_records: 0,
            search_query: None,
            sort: None,
            embed: None,
        }
    }
}

impl<T> CollectionModel<T> {
    pub fn is_empty(&self) -> bool {
        self.item.is_empty()
    }
}
