//! Option objects for list and single-resource reads.
//!
//! Every domain client's `find` accepts the same paging/sorting/embedding
//! options. They are collected here once and written onto an `ApiUrl` in a
//! fixed order: `q`, `page`, `rpp`, `sort`, `embed`, `fields`.

use crate::config::{
    DEFAULT_EMBED, DEFAULT_FIELDS, DEFAULT_PAGE, DEFAULT_RECORDS_PER_PAGE, DEFAULT_SEARCH_QUERY,
    DEFAULT_SORTING,
};
use crate::url::ApiUrl;

/// Options for a paged list request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindParams {
    /// Search phrase. Empty or whitespace-only phrases are not sent.
    pub search_query: Option<String>,
    pub page: u32,
    /// Records per page.
    pub rpp: u32,
    /// Sort expression, e.g. `title|asc`.
    pub sort: Option<String>,
    /// Comma-separated relations to embed.
    pub embed: Option<String>,
    /// Comma-separated field projection.
    pub fields: Option<String>,
}

impl Default for FindParams {
    fn default() -> Self {
        Self {
            search_query: DEFAULT_SEARCH_QUERY.map(str::to_string),
            page: DEFAULT_PAGE,
            rpp: DEFAULT_RECORDS_PER_PAGE,
            sort: DEFAULT_SORTING.map(str::to_string),
            embed: DEFAULT_EMBED.map(str::to_string),
            fields: DEFAULT_FIELDS.map(str::to_string),
        }
    }
}

impl FindParams {
    #[must_use]
    pub fn search(mut self, phrase: impl Into<String>) -> Self {
        self.search_query = Some(phrase.into());
        self
    }

    #[must_use]
    pub fn page(mut self, page: u32, rpp: u32) -> Self {
        self.page = page;
        self.rpp = rpp;
        self
    }

    #[must_use]
    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    #[must_use]
    pub fn embed(mut self, embed: impl Into<String>) -> Self {
        self.embed = Some(embed.into());
        self
    }

    #[must_use]
    pub fn fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = Some(fields.into());
        self
    }

    pub fn apply(&self, url: &mut ApiUrl) {
        let search = self
            .search_query
            .as_deref()
            .filter(|phrase| !phrase.trim().is_empty());
        url.append_query("q", &search)
            .append_query("page", &self.page)
            .append_query("rpp", &self.rpp)
            .append_query("sort", &self.sort)
            .append_query("embed", &self.embed)
            .append_query("fields", &self.fields);
    }
}

/// Options for a single-resource read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetParams {
    pub embed: Option<String>,
    pub fields: Option<String>,
}

impl GetParams {
    pub fn apply(&self, url: &mut ApiUrl) {
        url.append_query("embed", &self.embed)
            .append_query("fields", &self.fields);
    }
}
