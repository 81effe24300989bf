//! Query-string helpers.
//!
//! [`QueryParams`] assembles ordered key/value pairs from optional values;
//! [`ListOptions`] carries the pagination cursor and free-form filters that
//! paginated list endpoints accept.

use std::borrow::Cow;
use std::fmt::Display;

/// Builder for assembling query parameter pairs.
///
/// Pairs keep their insertion order, so identical submissions produce
/// identical URLs.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(Cow<'static, str>, String)>,
}

impl QueryParams {
    /// Create a new, empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Append a key/value pair when the value is present.
    pub fn push_opt<T>(&mut self, key: &'static str, value: Option<T>)
    where
        T: ToString,
    {
        if let Some(value) = value {
            self.pairs.push((Cow::Borrowed(key), value.to_string()));
        }
    }

    /// Append a required key/value pair.
    pub fn push<T>(&mut self, key: &'static str, value: T)
    where
        T: Display,
    {
        self.pairs.push((Cow::Borrowed(key), value.to_string()));
    }

    /// Append a pair whose key is only known at runtime.
    pub fn push_owned(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((Cow::Owned(key.into()), value.into()));
    }

    /// Append every pair from `other`.
    pub fn extend(&mut self, other: Self) {
        self.pairs.extend(other.pairs);
    }

    /// Iterate over the collected pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_ref(), v.as_str()))
    }

    /// Returns true if no parameters have been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Pagination and filters for list endpoints.
///
/// Each call returns one page; callers that want every item iterate until an
/// empty page comes back.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ListOptions {
    /// Page number, starting at 1.
    pub page: Option<u32>,
    /// Maximum items per page.
    pub limit: Option<u32>,
    /// Additional filters, attached verbatim in insertion order.
    pub filters: Vec<(String, String)>,
}

impl ListOptions {
    /// Options with no pagination and no filters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            page: None,
            limit: None,
            filters: Vec::new(),
        }
    }

    /// Request a specific page.
    #[must_use]
    pub const fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Limit the page size.
    #[must_use]
    pub const fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Add a filter.
    #[must_use]
    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((key.into(), value.into()));
        self
    }

    /// The options advanced to the following page.
    #[must_use]
    pub fn next_page(&self) -> Self {
        let mut next = self.clone();
        next.page = Some(self.page.unwrap_or(1).saturating_add(1));
        next
    }

    /// Convert into query pairs: `page`, `limit`, then filters.
    #[must_use]
    pub fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        params.push_opt("page", self.page);
        params.push_opt("limit", self.limit);
        for (key, value) in &self.filters {
            params.push_owned(key.clone(), value.clone());
        }
        params
    }
}
