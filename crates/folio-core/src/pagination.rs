//! Pagination result shapes.

use crate::Document;
use serde::{Deserialize, Serialize};

/// A page produced by offset or aggregate pagination.
///
/// Navigation flags are derived from `page`, `pages`, and `total` when
/// the page is built and cannot be set independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OffsetPage {
    docs: Vec<Document>,
    page: u64,
    limit: u64,
    total: u64,
    pages: u64,
    has_next: bool,
    has_prev: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    warning: Option<String>,
}

impl OffsetPage {
    /// Creates a page. `page` is 1-based and `limit` must be positive.
    #[must_use]
    pub fn new(docs: Vec<Document>, page: u64, limit: u64, total: u64) -> Self {
        debug_assert!(limit > 0);
        debug_assert!(docs.len() as u64 <= limit);
        let pages = if limit > 0 { total.div_ceil(limit) } else { 0 };
        Self {
            docs,
            page,
            limit,
            total,
            pages,
            has_next: page < pages,
            has_prev: page > 1,
            warning: None,
        }
    }

    /// Attaches a non-fatal advisory.
    #[must_use]
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }

    #[must_use]
    pub fn docs(&self) -> &[Document] {
        &self.docs
    }

    #[must_use]
    pub fn into_docs(self) -> Vec<Document> {
        self.docs
    }

    #[must_use]
    pub const fn page(&self) -> u64 {
        self.page
    }

    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.limit
    }

    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    #[must_use]
    pub const fn pages(&self) -> u64 {
        self.pages
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.has_next
    }

    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.has_prev
    }

    #[must_use]
    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }
}

/// A page produced by keyset (cursor) pagination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeysetPage {
    docs: Vec<Document>,
    limit: u64,
    has_more: bool,
    next: Option<String>,
}

impl KeysetPage {
    /// Creates a page; `has_more` is true exactly when a `next` cursor exists.
    #[must_use]
    pub fn new(docs: Vec<Document>, limit: u64, next: Option<String>) -> Self {
        debug_assert!(docs.len() as u64 <= limit);
        Self {
            docs,
            limit,
            has_more: next.is_some(),
            next,
        }
    }

    #[must_use]
    pub fn docs(&self) -> &[Document] {
        &self.docs
    }

    #[must_use]
    pub fn into_docs(self) -> Vec<Document> {
        self.docs
    }

    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.limit
    }

    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.has_more
    }

    /// The cursor to pass as `after` for the following page.
    #[must_use]
    pub fn next(&self) -> Option<&str> {
        self.next.as_deref()
    }
}

/// A list result, tagged by the pagination method that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ListResult {
    Offset(OffsetPage),
    Keyset(KeysetPage),
    Aggregate(OffsetPage),
}

impl ListResult {
    #[must_use]
    pub fn docs(&self) -> &[Document] {
        match self {
            Self::Offset(page) | Self::Aggregate(page) => page.docs(),
            Self::Keyset(page) => page.docs(),
        }
    }

    #[must_use]
    pub fn into_docs(self) -> Vec<Document> {
        match self {
            Self::Offset(page) | Self::Aggregate(page) => page.into_docs(),
            Self::Keyset(page) => page.into_docs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn docs(n: usize) -> Vec<Document> {
        (0..n)
            .map(|i| json!({"_id": i.to_string()}).as_object().cloned().unwrap())
            .collect()
    }

    #[test]
    fn test_offset_page_flags() {
        let first = OffsetPage::new(docs(10), 1, 10, 25);
        assert_eq!(first.pages(), 3);
        assert!(first.has_next());
        assert!(!first.has_prev());

        let last = OffsetPage::new(docs(5), 3, 10, 25);
        assert!(!last.has_next());
        assert!(last.has_prev());
    }

    #[test]
    fn test_offset_page_empty_collection() {
        let page = OffsetPage::new(Vec::new(), 1, 20, 0);
        assert_eq!(page.pages(), 0);
        assert!(!page.has_next());
        assert!(!page.has_prev());
    }

    #[test]
    fn test_page_beyond_end() {
        let page = OffsetPage::new(Vec::new(), 9, 10, 25);
        assert!(!page.has_next());
        assert!(page.has_prev());
    }

    #[test]
    fn test_keyset_has_more_follows_next() {
        assert!(KeysetPage::new(docs(2), 2, Some("c".to_string())).has_more());
        assert!(!KeysetPage::new(docs(1), 2, None).has_more());
    }

    #[test]
    fn test_list_result_is_tagged() {
        let result = ListResult::Keyset(KeysetPage::new(docs(1), 5, None));
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["method"], "keyset");
        assert_eq!(value["hasMore"], false);
        let back: ListResult = serde_json::from_value(value).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn test_warning_is_omitted_when_absent() {
        let value = serde_json::to_value(OffsetPage::new(docs(1), 1, 5, 1)).unwrap();
        assert!(value.get("warning").is_none());
        let warned = OffsetPage::new(docs(1), 1, 5, 1).with_warning("deep");
        assert_eq!(warned.warning(), Some("deep"));
    }
}
