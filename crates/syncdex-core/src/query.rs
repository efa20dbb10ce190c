//! Query normalization and pagination.
//!
//! Callers search with a [`Query`]: free text, a structured body, or a
//! fully specified [`SearchRequest`]. Both the per-model and the global
//! search entry points funnel it through [`Query::into_request`] and then
//! [`SearchRequest::paginate`], so the same text always produces the same
//! request apart from the target index list.
//!
//! ```rust
//! use syncdex_core::{Query, SearchOptions};
//!
//! let mut request = Query::from("hello, world!").into_request();
//! request.paginate(&SearchOptions::new().page(3).per_page(10));
//!
//! assert_eq!(request.q.as_deref(), Some("hello world"));
//! assert_eq!(request.size, Some(10));
//! assert_eq!(request.from, Some(20));
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::WrapperKind;
use crate::util::clean;

/// Default page size assumed when a response is paginated without one.
pub const DEFAULT_PER_PAGE: usize = 10;

// ============================================================================
// SearchRequest
// ============================================================================

/// A search request as sent to the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Comma-separated target indexes. All indexes when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,

    /// Document type to restrict the search to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,

    /// Query-string shorthand.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,

    /// Structured query body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,

    /// Page size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,

    /// Offset of the first hit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<usize>,

    /// Tolerate missing or closed indexes in the target list.
    #[serde(default)]
    pub ignore_unavailable: bool,
}

impl SearchRequest {
    /// Request matching every document.
    pub fn match_all() -> Self {
        Self {
            body: Some(serde_json::json!({ "query": { "match_all": {} } })),
            ..Default::default()
        }
    }

    /// Apply page/per-page options as `size`/`from`.
    ///
    /// A page size sets `size`. A page number together with a page size sets
    /// `from`: page 1 (or lower) starts at 0, page *n* at `per_page * (n-1)`.
    /// Without options nothing is touched.
    pub fn paginate(&mut self, options: &SearchOptions) {
        let (size, from) = pagination_window(options.page, options.effective_per_page());
        if size.is_some() {
            self.size = size;
        }
        if from.is_some() {
            self.from = from;
        }
    }
}

/// Translate page/per-page into engine `(size, from)` parameters.
///
/// ```rust
/// use syncdex_core::query::pagination_window;
///
/// assert_eq!(pagination_window(Some(1), Some(10)), (Some(10), Some(0)));
/// assert_eq!(pagination_window(Some(3), Some(10)), (Some(10), Some(20)));
/// assert_eq!(pagination_window(None, None), (None, None));
/// ```
pub fn pagination_window(
    page: Option<usize>,
    per_page: Option<usize>,
) -> (Option<usize>, Option<usize>) {
    let from = match (page, per_page) {
        (Some(page), Some(per_page)) => Some(offset_for(page, per_page)),
        _ => None,
    };
    (per_page, from)
}

/// Offset of the first hit on `page`.
///
/// Saturates at `usize::MAX` for page numbers past any real result set.
pub fn offset_for(page: usize, per_page: usize) -> usize {
    if page <= 1 {
        0
    } else {
        per_page.saturating_mul(page - 1)
    }
}

// ============================================================================
// Query
// ============================================================================

/// What a caller searches with.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Free text, cleaned into the query-string shorthand.
    Text(String),
    /// A structured query body.
    Body(Value),
    /// A fully specified request, used as is.
    Request(SearchRequest),
}

impl Query {
    /// Normalize into a [`SearchRequest`].
    pub fn into_request(self) -> SearchRequest {
        match self {
            Query::Text(text) => SearchRequest {
                q: Some(clean(&text)),
                ..Default::default()
            },
            Query::Body(body) => SearchRequest {
                body: Some(body),
                ..Default::default()
            },
            Query::Request(request) => request,
        }
    }
}

impl From<&str> for Query {
    fn from(text: &str) -> Self {
        Query::Text(text.to_string())
    }
}

impl From<String> for Query {
    fn from(text: String) -> Self {
        Query::Text(text)
    }
}

impl From<Value> for Query {
    fn from(body: Value) -> Self {
        Query::Body(body)
    }
}

impl From<SearchRequest> for Query {
    fn from(request: SearchRequest) -> Self {
        Query::Request(request)
    }
}

// ============================================================================
// SearchOptions
// ============================================================================

/// Per-call search options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// 1-based page number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,

    /// Page size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<usize>,

    /// Alias for `per_page`, consulted when `per_page` is unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per: Option<usize>,

    /// Wrapper override. The model's wrapper is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrapper: Option<WrapperKind>,

    /// Restrict per-model searches to the model's document type.
    /// Defaults to `true`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_type: Option<bool>,
}

impl SearchOptions {
    /// Empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page number.
    pub fn page(mut self, page: usize) -> Self {
        self.page = Some(page);
        self
    }

    /// Set the page size.
    pub fn per_page(mut self, per_page: usize) -> Self {
        self.per_page = Some(per_page);
        self
    }

    /// Override the result wrapper.
    pub fn wrapper(mut self, wrapper: WrapperKind) -> Self {
        self.wrapper = Some(wrapper);
        self
    }

    /// Set whether per-model searches are restricted to the model's type.
    pub fn include_type(mut self, include: bool) -> Self {
        self.include_type = Some(include);
        self
    }

    /// Page size after applying the `per` alias.
    pub fn effective_per_page(&self) -> Option<usize> {
        self.per_page.or(self.per)
    }
}

// ============================================================================
// Tests
// ============================================================================
