//! Search responses.
//!
//! A [`Response`] holds one issued query. The engine is called the first
//! time anything needs the results; the raw response is cached and never
//! re-fetched. Changing the page means issuing a new search.
//!
//! Hits are shaped by the [`WrapperKind`] chosen when the response is built:
//!
//! | Kind | Each hit becomes |
//! |------|------------------|
//! | `typed` | [`TypedHit<T>`]: the record deserialized from `_source`, with hit metadata |
//! | `map` | [`DynamicHit`]: the source fields behind a key-value accessor |
//! | `raw` | the hit object as the engine returned it |
//! | `reload` | the record loaded from the primary store, in hit order |

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexSet;
use serde::de::DeserializeOwned;
use serde_json::Value;
use syncdex_client::SearchClient;
use syncdex_core::query::{DEFAULT_PER_PAGE, offset_for};
use syncdex_core::record::value_to_id;
use syncdex_core::{
    Document, DocumentStore, Error, Indexable, Result, SearchOptions, SearchRequest, WrapperKind,
};
use tokio::sync::OnceCell;

// ============================================================================
// Wrapped hits
// ============================================================================

/// A hit reconstructed as a model instance.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedHit<T> {
    /// The reconstructed record.
    pub record: T,
    /// Document id.
    pub id: String,
    /// Index the hit came from.
    pub index: String,
    /// Document type of the hit.
    pub doc_type: String,
    /// Relevance score.
    pub score: Option<f64>,
    /// The hit's `_source` as returned.
    pub source: Value,
    /// Always `true`: the record exists in the primary store.
    pub persisted: bool,
}

/// A hit's fields behind a dynamic accessor.
///
/// Indexing with a missing key yields `Value::Null` rather than panicking,
/// so nested lookups read naturally:
///
/// ```rust
/// use serde_json::json;
/// use syncdex_sync::response::DynamicHit;
///
/// let hit = DynamicHit::from_hit(&json!({
///     "_id": "1",
///     "_type": "article",
///     "_source": {"name": "Hello", "author": {"name": "Ann"}}
/// }));
/// assert_eq!(hit["name"], "Hello");
/// assert_eq!(hit["author"]["name"], "Ann");
/// assert!(hit["missing"].is_null());
/// assert_eq!(hit.id, "1");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicHit {
    /// Document id.
    pub id: String,
    /// Index the hit came from.
    pub index: String,
    /// Document type of the hit.
    pub doc_type: String,
    /// Relevance score.
    pub score: Option<f64>,
    /// Source fields, with `id` set to the document id.
    pub fields: Document,
}

impl DynamicHit {
    /// Build from a raw hit object.
    pub fn from_hit(hit: &Value) -> Self {
        let meta = HitMeta::from_hit(hit);
        let mut fields = source_object(hit);
        fields.insert("id".to_string(), Value::String(meta.id.clone()));
        Self {
            id: meta.id,
            index: meta.index,
            doc_type: meta.doc_type,
            score: meta.score,
            fields,
        }
    }

    /// Field value by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Field value by dotted path (`author.name`).
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let first = self.fields.get(parts.next()?)?;
        parts.try_fold(first, |value, key| value.get(key))
    }
}

static NULL: Value = Value::Null;

impl std::ops::Index<&str> for DynamicHit {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        self.fields.get(key).unwrap_or(&NULL)
    }
}

/// One search hit, shaped by the response's wrapper kind.
#[derive(Debug, Clone, PartialEq)]
pub enum WrappedHit<T> {
    /// Reconstructed model instance.
    Typed(TypedHit<T>),
    /// Dynamic field map.
    Map(DynamicHit),
    /// Untouched engine hit.
    Raw(Value),
    /// Record reloaded from the primary store.
    Loaded(T),
}

impl<T> WrappedHit<T> {
    /// The record, for typed and reloaded hits.
    pub fn record(&self) -> Option<&T> {
        match self {
            WrappedHit::Typed(hit) => Some(&hit.record),
            WrappedHit::Loaded(record) => Some(record),
            WrappedHit::Map(_) | WrappedHit::Raw(_) => None,
        }
    }

    /// Consume into the record, for typed and reloaded hits.
    pub fn into_record(self) -> Option<T> {
        match self {
            WrappedHit::Typed(hit) => Some(hit.record),
            WrappedHit::Loaded(record) => Some(record),
            WrappedHit::Map(_) | WrappedHit::Raw(_) => None,
        }
    }
}

struct HitMeta {
    id: String,
    index: String,
    doc_type: String,
    score: Option<f64>,
}

impl HitMeta {
    fn from_hit(hit: &Value) -> Self {
        let text = |key: &str| hit.get(key).and_then(Value::as_str).unwrap_or_default().to_string();
        Self {
            id: hit.get("_id").map(value_to_id).unwrap_or_default(),
            index: text("_index"),
            doc_type: text("_type"),
            score: hit.get("_score").and_then(Value::as_f64),
        }
    }
}

fn source_object(hit: &Value) -> Document {
    hit.get("_source")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

// ============================================================================
// Response
// ============================================================================

/// Lazily fetched results of one search.
pub struct Response<T> {
    client: Arc<dyn SearchClient>,
    request: SearchRequest,
    options: SearchOptions,
    wrapper: WrapperKind,
    store: Option<Arc<dyn DocumentStore<T>>>,
    raw: OnceCell<Value>,
}

impl<T> Response<T>
where
    T: Indexable + DeserializeOwned + 'static,
{
    /// Build a response; nothing is fetched yet.
    pub fn new(
        client: Arc<dyn SearchClient>,
        request: SearchRequest,
        options: SearchOptions,
        wrapper: WrapperKind,
    ) -> Self {
        Self {
            client,
            request,
            options,
            wrapper,
            store: None,
            raw: OnceCell::new(),
        }
    }

    /// Attach the primary store used by the `reload` wrapper.
    pub fn with_store(mut self, store: Arc<dyn DocumentStore<T>>) -> Self {
        self.store = Some(store);
        self
    }

    /// The request this response issues.
    pub fn request(&self) -> &SearchRequest {
        &self.request
    }

    /// Wrapper kind shaping the hits.
    pub fn wrapper(&self) -> WrapperKind {
        self.wrapper
    }

    /// Whether the engine has been called yet.
    pub fn is_fetched(&self) -> bool {
        self.raw.initialized()
    }

    /// The raw engine response, fetched on first access.
    pub async fn raw(&self) -> Result<&Value> {
        self.raw
            .get_or_try_init(|| async {
                log::debug!(
                    "Searching index '{}'",
                    self.request.index.as_deref().unwrap_or("_all")
                );
                self.client.search(&self.request).await
            })
            .await
    }

    /// The untouched hit objects, in engine order.
    pub async fn raw_hits(&self) -> Result<Vec<Value>> {
        Ok(self
            .raw()
            .await?
            .pointer("/hits/hits")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }

    /// Hits shaped by the wrapper kind.
    ///
    /// # Errors
    ///
    /// Typed hits fail when a source does not deserialize into `T`. Reloaded
    /// hits fail when no store is attached or the store lookup fails.
    pub async fn hits(&self) -> Result<Vec<WrappedHit<T>>> {
        let hits = self.raw_hits().await?;
        match self.wrapper {
            WrapperKind::Typed => hits
                .iter()
                .map(|hit| typed_hit(hit).map(WrappedHit::Typed))
                .collect(),
            WrapperKind::Map => Ok(hits
                .iter()
                .map(|hit| WrappedHit::Map(DynamicHit::from_hit(hit)))
                .collect()),
            WrapperKind::Raw => Ok(hits.into_iter().map(WrappedHit::Raw).collect()),
            WrapperKind::Reload => Ok(self
                .reload(&hits)
                .await?
                .into_iter()
                .map(WrappedHit::Loaded)
                .collect()),
        }
    }

    /// Records behind the hits, for the typed and reload wrappers.
    pub async fn records(&self) -> Result<Vec<T>> {
        Ok(self
            .hits()
            .await?
            .into_iter()
            .filter_map(WrappedHit::into_record)
            .collect())
    }

    async fn reload(&self, hits: &[Value]) -> Result<Vec<T>> {
        let store = self
            .store
            .as_ref()
            .ok_or_else(|| Error::config("The reload wrapper needs a document store"))?;
        // A multi-index search can return one id more than once; the record
        // keeps the rank of its first hit.
        let mut ids: IndexSet<String> = IndexSet::new();
        for id in hits.iter().filter_map(|hit| hit.get("_id").map(value_to_id)) {
            if ids.contains(&id) {
                log::debug!("Search hit '{id}' repeated; reloading it once at its first rank");
            } else {
                ids.insert(id);
            }
        }
        let ids: Vec<String> = ids.into_iter().collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut found: HashMap<String, T> = store
            .find_many(&ids)
            .await?
            .into_iter()
            .map(|record| (record.id(), record))
            .collect();
        let mut ordered = Vec::with_capacity(ids.len());
        for id in &ids {
            match found.remove(id) {
                Some(record) => ordered.push(record),
                None => log::warn!("Search hit '{id}' is missing from the primary store"),
            }
        }
        Ok(ordered)
    }

    /// Total number of matching documents.
    ///
    /// Reads `hits.total` as a number or as `{"value": n}`.
    pub async fn total(&self) -> Result<u64> {
        let total = self.raw().await?.pointer("/hits/total");
        Ok(match total {
            Some(Value::Object(map)) => map.get("value").and_then(Value::as_u64).unwrap_or(0),
            Some(value) => value.as_u64().unwrap_or(0),
            None => 0,
        })
    }

    /// Current page, 1-based.
    pub fn page(&self) -> usize {
        self.options.page.unwrap_or(1).max(1)
    }

    /// Page size, defaulting to [`DEFAULT_PER_PAGE`].
    pub fn per_page(&self) -> usize {
        self.options
            .effective_per_page()
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_PER_PAGE)
    }

    /// Offset of the current page's first hit.
    pub fn offset(&self) -> usize {
        offset_for(self.page(), self.per_page())
    }

    /// Number of pages.
    pub async fn total_pages(&self) -> Result<usize> {
        let total = usize::try_from(self.total().await?).unwrap_or(usize::MAX);
        Ok(total.div_ceil(self.per_page()))
    }

    /// Whether this is the first page.
    pub fn is_first_page(&self) -> bool {
        self.page() == 1
    }

    /// Whether this is the last page (or past it).
    pub async fn is_last_page(&self) -> Result<bool> {
        Ok(self.page() >= self.total_pages().await?)
    }

    /// Number of the next page, if any.
    pub async fn next_page(&self) -> Result<Option<usize>> {
        Ok(if self.is_last_page().await? {
            None
        } else {
            Some(self.page() + 1)
        })
    }

    /// Number of the previous page, if any.
    pub fn prev_page(&self) -> Option<usize> {
        (self.page() > 1).then(|| self.page() - 1)
    }

    /// Highest score among the hits.
    pub async fn max_score(&self) -> Result<Option<f64>> {
        Ok(self
            .raw()
            .await?
            .pointer("/hits/max_score")
            .and_then(Value::as_f64))
    }

    /// Milliseconds the engine spent on the query.
    pub async fn took(&self) -> Result<Option<u64>> {
        Ok(self.raw().await?.get("took").and_then(Value::as_u64))
    }

    /// Facets section of the response.
    pub async fn facets(&self) -> Result<Option<Value>> {
        self.section("facets").await
    }

    /// Aggregations section of the response.
    pub async fn aggregations(&self) -> Result<Option<Value>> {
        self.section("aggregations").await
    }

    /// Suggest section of the response.
    pub async fn suggestions(&self) -> Result<Option<Value>> {
        self.section("suggest").await
    }

    async fn section(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.raw().await?.get(key).cloned())
    }
}

impl<T> std::fmt::Debug for Response<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Response")
            .field("request", &self.request)
            .field("options", &self.options)
            .field("wrapper", &self.wrapper)
            .field("fetched", &self.raw.initialized())
            .finish()
    }
}

/// Reconstruct a record from a hit.
///
/// The hit id fills `id` only when the source has none, so a source id of
/// another JSON type (a number, say) still deserializes into its own type.
fn typed_hit<T: DeserializeOwned>(hit: &Value) -> Result<TypedHit<T>> {
    let meta = HitMeta::from_hit(hit);
    let mut fields = source_object(hit);
    let id = fields.entry("id").or_insert(Value::Null);
    if id.is_null() {
        *id = Value::String(meta.id.clone());
    }
    let record = serde_json::from_value(Value::Object(fields))?;
    Ok(TypedHit {
        record,
        id: meta.id,
        index: meta.index,
        doc_type: meta.doc_type,
        score: meta.score,
        source: hit.get("_source").cloned().unwrap_or(Value::Null),
        persisted: true,
    })
}

// ============================================================================
// Tests
// ============================================================================
