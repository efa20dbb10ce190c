//! Search client facade.
//!
//! [`SearchClient`] is the narrow set of engine primitives Syncdex needs:
//! document index/delete, bulk batches, search and suggest queries, index
//! lifecycle, and the engine's version. Everything above it (sync engine,
//! response wrappers, global search) talks to the engine only through this
//! trait.
//!
//! [`CachedClient`] is the per-registration handle: it owns the merged
//! connection config and creates the client lazily, once, through a
//! [`ClientFactory`].

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use syncdex_core::{ClientConfig, Document, Result, SearchRequest};

use crate::version::EngineVersion;

// ============================================================================
// Routing
// ============================================================================

/// Where a single document lives: index, type, id, and optional parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Routing {
    /// Index name.
    pub index: String,
    /// Document type.
    pub doc_type: String,
    /// Document id.
    pub id: String,
    /// Parent document id. Never empty when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

impl Routing {
    /// Routing without a parent.
    pub fn new(
        index: impl Into<String>,
        doc_type: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Self {
            index: index.into(),
            doc_type: doc_type.into(),
            id: id.into(),
            parent: None,
        }
    }

    /// Attach a parent id. Blank ids are dropped rather than sent.
    pub fn with_parent(mut self, parent: Option<String>) -> Self {
        self.parent = parent.filter(|p| !p.trim().is_empty());
        self
    }

    /// Bulk action metadata (`_index`, `_type`, `_id`, `parent`).
    pub fn bulk_metadata(&self) -> Map<String, Value> {
        let mut meta = Map::new();
        meta.insert("_index".into(), json!(self.index));
        meta.insert("_type".into(), json!(self.doc_type));
        meta.insert("_id".into(), json!(self.id));
        if let Some(ref parent) = self.parent {
            meta.insert("parent".into(), json!(parent));
        }
        meta
    }
}

// ============================================================================
// Bulk
// ============================================================================

/// One operation in a bulk batch.
#[derive(Debug, Clone, PartialEq)]
pub enum BulkOperation {
    /// Index (create or replace) a document.
    Index {
        /// Target of the operation
        routing: Routing,
        /// Serialized record
        data: Document,
    },
    /// Delete a document.
    Delete {
        /// Target of the operation
        routing: Routing,
    },
}

impl BulkOperation {
    /// Build an index operation.
    pub fn index(routing: Routing, data: Document) -> Self {
        BulkOperation::Index { routing, data }
    }

    /// Routing of the operation.
    pub fn routing(&self) -> &Routing {
        match self {
            BulkOperation::Index { routing, .. } | BulkOperation::Delete { routing } => routing,
        }
    }

    /// Name of the bulk action (`index` or `delete`).
    pub fn action(&self) -> &'static str {
        match self {
            BulkOperation::Index { .. } => "index",
            BulkOperation::Delete { .. } => "delete",
        }
    }

    /// The operation in its combined form:
    /// `{"index": {"data": {...}, "_id", "_type", "_index", "parent"?}}`.
    pub fn to_value(&self) -> Value {
        let mut meta = self.routing().bulk_metadata();
        if let BulkOperation::Index { data, .. } = self {
            meta.insert("data".into(), Value::Object(data.clone()));
        }
        json!({ self.action(): meta })
    }

    /// The operation as bulk-API NDJSON lines (action line, then source
    /// line for index operations).
    pub fn to_ndjson(&self) -> Result<String> {
        let action = json!({ self.action(): self.routing().bulk_metadata() });
        let mut out = serde_json::to_string(&action)?;
        out.push('\n');
        if let BulkOperation::Index { data, .. } = self {
            out.push_str(&serde_json::to_string(data)?);
            out.push('\n');
        }
        Ok(out)
    }
}

/// Raw outcome of a bulk call.
///
/// Each item carries its own status; the batch as a whole is not judged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkResponse {
    /// Milliseconds the engine spent on the batch.
    #[serde(default)]
    pub took: u64,
    /// Whether any item failed.
    #[serde(default)]
    pub errors: bool,
    /// Per-item results, in request order.
    #[serde(default)]
    pub items: Vec<Value>,
}

impl BulkResponse {
    /// Whether the engine flagged any failed item.
    pub fn has_errors(&self) -> bool {
        self.errors || self.failed_items().next().is_some()
    }

    /// Items whose result carries an error or a non-2xx status.
    pub fn failed_items(&self) -> impl Iterator<Item = &Value> {
        self.items.iter().filter(|item| {
            item.as_object()
                .and_then(|ops| ops.values().next())
                .is_some_and(|result| {
                    result.get("error").is_some_and(|e| !e.is_null())
                        || result
                            .get("status")
                            .and_then(Value::as_u64)
                            .is_some_and(|s| !(200..300).contains(&s))
                })
        })
    }
}

/// Outcome of a single-document delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The document existed and was removed.
    Deleted,
    /// The document was not in the index.
    NotFound,
}

// ============================================================================
// SearchClient
// ============================================================================

/// Search engine primitives used by Syncdex.
///
/// Implementations must be safe to share between concurrent callers; no
/// additional locking happens above this trait.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Engine info document (`GET /`).
    async fn info(&self) -> Result<Value>;

    /// Version reported by the engine.
    async fn engine_version(&self) -> Result<EngineVersion> {
        let info = self.info().await?;
        let number = info
            .pointer("/version/number")
            .and_then(Value::as_str)
            .unwrap_or_default();
        EngineVersion::parse(number)
    }

    /// Index (create or replace) one document.
    async fn index_document(&self, document: &Document, routing: &Routing) -> Result<Value>;

    /// Delete one document. A missing document is reported, not an error.
    async fn delete_document(&self, routing: &Routing) -> Result<DeleteOutcome>;

    /// Execute a bulk batch and return its raw per-item outcome.
    async fn bulk(&self, operations: &[BulkOperation]) -> Result<BulkResponse>;

    /// Execute a search request and return the raw engine response.
    async fn search(&self, request: &SearchRequest) -> Result<Value>;

    /// Execute a suggest request against one index.
    async fn suggest(&self, index: &str, body: &Value) -> Result<Value>;

    /// Create an index with the given settings/mappings.
    async fn create_index(&self, index: &str, settings: &Value) -> Result<()>;

    /// Delete an index. Returns `false` when it did not exist.
    async fn delete_index(&self, index: &str) -> Result<bool>;

    /// Check whether an index exists.
    async fn index_exists(&self, index: &str) -> Result<bool>;
}

// ============================================================================
// Factories and cached handles
// ============================================================================

/// Creates clients from connection config.
pub trait ClientFactory: Send + Sync {
    /// Connect using the given config.
    fn connect(&self, config: &ClientConfig) -> Result<Arc<dyn SearchClient>>;
}

/// Factory producing HTTP clients.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpClientFactory;

impl ClientFactory for HttpClientFactory {
    fn connect(&self, config: &ClientConfig) -> Result<Arc<dyn SearchClient>> {
        Ok(Arc::new(crate::http::HttpSearchClient::new(config)?))
    }
}

/// Factory handing out one pre-built client regardless of config.
#[derive(Clone)]
pub struct StaticClientFactory {
    client: Arc<dyn SearchClient>,
}

impl StaticClientFactory {
    /// Wrap an existing client.
    pub fn new(client: Arc<dyn SearchClient>) -> Self {
        Self { client }
    }
}

impl ClientFactory for StaticClientFactory {
    fn connect(&self, _config: &ClientConfig) -> Result<Arc<dyn SearchClient>> {
        Ok(Arc::clone(&self.client))
    }
}

impl std::fmt::Debug for StaticClientFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticClientFactory").finish_non_exhaustive()
    }
}

/// Lazily created, cached client for one registration.
///
/// The first [`get`](Self::get) connects; later calls return the same
/// handle, so every caller sharing a registration shares one client.
pub struct CachedClient {
    config: ClientConfig,
    factory: Arc<dyn ClientFactory>,
    cell: OnceLock<Arc<dyn SearchClient>>,
}

impl CachedClient {
    /// Create a handle; nothing connects until first use.
    pub fn new(config: ClientConfig, factory: Arc<dyn ClientFactory>) -> Self {
        Self {
            config,
            factory,
            cell: OnceLock::new(),
        }
    }

    /// The merged connection config.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Whether the client has been created yet.
    pub fn is_connected(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Get the client, creating it on first use.
    pub fn get(&self) -> Result<Arc<dyn SearchClient>> {
        if let Some(client) = self.cell.get() {
            return Ok(Arc::clone(client));
        }
        let client = self.factory.connect(&self.config)?;
        log::debug!("Connected search client to {}", self.config.resolved_url());
        Ok(Arc::clone(self.cell.get_or_init(|| client)))
    }
}

impl std::fmt::Debug for CachedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedClient")
            .field("config", &self.config)
            .field("connected", &self.is_connected())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
