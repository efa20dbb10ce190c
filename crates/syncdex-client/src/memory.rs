//! In-memory [`SearchClient`].
//!
//! Holds indexes and documents in process and records every call, so the
//! sync engine can be exercised without a running engine. Search supports
//! the query-string shorthand only: each term must appear somewhere in a
//! document's source (case-insensitive); structured bodies match everything.
//! Canned responses and injected failures cover the rest.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::{Value, json};
use syncdex_core::{Document, Error, Result, SearchRequest};

use crate::client::{BulkOperation, BulkResponse, DeleteOutcome, Routing, SearchClient};

/// Version reported by [`MemorySearchClient::new`].
pub const DEFAULT_MEMORY_VERSION: &str = "1.7.5";

/// Page size applied when a search request carries none.
const DEFAULT_SIZE: usize = 10;

/// Kind of a recorded client call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    /// `info`
    Info,
    /// `index_document`
    IndexDocument,
    /// `delete_document`
    DeleteDocument,
    /// `bulk`
    Bulk,
    /// `search`
    Search,
    /// `suggest`
    Suggest,
    /// `create_index`
    CreateIndex,
    /// `delete_index`
    DeleteIndex,
    /// `index_exists`
    IndexExists,
}

/// A call received by [`MemorySearchClient`], with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    /// Engine info request.
    Info,
    /// Single-document index.
    IndexDocument {
        /// Target
        routing: Routing,
        /// Source sent
        document: Document,
    },
    /// Single-document delete.
    DeleteDocument {
        /// Target
        routing: Routing,
    },
    /// Bulk batch.
    Bulk {
        /// Operations in request order
        operations: Vec<BulkOperation>,
    },
    /// Search request.
    Search {
        /// Request as received
        request: SearchRequest,
    },
    /// Suggest request.
    Suggest {
        /// Target index
        index: String,
        /// Suggest body
        body: Value,
    },
    /// Index creation.
    CreateIndex {
        /// Index name
        index: String,
        /// Settings/mappings body
        settings: Value,
    },
    /// Index deletion.
    DeleteIndex {
        /// Index name
        index: String,
    },
    /// Index existence check.
    IndexExists {
        /// Index name
        index: String,
    },
}

impl RecordedCall {
    /// The kind of this call.
    pub fn kind(&self) -> CallKind {
        match self {
            RecordedCall::Info => CallKind::Info,
            RecordedCall::IndexDocument { .. } => CallKind::IndexDocument,
            RecordedCall::DeleteDocument { .. } => CallKind::DeleteDocument,
            RecordedCall::Bulk { .. } => CallKind::Bulk,
            RecordedCall::Search { .. } => CallKind::Search,
            RecordedCall::Suggest { .. } => CallKind::Suggest,
            RecordedCall::CreateIndex { .. } => CallKind::CreateIndex,
            RecordedCall::DeleteIndex { .. } => CallKind::DeleteIndex,
            RecordedCall::IndexExists { .. } => CallKind::IndexExists,
        }
    }
}

#[derive(Debug, Clone)]
struct StoredDocument {
    doc_type: String,
    id: String,
    source: Document,
    parent: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct IndexState {
    settings: Value,
    // Insertion order; replacing a document keeps its slot.
    docs: Vec<StoredDocument>,
}

impl IndexState {
    fn position(&self, doc_type: &str, id: &str) -> Option<usize> {
        self.docs
            .iter()
            .position(|d| d.doc_type == doc_type && d.id == id)
    }

    /// Store a document; returns `true` when it was newly created.
    fn upsert(&mut self, routing: &Routing, source: Document) -> bool {
        let stored = StoredDocument {
            doc_type: routing.doc_type.clone(),
            id: routing.id.clone(),
            source,
            parent: routing.parent.clone(),
        };
        match self.position(&routing.doc_type, &routing.id) {
            Some(pos) => {
                self.docs[pos] = stored;
                false
            }
            None => {
                self.docs.push(stored);
                true
            }
        }
    }

    fn remove(&mut self, doc_type: &str, id: &str) -> bool {
        match self.position(doc_type, id) {
            Some(pos) => {
                self.docs.remove(pos);
                true
            }
            None => false,
        }
    }
}

#[derive(Debug)]
struct Failure {
    kind: CallKind,
    nth: usize,
    status: u16,
}

#[derive(Debug, Default)]
struct State {
    version: String,
    indexes: BTreeMap<String, IndexState>,
    calls: Vec<RecordedCall>,
    search_responses: VecDeque<Value>,
    suggest_responses: VecDeque<Value>,
    failures: Vec<Failure>,
    rejected: HashSet<String>,
}

impl State {
    /// Record a call and apply any failure injected for it.
    fn record(&mut self, call: RecordedCall) -> Result<()> {
        let kind = call.kind();
        self.calls.push(call);
        let seen = self.calls.iter().filter(|c| c.kind() == kind).count();
        match self
            .failures
            .iter()
            .find(|f| f.kind == kind && f.nth == seen)
        {
            Some(failure) => Err(Error::engine(
                failure.status,
                format!("injected failure for {kind:?} call #{seen}"),
            )),
            None => Ok(()),
        }
    }

    fn index_mut(&mut self, index: &str) -> &mut IndexState {
        self.indexes
            .entry(index.to_string())
            .or_insert_with(|| IndexState {
                settings: json!({}),
                docs: Vec::new(),
            })
    }
}

/// In-memory search engine stand-in.
///
/// ```rust
/// use syncdex_client::{MemorySearchClient, SearchClient};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let client = MemorySearchClient::with_version("0.90.13");
/// let version = client.engine_version().await.unwrap();
/// assert!(version.supports_completion());
/// # });
/// ```
#[derive(Debug)]
pub struct MemorySearchClient {
    state: Mutex<State>,
}

impl MemorySearchClient {
    /// Empty engine reporting [`DEFAULT_MEMORY_VERSION`].
    pub fn new() -> Self {
        Self::with_version(DEFAULT_MEMORY_VERSION)
    }

    /// Empty engine reporting the given version string.
    pub fn with_version(version: &str) -> Self {
        Self {
            state: Mutex::new(State {
                version: version.to_string(),
                ..Default::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Change the reported version.
    pub fn set_version(&self, version: &str) {
        self.lock().version = version.to_string();
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    /// Number of calls of one kind.
    pub fn count(&self, kind: CallKind) -> usize {
        self.lock().calls.iter().filter(|c| c.kind() == kind).count()
    }

    /// Forget recorded calls (stored data is kept).
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Fail the `nth` (1-based) call of `kind` with an engine error.
    pub fn fail_nth(&self, kind: CallKind, nth: usize, status: u16) {
        self.lock().failures.push(Failure { kind, nth, status });
    }

    /// Reject documents with this id in bulk batches (per-item 400).
    pub fn reject_document(&self, id: impl Into<String>) {
        self.lock().rejected.insert(id.into());
    }

    /// Queue a response returned verbatim by the next `search` call.
    pub fn push_search_response(&self, response: Value) {
        self.lock().search_responses.push_back(response);
    }

    /// Queue a response returned verbatim by the next `suggest` call.
    pub fn push_suggest_response(&self, response: Value) {
        self.lock().suggest_responses.push_back(response);
    }

    /// Create an index without recording a call.
    pub fn insert_index(&self, index: &str, settings: Value) {
        self.lock().index_mut(index).settings = settings;
    }

    /// Store a document without recording a call.
    pub fn insert_document(&self, routing: &Routing, source: Document) {
        self.lock().index_mut(&routing.index).upsert(routing, source);
    }

    /// Whether an index exists.
    pub fn has_index(&self, index: &str) -> bool {
        self.lock().indexes.contains_key(index)
    }

    /// Names of all indexes, sorted.
    pub fn index_names(&self) -> Vec<String> {
        self.lock().indexes.keys().cloned().collect()
    }

    /// Settings an index was created with.
    pub fn index_settings(&self, index: &str) -> Option<Value> {
        self.lock().indexes.get(index).map(|i| i.settings.clone())
    }

    /// Stored source of one document.
    pub fn document(&self, index: &str, doc_type: &str, id: &str) -> Option<Document> {
        let state = self.lock();
        let idx = state.indexes.get(index)?;
        idx.position(doc_type, id)
            .map(|pos| idx.docs[pos].source.clone())
    }

    /// Parent id a document was stored with.
    pub fn document_parent(&self, index: &str, doc_type: &str, id: &str) -> Option<String> {
        let state = self.lock();
        let idx = state.indexes.get(index)?;
        idx.position(doc_type, id)
            .and_then(|pos| idx.docs[pos].parent.clone())
    }

    /// Ids of the documents in an index, in insertion order.
    pub fn document_ids(&self, index: &str) -> Vec<String> {
        self.lock()
            .indexes
            .get(index)
            .map(|i| i.docs.iter().map(|d| d.id.clone()).collect())
            .unwrap_or_default()
    }

    /// Number of documents in an index.
    pub fn document_count(&self, index: &str) -> usize {
        self.lock()
            .indexes
            .get(index)
            .map(|i| i.docs.len())
            .unwrap_or(0)
    }
}

impl Default for MemorySearchClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Lowercased terms of a query string; `None` matches everything.
fn query_terms(q: Option<&str>) -> Option<Vec<String>> {
    let q = q?.trim();
    if q.is_empty() || q == "*" {
        return None;
    }
    Some(q.split_whitespace().map(str::to_lowercase).collect())
}

fn collect_text(value: &Value, out: &mut String) {
    match value {
        Value::String(s) => {
            out.push_str(&s.to_lowercase());
            out.push(' ');
        }
        Value::Array(items) => items.iter().for_each(|v| collect_text(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_text(v, out)),
        Value::Null => {}
        other => {
            out.push_str(&other.to_string());
            out.push(' ');
        }
    }
}

fn matches_terms(source: &Document, terms: &[String]) -> bool {
    let mut text = String::new();
    source.values().for_each(|v| collect_text(v, &mut text));
    terms.iter().all(|term| text.contains(term.as_str()))
}

/// Completion inputs of a suggest field: a string, a list of strings, or
/// `{"input": ...}`.
fn completion_inputs(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items.iter().flat_map(completion_inputs).collect(),
        Value::Object(map) => map.get("input").map(completion_inputs).unwrap_or_default(),
        _ => Vec::new(),
    }
}

#[async_trait]
impl SearchClient for MemorySearchClient {
    async fn info(&self) -> Result<Value> {
        let mut state = self.lock();
        state.record(RecordedCall::Info)?;
        Ok(json!({
            "name": "memory",
            "version": { "number": state.version }
        }))
    }

    async fn index_document(&self, document: &Document, routing: &Routing) -> Result<Value> {
        let mut state = self.lock();
        state.record(RecordedCall::IndexDocument {
            routing: routing.clone(),
            document: document.clone(),
        })?;
        let created = state
            .index_mut(&routing.index)
            .upsert(routing, document.clone());
        Ok(json!({
            "_index": routing.index,
            "_type": routing.doc_type,
            "_id": routing.id,
            "created": created
        }))
    }

    async fn delete_document(&self, routing: &Routing) -> Result<DeleteOutcome> {
        let mut state = self.lock();
        state.record(RecordedCall::DeleteDocument {
            routing: routing.clone(),
        })?;
        let removed = state
            .indexes
            .get_mut(&routing.index)
            .is_some_and(|idx| idx.remove(&routing.doc_type, &routing.id));
        Ok(if removed {
            DeleteOutcome::Deleted
        } else {
            DeleteOutcome::NotFound
        })
    }

    async fn bulk(&self, operations: &[BulkOperation]) -> Result<BulkResponse> {
        let mut state = self.lock();
        state.record(RecordedCall::Bulk {
            operations: operations.to_vec(),
        })?;

        let mut response = BulkResponse {
            took: 1,
            ..Default::default()
        };
        for op in operations {
            let routing = op.routing();
            let mut result = routing.bulk_metadata();
            match op {
                BulkOperation::Index { .. } if state.rejected.contains(&routing.id) => {
                    result.insert("status".into(), json!(400));
                    result.insert(
                        "error".into(),
                        json!(format!("MapperParsingException[rejected document {}]", routing.id)),
                    );
                    response.errors = true;
                }
                BulkOperation::Index { data, .. } => {
                    let created = state
                        .index_mut(&routing.index)
                        .upsert(routing, data.clone());
                    result.insert("status".into(), json!(if created { 201 } else { 200 }));
                }
                BulkOperation::Delete { .. } => {
                    let found = state
                        .indexes
                        .get_mut(&routing.index)
                        .is_some_and(|idx| idx.remove(&routing.doc_type, &routing.id));
                    result.insert("found".into(), json!(found));
                    result.insert("status".into(), json!(if found { 200 } else { 404 }));
                }
            }
            response.items.push(json!({ op.action(): result }));
        }
        Ok(response)
    }

    async fn search(&self, request: &SearchRequest) -> Result<Value> {
        let mut state = self.lock();
        state.record(RecordedCall::Search {
            request: request.clone(),
        })?;
        if let Some(canned) = state.search_responses.pop_front() {
            return Ok(canned);
        }

        let targets: Vec<String> = match request.index.as_deref() {
            Some(list) if !list.trim().is_empty() && list != "_all" => list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            _ => state.indexes.keys().cloned().collect(),
        };

        let terms = query_terms(request.q.as_deref());
        let mut hits = Vec::new();
        for name in &targets {
            let Some(index) = state.indexes.get(name) else {
                if request.ignore_unavailable {
                    continue;
                }
                return Err(Error::engine(
                    404,
                    format!("IndexMissingException[[{name}] missing]"),
                ));
            };
            for doc in &index.docs {
                if request
                    .doc_type
                    .as_deref()
                    .is_some_and(|t| t != doc.doc_type)
                {
                    continue;
                }
                if terms
                    .as_deref()
                    .is_some_and(|terms| !matches_terms(&doc.source, terms))
                {
                    continue;
                }
                hits.push(json!({
                    "_index": name,
                    "_type": doc.doc_type,
                    "_id": doc.id,
                    "_score": 1.0,
                    "_source": doc.source
                }));
            }
        }

        let total = hits.len();
        let from = request.from.unwrap_or(0);
        let size = request.size.unwrap_or(DEFAULT_SIZE);
        let page: Vec<Value> = hits.into_iter().skip(from).take(size).collect();
        let max_score = if total > 0 { json!(1.0) } else { Value::Null };

        Ok(json!({
            "took": 1,
            "timed_out": false,
            "hits": {
                "total": total,
                "max_score": max_score,
                "hits": page
            }
        }))
    }

    async fn suggest(&self, index: &str, body: &Value) -> Result<Value> {
        let mut state = self.lock();
        state.record(RecordedCall::Suggest {
            index: index.to_string(),
            body: body.clone(),
        })?;
        if let Some(canned) = state.suggest_responses.pop_front() {
            return Ok(canned);
        }
        let Some(idx) = state.indexes.get(index) else {
            return Err(Error::engine(
                404,
                format!("IndexMissingException[[{index}] missing]"),
            ));
        };

        let mut response = serde_json::Map::new();
        if let Some(requests) = body.as_object() {
            for (name, request) in requests {
                let text = request.get("text").and_then(Value::as_str).unwrap_or("");
                let field = request
                    .pointer("/completion/field")
                    .and_then(Value::as_str)
                    .unwrap_or("suggest");
                let prefix = text.to_lowercase();
                let mut seen = HashSet::new();
                let options: Vec<Value> = idx
                    .docs
                    .iter()
                    .filter_map(|d| d.source.get(field))
                    .flat_map(completion_inputs)
                    .filter(|input| input.to_lowercase().starts_with(&prefix))
                    .filter(|input| seen.insert(input.clone()))
                    .map(|input| json!({ "text": input, "score": 1.0 }))
                    .collect();
                response.insert(
                    name.clone(),
                    json!([{
                        "text": text,
                        "offset": 0,
                        "length": text.chars().count(),
                        "options": options
                    }]),
                );
            }
        }
        Ok(Value::Object(response))
    }

    async fn create_index(&self, index: &str, settings: &Value) -> Result<()> {
        let mut state = self.lock();
        state.record(RecordedCall::CreateIndex {
            index: index.to_string(),
            settings: settings.clone(),
        })?;
        if state.indexes.contains_key(index) {
            return Err(Error::engine(
                400,
                format!("IndexAlreadyExistsException[[{index}] already exists]"),
            ));
        }
        state.index_mut(index).settings = settings.clone();
        Ok(())
    }

    async fn delete_index(&self, index: &str) -> Result<bool> {
        let mut state = self.lock();
        state.record(RecordedCall::DeleteIndex {
            index: index.to_string(),
        })?;
        Ok(state.indexes.remove(index).is_some())
    }

    async fn index_exists(&self, index: &str) -> Result<bool> {
        let mut state = self.lock();
        state.record(RecordedCall::IndexExists {
            index: index.to_string(),
        })?;
        Ok(state.indexes.contains_key(index))
    }
}

// ============================================================================
// Tests
// ============================================================================
