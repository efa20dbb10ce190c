//! Per-model sync engine.
//!
//! [`SyncEngine`] mirrors one model's records into its index and answers
//! queries against it:
//!
//! - [`index_one`](SyncEngine::index_one) / [`remove_one`](SyncEngine::remove_one)
//!   propagate a single record
//! - [`bulk_index`](SyncEngine::bulk_index) sends a batch in one call
//! - [`reindex_all`](SyncEngine::reindex_all) resets the index and walks the
//!   primary store with an id cursor
//! - [`search`](SyncEngine::search), [`all`](SyncEngine::all) and
//!   [`completion`](SyncEngine::completion) query it
//!
//! Engine failures are returned to the caller as-is. Nothing is retried.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use syncdex_client::{BulkOperation, BulkResponse, DeleteOutcome, EngineVersion, Routing, SearchClient};
use syncdex_core::record::value_to_id;
use syncdex_core::util::clean;
use syncdex_core::{DocumentStore, Error, Indexable, Query, Result, SearchOptions, SearchRequest};

use crate::index::ManagedIndex;
use crate::registration::ModelRegistration;
use crate::response::Response;

/// Default page size of a full reindex.
pub const INDEX_STEP: usize = 100;

/// Default completion-suggester field.
pub const DEFAULT_SUGGEST_FIELD: &str = "suggest";

/// Summary of a full reindex.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReindexStats {
    /// Batches processed, including a trailing empty one.
    pub batches: usize,
    /// Records read from the primary store.
    pub records: usize,
    /// Bulk items the engine reported as failed.
    pub failed_items: usize,
}

/// Sync engine for one model.
pub struct SyncEngine<T> {
    registration: Arc<ModelRegistration>,
    store: Arc<dyn DocumentStore<T>>,
}

impl<T> Clone for SyncEngine<T> {
    fn clone(&self) -> Self {
        Self {
            registration: Arc::clone(&self.registration),
            store: Arc::clone(&self.store),
        }
    }
}

impl<T> SyncEngine<T>
where
    T: Indexable + DeserializeOwned + 'static,
{
    /// Bind a registration to the store holding its records.
    pub fn new(registration: Arc<ModelRegistration>, store: Arc<dyn DocumentStore<T>>) -> Self {
        Self {
            registration,
            store,
        }
    }

    /// The model registration.
    pub fn registration(&self) -> &Arc<ModelRegistration> {
        &self.registration
    }

    /// The primary store.
    pub fn store(&self) -> &Arc<dyn DocumentStore<T>> {
        &self.store
    }

    /// Lifecycle handle for the model's index.
    pub fn index(&self) -> ManagedIndex {
        self.registration.index()
    }

    fn client(&self) -> Result<Arc<dyn SearchClient>> {
        self.registration.client()
    }

    /// Version of the connected engine.
    pub async fn engine_version(&self) -> Result<EngineVersion> {
        self.client()?.engine_version().await
    }

    /// Whether the connected engine supports completion suggesters.
    pub async fn completion_supported(&self) -> Result<bool> {
        Ok(self.engine_version().await?.supports_completion())
    }

    // ------------------------------------------------------------------------
    // Routing
    // ------------------------------------------------------------------------

    /// Parent id of a record.
    ///
    /// For child models the record's [`Indexable::parent_id`] wins, then the
    /// configured parent field. A child record without either is an error.
    pub fn parent_id_for(&self, record: &T) -> Result<Option<String>> {
        let explicit = record.parent_id().filter(|p| !p.trim().is_empty());
        let Some(field) = self.registration.parent_field() else {
            return Ok(explicit);
        };
        let parent = explicit.or_else(|| {
            record
                .fields()
                .get(field)
                .map(value_to_id)
                .filter(|p| !p.trim().is_empty())
        });
        match parent {
            Some(parent) => Ok(Some(parent)),
            None => Err(Error::missing_parent(self.registration.model(), record.id())),
        }
    }

    /// Routing of a record: index, type, id, and parent when present.
    pub fn routing_for(&self, record: &T) -> Result<Routing> {
        Ok(Routing::new(
            self.registration.index_name(),
            self.registration.type_name(),
            record.id(),
        )
        .with_parent(self.parent_id_for(record)?))
    }

    // ------------------------------------------------------------------------
    // Propagation
    // ------------------------------------------------------------------------

    /// Index one record.
    ///
    /// Records that should not be indexed are skipped without an engine
    /// call; `None` is returned for them.
    pub async fn index_one(&self, record: &T) -> Result<Option<Value>> {
        if !record.should_index() {
            log::debug!(
                "Skipping {} '{}': not indexable",
                self.registration.model(),
                record.id()
            );
            return Ok(None);
        }
        let routing = self.routing_for(record)?;
        let result = self
            .client()?
            .index_document(&record.as_indexed_document(), &routing)
            .await?;
        log::debug!("Indexed {}/{}/{}", routing.index, routing.doc_type, routing.id);
        Ok(Some(result))
    }

    /// Remove one record's document.
    ///
    /// A document already absent from the index is not an error; the
    /// outcome says which case occurred.
    pub async fn remove_one(&self, record: &T) -> Result<DeleteOutcome> {
        let routing = self.routing_for(record)?;
        let outcome = self.client()?.delete_document(&routing).await?;
        if outcome == DeleteOutcome::NotFound {
            log::debug!(
                "Document {}/{}/{} was already absent",
                routing.index,
                routing.doc_type,
                routing.id
            );
        }
        Ok(outcome)
    }

    /// Index a batch of records in one bulk call.
    ///
    /// Records that should not be indexed are dropped first. When nothing is
    /// left no call is made and `None` is returned. Otherwise the engine's
    /// per-item outcome is returned verbatim.
    pub async fn bulk_index(&self, records: &[T]) -> Result<Option<BulkResponse>> {
        let operations = records
            .iter()
            .filter(|record| record.should_index())
            .map(|record| {
                Ok(BulkOperation::index(
                    self.routing_for(record)?,
                    record.as_indexed_document(),
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        if operations.is_empty() {
            log::debug!(
                "Nothing to bulk index for {} ({} records skipped)",
                self.registration.model(),
                records.len()
            );
            return Ok(None);
        }

        let response = self.client()?.bulk(&operations).await?;
        let failed = response.failed_items().count();
        if failed > 0 {
            log::warn!(
                "Bulk index of {} into '{}': {failed} of {} items failed",
                self.registration.model(),
                self.registration.index_name(),
                operations.len()
            );
        }
        Ok(Some(response))
    }

    /// Rebuild the index from the primary store without a batch callback.
    ///
    /// [`INDEX_STEP`] is the customary batch size.
    pub async fn reindex_all(&self, batch_size: usize) -> Result<ReindexStats> {
        self.reindex_all_with(batch_size, |_, _, _| {}).await
    }

    /// Rebuild the index from the primary store.
    ///
    /// The index is reset first so documents of deleted records cannot
    /// linger. The store is then read in ascending id order, `batch_size`
    /// records at a time, each page strictly after the last id of the
    /// previous one, and every page goes through
    /// [`bulk_index`](Self::bulk_index). `on_batch(total, index, records)`
    /// runs after each batch.
    ///
    /// The batch count is fixed up front at `count / batch_size + 1`, so a
    /// record count that is an exact multiple of the batch size ends with an
    /// empty batch (and an `on_batch` call for it).
    ///
    /// # Errors
    ///
    /// A zero batch size is a configuration error. Any store or engine
    /// failure stops the loop.
    pub async fn reindex_all_with<F>(&self, batch_size: usize, mut on_batch: F) -> Result<ReindexStats>
    where
        F: FnMut(usize, usize, &[T]),
    {
        if batch_size == 0 {
            return Err(Error::config("Reindex batch size must be greater than zero"));
        }

        self.index().reset().await?;

        let total = usize::try_from(self.store.count().await?).unwrap_or(usize::MAX);
        let steps = total / batch_size + 1;
        log::info!(
            "Reindexing {total} {} records into '{}' in {steps} batches",
            self.registration.model(),
            self.registration.index_name()
        );

        let mut stats = ReindexStats::default();
        let mut last_id: Option<String> = None;
        for step in 0..steps {
            let records = self.store.page_after(last_id.as_deref(), batch_size).await?;
            if let Some(last) = records.last() {
                last_id = Some(last.id());
            }

            if let Some(response) = self.bulk_index(&records).await? {
                stats.failed_items += response.failed_items().count();
            }
            stats.batches += 1;
            stats.records += records.len();
            on_batch(steps, step, &records);
            log::debug!("Reindex batch {}/{steps}: {} records", step + 1, records.len());
        }

        log::info!(
            "Reindexed {} {} records into '{}'",
            stats.records,
            self.registration.model(),
            self.registration.index_name()
        );
        Ok(stats)
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Search this model's index.
    ///
    /// Text is cleaned into the query-string shorthand and `page`/`per_page`
    /// become `from`/`size`. The request targets this model's index and, unless
    /// `include_type` is `false`, its document type.
    pub fn search(&self, query: impl Into<Query>, options: &SearchOptions) -> Result<Response<T>> {
        let mut request = query.into().into_request();
        request.paginate(options);
        request.index = Some(self.registration.index_name().to_string());
        request.doc_type = if options.include_type == Some(false) {
            None
        } else {
            Some(self.registration.type_name().to_string())
        };

        let wrapper = options.wrapper.unwrap_or(self.registration.wrapper());
        Ok(
            Response::new(self.client()?, request, options.clone(), wrapper)
                .with_store(Arc::clone(&self.store)),
        )
    }

    /// Every document of this model.
    pub fn all(&self, options: &SearchOptions) -> Result<Response<T>> {
        self.search(SearchRequest::match_all(), options)
    }

    /// Completion suggestions for `text` from the given suggester field.
    ///
    /// # Errors
    ///
    /// Engines at or before 0.90.2 have no completion suggester; the call
    /// fails with [`Error::Unsupported`] without reaching the engine.
    pub async fn completion(&self, text: &str, field: &str) -> Result<Vec<Value>> {
        let client = self.client()?;
        let version = client.engine_version().await?;
        if !version.supports_completion() {
            return Err(Error::unsupported("Completion", version.to_string()));
        }

        let body = json!({
            "q": {
                "text": clean(text),
                "completion": { "field": field }
            }
        });
        let results = client
            .suggest(self.registration.index_name(), &body)
            .await?;
        Ok(results
            .pointer("/q/0/options")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }
}

impl<T> std::fmt::Debug for SyncEngine<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("model", &self.registration.model())
            .field("index", &self.registration.index_name())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
