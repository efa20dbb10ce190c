//! Search context.
//!
//! [`SearchContext`] is the explicit home of what would otherwise be
//! process-wide state: the global configuration, the registry of indexes
//! and models, and every model registration.
//!
//! Registration takes `&mut self` and everything else takes `&self`, so all
//! models must be registered before the context is shared. After that it is
//! read-only.
//!
//! ```rust
//! use std::sync::Arc;
//! use syncdex_client::{MemorySearchClient, StaticClientFactory};
//! use syncdex_core::{ChildOptions, GlobalConfig, ModelOptions};
//! use syncdex_sync::SearchContext;
//!
//! let client = Arc::new(MemorySearchClient::new());
//! let mut context = SearchContext::with_factory(
//!     GlobalConfig::default(),
//!     Arc::new(StaticClientFactory::new(client)),
//! );
//! context.register_model("Article", ModelOptions::default()).unwrap();
//! context
//!     .register_child("SubArticle", "Article", ChildOptions::default())
//!     .unwrap();
//!
//! assert_eq!(context.registry().all_indexes(), vec!["articles"]);
//! assert_eq!(context.registry().all_models(), vec!["Article", "SubArticle"]);
//! ```

use std::sync::Arc;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use syncdex_client::{CachedClient, ClientFactory, HttpClientFactory, SearchClient};
use syncdex_core::config::{ChildOptions, GlobalConfig, ModelOptions};
use syncdex_core::{
    DocumentStore, Error, Indexable, Query, Registry, Result, SearchOptions, WrapperKind,
};

use crate::engine::SyncEngine;
use crate::registration::ModelRegistration;
use crate::response::Response;

/// Registry, configuration, and registrations of every searchable model.
pub struct SearchContext {
    config: GlobalConfig,
    registry: Registry,
    models: IndexMap<String, Arc<ModelRegistration>>,
    factory: Arc<dyn ClientFactory>,
    client: CachedClient,
}

impl SearchContext {
    /// Context connecting over HTTP.
    pub fn new(config: GlobalConfig) -> Self {
        Self::with_factory(config, Arc::new(HttpClientFactory))
    }

    /// Context creating clients through the given factory.
    pub fn with_factory(config: GlobalConfig, factory: Arc<dyn ClientFactory>) -> Self {
        let client = CachedClient::new(config.client.clone(), Arc::clone(&factory));
        Self {
            config,
            registry: Registry::new(),
            models: IndexMap::new(),
            factory,
            client,
        }
    }

    /// Global configuration.
    pub fn config(&self) -> &GlobalConfig {
        &self.config
    }

    /// Registered indexes and models.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Client built from the global connection config.
    pub fn client(&self) -> Result<Arc<dyn SearchClient>> {
        self.client.get()
    }

    /// Register a standalone model.
    ///
    /// Registering the same model again replaces its registration; the
    /// registry keeps a single entry.
    pub fn register_model(
        &mut self,
        model: &str,
        options: ModelOptions,
    ) -> Result<Arc<ModelRegistration>> {
        let registration = Arc::new(ModelRegistration::root(
            model,
            &options,
            &self.config,
            Arc::clone(&self.factory),
        )?);
        self.registry
            .register(registration.index_name(), registration.model());
        self.models
            .insert(model.to_string(), Arc::clone(&registration));
        Ok(registration)
    }

    /// Register a child model inside a registered parent's index.
    ///
    /// # Errors
    ///
    /// Fails when the parent is not registered or is itself a child.
    pub fn register_child(
        &mut self,
        model: &str,
        parent_model: &str,
        options: ChildOptions,
    ) -> Result<Arc<ModelRegistration>> {
        let parent = self.models.get(parent_model).cloned().ok_or_else(|| {
            Error::config(format!(
                "Child model '{model}' needs parent '{parent_model}' to be registered first"
            ))
        })?;
        let registration = Arc::new(ModelRegistration::child(model, parent, &options)?);
        self.registry
            .register(registration.index_name(), registration.model());
        self.models
            .insert(model.to_string(), Arc::clone(&registration));
        Ok(registration)
    }

    /// Registration of a model.
    pub fn registration(&self, model: &str) -> Option<&Arc<ModelRegistration>> {
        self.models.get(model)
    }

    /// Sync engine for a registered model.
    pub fn engine<T>(&self, model: &str, store: Arc<dyn DocumentStore<T>>) -> Result<SyncEngine<T>>
    where
        T: Indexable + DeserializeOwned + 'static,
    {
        let registration = self
            .registration(model)
            .ok_or_else(|| Error::config(format!("Model '{model}' is not registered")))?;
        Ok(SyncEngine::new(Arc::clone(registration), store))
    }

    /// Search across models.
    ///
    /// Normalized exactly like a per-model search. Unless the query names
    /// its own index, every registered index is targeted and missing ones
    /// are tolerated. Hits are shaped as typed records unless the options
    /// pick another wrapper; use [`Response::with_store`] for `reload`.
    pub fn search<T>(&self, query: impl Into<Query>, options: &SearchOptions) -> Result<Response<T>>
    where
        T: Indexable + DeserializeOwned + 'static,
    {
        let mut request = query.into().into_request();
        if request.index.is_none() {
            request.index = Some(self.registry.joined_indexes());
            request.ignore_unavailable = true;
        }
        request.paginate(options);

        let wrapper = options.wrapper.unwrap_or(WrapperKind::Typed);
        Ok(Response::new(self.client()?, request, options.clone(), wrapper))
    }

    /// Create the index of every registered model that did not opt out.
    ///
    /// Indexes already present are left untouched, and an index shared by
    /// a parent and its children is handled once. Returns the names of the
    /// indexes created.
    pub async fn create_all_indexes(&self) -> Result<Vec<String>> {
        let mut seen: Vec<String> = Vec::new();
        let mut created = Vec::new();
        for model in self.registry.all_models() {
            let Some(registration) = self.models.get(model) else {
                continue;
            };
            if registration.skip_create() || seen.iter().any(|i| i == registration.index_name()) {
                continue;
            }
            seen.push(registration.index_name().to_string());
            if registration.index().create().await? {
                created.push(registration.index_name().to_string());
            }
        }
        Ok(created)
    }

    /// Create all indexes when `autocreate_indexes` is on.
    pub async fn ensure_indexes(&self) -> Result<Vec<String>> {
        if !self.config.autocreate_indexes {
            log::debug!("Index auto-creation is disabled");
            return Ok(Vec::new());
        }
        self.create_all_indexes().await
    }
}

impl std::fmt::Debug for SearchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchContext")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("models", &self.models.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
