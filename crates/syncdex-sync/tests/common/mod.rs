//! Common test utilities and harness for Syncdex integration tests.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use syncdex_client::{MemorySearchClient, StaticClientFactory};
use syncdex_core::{ChildOptions, Document, GlobalConfig, Indexable, ModelOptions};
use syncdex_sync::{MemoryStore, SearchContext, SyncEngine};

/// A standalone model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "published_by_default")]
    pub published: bool,
    #[serde(skip)]
    pub destroyed: bool,
}

fn published_by_default() -> bool {
    true
}

impl Article {
    pub fn new(id: u32, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            tags: Vec::new(),
            published: true,
            destroyed: false,
        }
    }

    pub fn unpublished(mut self) -> Self {
        self.published = false;
        self
    }

    pub fn destroyed(mut self) -> Self {
        self.destroyed = true;
        self
    }
}

impl Indexable for Article {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn fields(&self) -> Document {
        let mut doc = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_object().cloned())
            .unwrap_or_default();
        doc.insert("_id".into(), json!(self.id));
        doc.insert("created_at".into(), json!("2024-01-01T00:00:00Z"));
        doc.insert("updated_at".into(), json!("2024-01-02T00:00:00Z"));
        doc
    }

    fn should_index(&self) -> bool {
        self.published
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

/// A child model stored in the article index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubArticle {
    pub id: String,
    pub name: String,
    pub parent_id: Option<String>,
}

impl SubArticle {
    pub fn new(id: u32, name: &str, parent_id: Option<u32>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            parent_id: parent_id.map(|p| p.to_string()),
        }
    }
}

impl Indexable for SubArticle {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn fields(&self) -> Document {
        serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_object().cloned())
            .unwrap_or_default()
    }
}

/// Build `count` published articles with ids `1..=count`.
pub fn articles(count: u32) -> Vec<Article> {
    (1..=count)
        .map(|i| Article::new(i, &format!("Article {i}")))
        .collect()
}

/// Test harness: an in-memory engine behind a search context.
pub struct TestHarness {
    /// In-memory search engine shared by every registration
    pub client: Arc<MemorySearchClient>,
    /// Context with nothing registered yet
    pub context: SearchContext,
}

impl TestHarness {
    /// Harness with default global configuration.
    pub fn new() -> Self {
        Self::with_config(GlobalConfig::default())
    }

    /// Harness with the given global configuration.
    pub fn with_config(config: GlobalConfig) -> Self {
        let client = Arc::new(MemorySearchClient::new());
        let context = SearchContext::with_factory(
            config,
            Arc::new(StaticClientFactory::new(client.clone())),
        );
        Self { client, context }
    }

    /// Register `Article` and return an engine over the given records.
    pub fn article_engine(
        &mut self,
        options: ModelOptions,
        records: Vec<Article>,
    ) -> (SyncEngine<Article>, Arc<MemoryStore<Article>>) {
        self.context.register_model("Article", options).unwrap();
        let store = Arc::new(MemoryStore::from_records(records));
        let engine = self.context.engine("Article", store.clone()).unwrap();
        (engine, store)
    }

    /// Register `SubArticle` under `Article` and return its engine.
    pub fn sub_article_engine(
        &mut self,
        options: ChildOptions,
        records: Vec<SubArticle>,
    ) -> (SyncEngine<SubArticle>, Arc<MemoryStore<SubArticle>>) {
        self.context
            .register_child("SubArticle", "Article", options)
            .unwrap();
        let store = Arc::new(MemoryStore::from_records(records));
        let engine = self.context.engine("SubArticle", store.clone()).unwrap();
        (engine, store)
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
