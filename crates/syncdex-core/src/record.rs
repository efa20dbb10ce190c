//! Record adapter and primary-store collaborator traits.
//!
//! Syncdex knows nothing about an application's schema. A record type takes
//! part by implementing [`Indexable`], and a primary store exposes the
//! handful of queries the engine needs by implementing [`DocumentStore`].
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use syncdex_core::{Document, Indexable};
//!
//! struct Article {
//!     id: String,
//!     name: String,
//!     published: bool,
//! }
//!
//! impl Indexable for Article {
//!     fn id(&self) -> String {
//!         self.id.clone()
//!     }
//!
//!     fn fields(&self) -> Document {
//!         let mut doc = Document::new();
//!         doc.insert("_id".into(), json!(self.id));
//!         doc.insert("name".into(), json!(self.name));
//!         doc.insert("created_at".into(), json!("2024-01-01T00:00:00Z"));
//!         doc
//!     }
//!
//!     fn should_index(&self) -> bool {
//!         self.published
//!     }
//! }
//!
//! let article = Article { id: "1".into(), name: "Hello".into(), published: true };
//! let doc = article.as_indexed_document();
//! assert!(doc.contains_key("name"));
//! assert!(!doc.contains_key("_id"));
//! assert!(!doc.contains_key("created_at"));
//! ```

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::Result;

/// Serialized field set of one record.
pub type Document = Map<String, Value>;

/// Store bookkeeping fields never sent to the search engine.
pub const INTERNAL_FIELDS: &[&str] = &["_id", "c_at", "u_at", "created_at", "updated_at"];

/// A record that can be mirrored into a search index.
pub trait Indexable: Send + Sync {
    /// Primary-store identifier, in string form.
    fn id(&self) -> String;

    /// Full field set of the record as stored.
    fn fields(&self) -> Document;

    /// Document sent to the engine: [`fields`](Self::fields) minus
    /// [`INTERNAL_FIELDS`].
    fn as_indexed_document(&self) -> Document {
        let mut doc = self.fields();
        for field in INTERNAL_FIELDS {
            doc.remove(*field);
        }
        doc
    }

    /// Whether this record belongs in the index at all.
    fn should_index(&self) -> bool {
        true
    }

    /// Parent document id for parent/child routing.
    ///
    /// Child models that keep the parent id in a plain field can leave this
    /// at its default; the engine then reads the configured parent field
    /// from [`fields`](Self::fields).
    fn parent_id(&self) -> Option<String> {
        None
    }

    /// Whether the record has been removed from the primary store.
    fn is_destroyed(&self) -> bool {
        false
    }
}

impl Indexable for Document {
    fn id(&self) -> String {
        ["id", "_id"]
            .iter()
            .find_map(|key| self.get(*key))
            .map(value_to_id)
            .unwrap_or_default()
    }

    fn fields(&self) -> Document {
        self.clone()
    }
}

/// Render an id-like JSON value as a string (`"abc"` → `abc`, `42` → `42`).
pub fn value_to_id(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Object(map) => map
            .get("$oid")
            .map(value_to_id)
            .unwrap_or_else(|| value.to_string()),
        other => other.to_string(),
    }
}

/// The primary document store, as seen by the sync engine.
///
/// Implementations wrap whatever database holds the records. All ids are
/// the string form returned by [`Indexable::id`], and ordering must follow
/// the store's stable ascending identifier.
#[async_trait]
pub trait DocumentStore<T>: Send + Sync {
    /// Total number of records.
    async fn count(&self) -> Result<u64>;

    /// Up to `limit` records ordered by ascending id, strictly after
    /// `last_id` when given.
    async fn page_after(&self, last_id: Option<&str>, limit: usize) -> Result<Vec<T>>;

    /// Records with the given ids, in any order. Unknown ids are skipped.
    async fn find_many(&self, ids: &[String]) -> Result<Vec<T>>;
}

// ============================================================================
// Tests
// ============================================================================
