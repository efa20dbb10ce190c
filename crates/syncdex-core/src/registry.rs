//! Registry of indexes and models known to the process.
//!
//! Every model registration records its index name and model identifier
//! here. The registry is append-only: names are deduplicated but never
//! removed. Cross-model search joins [`Registry::all_indexes`] into the
//! target index list, and bulk index creation walks
//! [`Registry::all_models`].
//!
//! ```rust
//! use syncdex_core::Registry;
//!
//! let mut registry = Registry::new();
//! registry.register("articles", "Article");
//! registry.register("articles", "SubArticle");
//! registry.register("users", "User");
//!
//! assert_eq!(registry.all_indexes(), vec!["articles", "users"]);
//! assert_eq!(registry.joined_indexes(), "articles,users");
//! ```

use indexmap::IndexSet;

/// Insertion-ordered, deduplicated sets of index names and model identifiers.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    indexes: IndexSet<String>,
    models: IndexSet<String>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an index name and a model identifier.
    ///
    /// Names already present keep their original position.
    pub fn register(&mut self, index_name: impl Into<String>, model: impl Into<String>) {
        let index_name = index_name.into();
        let model = model.into();
        log::debug!("Registering model '{model}' on index '{index_name}'");
        self.indexes.insert(index_name);
        self.models.insert(model);
    }

    /// All registered index names, in insertion order.
    pub fn all_indexes(&self) -> Vec<&str> {
        self.indexes.iter().map(String::as_str).collect()
    }

    /// All registered model identifiers, in insertion order.
    pub fn all_models(&self) -> Vec<&str> {
        self.models.iter().map(String::as_str).collect()
    }

    /// Registered index names joined with commas, for multi-index search.
    pub fn joined_indexes(&self) -> String {
        self.all_indexes().join(",")
    }

    /// Check whether an index name has been registered.
    pub fn has_index(&self, index_name: &str) -> bool {
        self.indexes.contains(index_name)
    }

    /// Check whether a model identifier has been registered.
    pub fn has_model(&self, model: &str) -> bool {
        self.models.contains(model)
    }

    /// Returns `true` if nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
