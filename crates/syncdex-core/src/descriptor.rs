//! Index descriptors.
//!
//! An [`IndexDescriptor`] is the definition of one logical search index: its
//! name, the document type of the owning model, and the settings/mappings
//! document sent when the index is created.
//!
//! Child models do not get a descriptor of their own. They declare their
//! shape inside the parent's descriptor through
//! [`IndexDescriptor::add_child_mapping`], so the parent index's schema
//! carries every type that lives in it.
//!
//! ```rust
//! use serde_json::json;
//! use syncdex_core::{IndexDescriptor, ModelOptions};
//!
//! let options = ModelOptions {
//!     index_mappings: Some(json!({"name": {"type": "string"}})),
//!     ..Default::default()
//! };
//! let descriptor = IndexDescriptor::for_model("Article", &options, "test_").unwrap();
//!
//! assert_eq!(descriptor.name(), "test_articles");
//! assert_eq!(descriptor.type_name(), "article");
//! assert_eq!(
//!     descriptor.settings()["mappings"]["article"]["properties"]["name"]["type"],
//!     "string"
//! );
//! ```

use std::sync::RwLock;

use serde_json::{Map, Value, json};

use crate::config::ModelOptions;
use crate::error::{Error, Result};
use crate::util::{deep_merge, pluralize, text::snake_case};

/// Definition of one search index.
#[derive(Debug)]
pub struct IndexDescriptor {
    name: String,
    type_name: String,
    settings: RwLock<Value>,
}

impl IndexDescriptor {
    /// Create a descriptor from its parts.
    ///
    /// `settings` must be a JSON object.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>, settings: Value) -> Result<Self> {
        if !settings.is_object() {
            return Err(Error::config("Index settings must be a JSON object"));
        }
        Ok(Self {
            name: name.into(),
            type_name: type_name.into(),
            settings: RwLock::new(settings),
        })
    }

    /// Build the descriptor for a standalone model.
    ///
    /// The name comes from [`derive_index_name`](Self::derive_index_name) and
    /// the type from [`derive_type_name`](Self::derive_type_name). When the
    /// options carry a field mapping shorthand it is merged into the settings
    /// as `mappings.<type>.properties`.
    pub fn for_model(model: &str, options: &ModelOptions, prefix: &str) -> Result<Self> {
        let name = Self::derive_index_name(
            model,
            options.index_name.as_deref(),
            options.prefix_name,
            prefix,
        );
        let type_name = Self::derive_type_name(model);

        let mut settings = options.index_options.clone();
        if !settings.is_object() {
            return Err(Error::config(format!(
                "Index options for model '{model}' must be a JSON object"
            )));
        }
        if let Some(ref properties) = options.index_mappings {
            deep_merge(
                &mut settings,
                json!({ "mappings": { type_name.as_str(): { "properties": properties } } }),
            );
        }

        Self::new(name, type_name, settings)
    }

    /// Derive an index name: optional prefix plus explicit or pluralized name.
    ///
    /// ```rust
    /// use syncdex_core::IndexDescriptor;
    ///
    /// assert_eq!(IndexDescriptor::derive_index_name("SubArticle", None, true, "dev_"), "dev_sub_articles");
    /// assert_eq!(IndexDescriptor::derive_index_name("Article", Some("news"), false, "dev_"), "news");
    /// ```
    pub fn derive_index_name(
        model: &str,
        explicit: Option<&str>,
        prefix_name: bool,
        prefix: &str,
    ) -> String {
        let base = match explicit {
            Some(name) => name.to_string(),
            None => pluralize(&snake_case(model)),
        };
        if prefix_name {
            format!("{prefix}{base}")
        } else {
            base
        }
    }

    /// Default document type for a model: its snake-cased identifier.
    pub fn derive_type_name(model: &str) -> String {
        snake_case(model)
    }

    /// Index name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Document type of the owning model.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Snapshot of the current settings/mappings document.
    pub fn settings(&self) -> Value {
        match self.settings.read() {
            Ok(settings) => settings.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Declare a child type's mapping inside this index's settings.
    ///
    /// The fragment is stored under `mappings.<child_type>`, replacing any
    /// earlier fragment for the same type, so repeating the call leaves a
    /// single entry.
    pub fn add_child_mapping(&self, child_type: &str, mapping: Value) -> Result<()> {
        let mut settings = self
            .settings
            .write()
            .map_err(|e| Error::config(format!("Index settings lock poisoned: {e}")))?;

        let root = settings
            .as_object_mut()
            .ok_or_else(|| Error::config("Index settings must be a JSON object"))?;
        let mappings = root
            .entry("mappings")
            .or_insert_with(|| Value::Object(Map::new()));
        let mappings = mappings.as_object_mut().ok_or_else(|| {
            Error::config(format!("Index '{}' has a non-object mappings entry", self.name))
        })?;

        mappings.insert(child_type.to_string(), mapping);
        log::debug!(
            "Declared child type '{child_type}' in mappings of index '{}'",
            self.name
        );
        Ok(())
    }
}

/// Build a child mapping fragment with its `_parent` relationship field.
///
/// ```rust
/// use serde_json::json;
/// use syncdex_core::descriptor::child_mapping;
///
/// let mapping = child_mapping(&json!({"properties": {"name": {"type": "string"}}}), "article").unwrap();
/// assert_eq!(mapping["_parent"], json!({"type": "article"}));
/// assert_eq!(mapping["properties"]["name"]["type"], "string");
/// ```
pub fn child_mapping(mapping: &Value, parent_type: &str) -> Result<Value> {
    let mut fragment = match mapping {
        Value::Object(map) => map.clone(),
        Value::Null => Map::new(),
        _ => return Err(Error::config("Child mapping must be a JSON object")),
    };
    fragment.insert("_parent".to_string(), json!({ "type": parent_type }));
    Ok(Value::Object(fragment))
}

// ============================================================================
// Tests
// ============================================================================
