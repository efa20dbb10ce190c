//! Configuration for Syncdex.
//!
//! Three layers feed a model's behavior:
//!
//! - [`GlobalConfig`]: process-wide defaults (client connection, index name
//!   prefix, auto-creation toggle), usually loaded from TOML at startup.
//! - [`ModelOptions`]: supplied when a model registers; its client settings
//!   are merged over the global ones, model keys winning.
//! - [`ChildOptions`]: supplied when a child model attaches to a parent's
//!   index.
//!
//! # Example
//!
//! ```rust
//! use syncdex_core::config::GlobalConfig;
//!
//! let config = GlobalConfig::from_toml_str(
//!     r#"
//!     prefix = "test_"
//!
//!     [client]
//!     url = "http://search.internal:9200"
//!     timeout_secs = 5
//!     "#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.prefix, "test_");
//! assert!(config.autocreate_indexes);
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Environment variable consulted when no URL is configured.
pub const URL_ENV_VAR: &str = "ELASTICSEARCH_URL";

/// URL used when neither configuration nor environment supplies one.
pub const DEFAULT_URL: &str = "http://localhost:9200";

// ============================================================================
// ClientConfig
// ============================================================================

/// Connection options for a search engine client.
///
/// Every field is optional so that model-level overrides can be layered over
/// process-wide defaults with [`ClientConfig::merge`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the engine (e.g. `http://localhost:9200`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Request timeout in seconds. No timeout when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Basic-auth user name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Basic-auth password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Extra headers sent with every request.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl ClientConfig {
    /// Create a config pointing at the given URL.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    /// Merge `overrides` over `self`, returning a new config.
    ///
    /// Keys set in `overrides` win; header maps merge key by key.
    pub fn merge(&self, overrides: &ClientConfig) -> ClientConfig {
        let mut headers = self.headers.clone();
        headers.extend(
            overrides
                .headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );

        ClientConfig {
            url: overrides.url.clone().or_else(|| self.url.clone()),
            timeout_secs: overrides.timeout_secs.or(self.timeout_secs),
            username: overrides.username.clone().or_else(|| self.username.clone()),
            password: overrides.password.clone().or_else(|| self.password.clone()),
            headers,
        }
    }

    /// The URL to connect to.
    ///
    /// Falls back to `ELASTICSEARCH_URL`, then to [`DEFAULT_URL`].
    pub fn resolved_url(&self) -> String {
        self.url
            .clone()
            .or_else(|| std::env::var(URL_ENV_VAR).ok().filter(|u| !u.is_empty()))
            .unwrap_or_else(|| DEFAULT_URL.to_string())
    }
}

// ============================================================================
// GlobalConfig
// ============================================================================

/// Process-wide configuration.
///
/// Held by the search context and read by every registration. It is written
/// once at startup; nothing mutates it while the system serves traffic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Prefix prepended to index names of models that opt into prefixing.
    #[serde(default)]
    pub prefix: String,

    /// Create every registered index when the context is bootstrapped.
    #[serde(default = "default_true")]
    pub autocreate_indexes: bool,

    /// Default client connection options.
    #[serde(default)]
    pub client: ClientConfig,
}

fn default_true() -> bool {
    true
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            autocreate_indexes: default_true(),
            client: ClientConfig::default(),
        }
    }
}

impl GlobalConfig {
    /// Parse configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(format!("Invalid configuration: {e}")))
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        log::debug!("Loaded search configuration from {}", path.display());
        Self::from_toml_str(&content)
            .map_err(|e| Error::config(format!("{}: {e}", path.display())))
    }
}

// ============================================================================
// WrapperKind
// ============================================================================

/// How raw search hits are turned into caller-facing values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WrapperKind {
    /// Rebuild a record from each hit's source and mark it persisted.
    #[default]
    Typed,
    /// Wrap each hit's source in a dynamic field accessor.
    Map,
    /// Return the untouched hit.
    Raw,
    /// Reload full records from the primary store, in ranked order.
    Reload,
}

// ============================================================================
// ModelOptions / ChildOptions
// ============================================================================

/// Options supplied when a standalone model registers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelOptions {
    /// Explicit index name. Derived from the model identifier when unset.
    #[serde(default)]
    pub index_name: Option<String>,

    /// Prepend the global prefix to the index name.
    #[serde(default = "default_true")]
    pub prefix_name: bool,

    /// Client overrides, merged over the global client config.
    #[serde(default)]
    pub client: ClientConfig,

    /// Index settings and mappings sent on index creation.
    #[serde(default = "empty_object")]
    pub index_options: Value,

    /// Field mapping shorthand, merged in as the type's `properties`.
    #[serde(default)]
    pub index_mappings: Option<Value>,

    /// Result wrapper used by this model's searches.
    #[serde(default)]
    pub wrapper: WrapperKind,

    /// Install mutation hooks.
    #[serde(default = "default_true")]
    pub callbacks: bool,

    /// Leave the index alone during bulk index creation.
    #[serde(default)]
    pub skip_create: bool,
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            index_name: None,
            prefix_name: default_true(),
            client: ClientConfig::default(),
            index_options: empty_object(),
            index_mappings: None,
            wrapper: WrapperKind::default(),
            callbacks: default_true(),
            skip_create: false,
        }
    }
}

/// Options supplied when a child model attaches to a parent's index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChildOptions {
    /// Record field holding the parent id.
    #[serde(default = "default_parent_field")]
    pub parent_field: String,

    /// Type named in the `_parent` mapping. Defaults to the parent's type.
    #[serde(default)]
    pub parent_type: Option<String>,

    /// The child's own mapping fragment.
    #[serde(default = "empty_object")]
    pub mapping: Value,

    /// Install mutation hooks.
    #[serde(default = "default_true")]
    pub callbacks: bool,
}

fn default_parent_field() -> String {
    "parent_id".to_string()
}

impl Default for ChildOptions {
    fn default() -> Self {
        Self {
            parent_field: default_parent_field(),
            parent_type: None,
            mapping: empty_object(),
            callbacks: default_true(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
