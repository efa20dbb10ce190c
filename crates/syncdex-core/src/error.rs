//! Error types for Syncdex.

/// Errors that can occur while mirroring records into a search engine or
/// querying it.
///
/// Partial bulk failures are deliberately absent: a bulk call that reaches
/// the engine returns its per-item outcomes as a value, and the caller
/// decides what mixed success means.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Invalid registration or runtime configuration.
    #[error("Configuration error: {message}")]
    Config {
        /// What configuration is problematic
        message: String,
    },

    /// A child record has no parent id at index time.
    #[error("Parent/child relationship needs a parent: {model} record '{id}' has no parent id")]
    MissingParent {
        /// Model identifier of the child record
        model: String,
        /// Primary-store id of the offending record
        id: String,
    },

    /// The search engine answered with a non-success status.
    #[error("Search engine error (HTTP {status}): {body}")]
    Engine {
        /// HTTP status code returned by the engine
        status: u16,
        /// Raw response body
        body: String,
    },

    /// The engine could not be reached.
    #[error("Transport error: {message}")]
    Transport {
        /// Human-readable error message
        message: String,
        /// Source error if available
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The connected engine does not support the requested feature.
    #[error("{feature} not supported in engine version {version}")]
    Unsupported {
        /// Feature that was requested
        feature: String,
        /// Version reported by the engine
        version: String,
    },

    /// The primary document store failed.
    #[error("Document store error: {message}")]
    Store {
        /// Human-readable error message
        message: String,
        /// Source error if available
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error (configuration files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience `Result` type alias for Syncdex operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Creates a missing-parent error for a child record.
    pub fn missing_parent<M, I>(model: M, id: I) -> Self
    where
        M: Into<String>,
        I: Into<String>,
    {
        Error::MissingParent {
            model: model.into(),
            id: id.into(),
        }
    }

    /// Creates an engine error from a status code and response body.
    pub fn engine<S: Into<String>>(status: u16, body: S) -> Self {
        Error::Engine {
            status,
            body: body.into(),
        }
    }

    /// Creates a transport error with a message.
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Error::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a transport error with a message and source error.
    pub fn transport_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates an unsupported-feature error.
    pub fn unsupported<F, V>(feature: F, version: V) -> Self
    where
        F: Into<String>,
        V: Into<String>,
    {
        Error::Unsupported {
            feature: feature.into(),
            version: version.into(),
        }
    }

    /// Creates a document store error with a message.
    pub fn store<S: Into<String>>(message: S) -> Self {
        Error::Store {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a document store error with a message and source error.
    pub fn store_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Store {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns `true` when the engine reported that the target does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Engine { status: 404, .. })
    }

    /// Returns whether this error is retryable.
    ///
    /// Nothing in Syncdex retries on its own; this only classifies the
    /// failure for callers that want to.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport { .. } => true,
            Error::Engine { status, .. } => *status >= 500 || *status == 429,
            Error::Io(_) => true,
            Error::Store { .. } => true,
            Error::Config { .. } => false,
            Error::MissingParent { .. } => false,
            Error::Unsupported { .. } => false,
            Error::Serialization(_) => false,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
