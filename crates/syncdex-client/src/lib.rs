//! Search engine client facade for Syncdex.
//!
//! This crate wraps the search engine behind the [`SearchClient`] trait
//! (dependency level 1, on top of `syncdex-core`).
//!
//! # Implementations
//!
//! - [`HttpSearchClient`]: REST client over `reqwest`
//! - [`MemorySearchClient`]: in-process engine that records calls, for tests
//!   and embedded use
//!
//! # Connections
//!
//! Registrations hold a [`CachedClient`], which creates its client through a
//! [`ClientFactory`] on first use and reuses it afterwards.

pub mod client;
pub mod http;
pub mod memory;
pub mod version;

pub use client::{
    BulkOperation, BulkResponse, CachedClient, ClientFactory, DeleteOutcome, HttpClientFactory,
    Routing, SearchClient, StaticClientFactory,
};
pub use http::HttpSearchClient;
pub use memory::{CallKind, MemorySearchClient, RecordedCall};
pub use version::EngineVersion;
