//! Syncdex Core — shared types, traits, errors, and configuration.
//!
//! This crate provides the foundational types used across all Syncdex
//! crates. It has no internal Syncdex dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`config`]: Global, client, and per-model configuration
//! - [`registry`]: Process-wide table of indexes and models
//! - [`descriptor`]: Index definitions and child mapping construction
//! - [`record`]: Record adapter and primary-store collaborator traits
//! - [`query`]: Query normalization and pagination
//! - [`util`]: Text and JSON helpers

pub mod config;
pub mod descriptor;
pub mod error;
pub mod query;
pub mod record;
pub mod registry;
pub mod util;

// Re-export key types at crate root for convenience
pub use config::{ChildOptions, ClientConfig, GlobalConfig, ModelOptions, WrapperKind};
pub use descriptor::IndexDescriptor;
pub use error::{Error, Result};
pub use query::{Query, SearchOptions, SearchRequest};
pub use record::{Document, DocumentStore, Indexable};
pub use registry::Registry;
