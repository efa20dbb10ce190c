//! Index registration, record synchronization, and result wrapping.
//!
//! This crate sits on top of `syncdex-core` and `syncdex-client`
//! (dependency level 2):
//!
//! - [`SearchContext`]: registers models, runs cross-model search, creates
//!   every registered index
//! - [`ModelRegistration`]: one opted-in model; children read shared fields
//!   through their parent
//! - [`SyncEngine`]: per-model propagation, bulk indexing, full reindex, and
//!   queries
//! - [`MutationHooks`]: after-save / after-destroy bindings onto the engine
//! - [`Response`]: lazily fetched, paginated, wrapped search results
//! - [`MemoryStore`]: in-memory primary store

pub mod context;
pub mod engine;
pub mod hooks;
pub mod index;
pub mod registration;
pub mod response;
pub mod store;

pub use context::SearchContext;
pub use engine::{DEFAULT_SUGGEST_FIELD, INDEX_STEP, ReindexStats, SyncEngine};
pub use hooks::{HookOutcome, LifecycleHooks, MutationHooks};
pub use index::ManagedIndex;
pub use registration::ModelRegistration;
pub use response::{DynamicHit, Response, TypedHit, WrappedHit};
pub use store::MemoryStore;
