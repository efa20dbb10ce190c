//! Mutation hooks.
//!
//! The primary store calls a [`LifecycleHooks`] implementation after it saves
//! or removes a record; [`MutationHooks`] is the implementation that mirrors
//! the change through a [`SyncEngine`]. Hooks run inline with the store
//! operation and return engine errors to it, so a failed sync fails the
//! save. The only swallowed case is deleting a document that was already
//! gone.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use syncdex_client::DeleteOutcome;
use syncdex_core::{Indexable, Result};

use crate::engine::SyncEngine;

/// What a hook did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookOutcome {
    /// The record was indexed.
    Indexed,
    /// The record's document was removed (or already absent).
    Removed(DeleteOutcome),
    /// Hooks are disabled for this model.
    Disabled,
}

/// Callbacks a primary store invokes around record mutations.
#[async_trait]
pub trait LifecycleHooks<T>: Send + Sync {
    /// After a record has been persisted.
    async fn after_save(&self, record: &T) -> Result<HookOutcome>;

    /// After a record has been removed.
    async fn after_destroy(&self, record: &T) -> Result<HookOutcome>;
}

/// Hooks that mirror mutations into the search index.
#[derive(Debug, Clone)]
pub struct MutationHooks<T> {
    engine: SyncEngine<T>,
    enabled: bool,
}

impl<T> MutationHooks<T>
where
    T: Indexable + DeserializeOwned + 'static,
{
    /// Hooks for a model, enabled according to its registration.
    pub fn new(engine: SyncEngine<T>) -> Self {
        let enabled = engine.registration().callbacks();
        Self { engine, enabled }
    }

    /// Whether the hooks propagate anything.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The engine the hooks drive.
    pub fn engine(&self) -> &SyncEngine<T> {
        &self.engine
    }
}

#[async_trait]
impl<T> LifecycleHooks<T> for MutationHooks<T>
where
    T: Indexable + DeserializeOwned + 'static,
{
    /// Index the record, or remove it when it is tombstoned or no longer
    /// indexable.
    async fn after_save(&self, record: &T) -> Result<HookOutcome> {
        if !self.enabled {
            return Ok(HookOutcome::Disabled);
        }
        if record.is_destroyed() || !record.should_index() {
            let outcome = self.engine.remove_one(record).await?;
            return Ok(HookOutcome::Removed(outcome));
        }
        self.engine.index_one(record).await?;
        Ok(HookOutcome::Indexed)
    }

    async fn after_destroy(&self, record: &T) -> Result<HookOutcome> {
        if !self.enabled {
            return Ok(HookOutcome::Disabled);
        }
        let outcome = self.engine.remove_one(record).await?;
        Ok(HookOutcome::Removed(outcome))
    }
}

// ============================================================================
// Tests
// ============================================================================
