//! Index lifecycle.
//!
//! [`ManagedIndex`] pairs an index descriptor with the client of the model
//! that owns it and issues the create/drop calls.

use std::sync::Arc;

use syncdex_client::CachedClient;
use syncdex_core::{IndexDescriptor, Result};

/// Create/drop handle for one index.
#[derive(Debug, Clone)]
pub struct ManagedIndex {
    descriptor: Arc<IndexDescriptor>,
    client: Arc<CachedClient>,
}

impl ManagedIndex {
    /// Bind a descriptor to a client.
    pub fn new(descriptor: Arc<IndexDescriptor>, client: Arc<CachedClient>) -> Self {
        Self { descriptor, client }
    }

    /// Index name.
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// Document type of the owning model.
    pub fn type_name(&self) -> &str {
        self.descriptor.type_name()
    }

    /// The descriptor this index is created from.
    pub fn descriptor(&self) -> &Arc<IndexDescriptor> {
        &self.descriptor
    }

    /// Whether the index exists in the engine.
    pub async fn exists(&self) -> Result<bool> {
        self.client.get()?.index_exists(self.name()).await
    }

    /// Create the index with the descriptor's current settings.
    ///
    /// An existing index is left untouched. Returns whether a creation call
    /// was made.
    pub async fn create(&self) -> Result<bool> {
        let client = self.client.get()?;
        if client.index_exists(self.name()).await? {
            log::debug!("Index '{}' already exists", self.name());
            return Ok(false);
        }
        client
            .create_index(self.name(), &self.descriptor.settings())
            .await?;
        log::info!("Created index '{}'", self.name());
        Ok(true)
    }

    /// Drop the index. Returns `false` when it did not exist.
    pub async fn delete(&self) -> Result<bool> {
        let deleted = self.client.get()?.delete_index(self.name()).await?;
        if deleted {
            log::info!("Deleted index '{}'", self.name());
        }
        Ok(deleted)
    }

    /// Drop and recreate the index, discarding every document in it.
    pub async fn reset(&self) -> Result<()> {
        self.delete().await?;
        self.create().await?;
        log::info!("Reset index '{}'", self.name());
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
