//! Model registrations.
//!
//! A [`ModelRegistration`] is what a model becomes once it opts into search:
//! its index descriptor, its cached client, and its result wrapper. A child
//! registration owns none of those. It keeps its own type name and holds a
//! reference to the parent registration, reading the shared fields through
//! it.

use std::sync::Arc;

use syncdex_client::{CachedClient, ClientFactory, SearchClient};
use syncdex_core::config::{ChildOptions, GlobalConfig, ModelOptions, WrapperKind};
use syncdex_core::descriptor::child_mapping;
use syncdex_core::{Error, IndexDescriptor, Result};

use crate::index::ManagedIndex;

#[derive(Debug)]
enum Shape {
    Root {
        descriptor: Arc<IndexDescriptor>,
        client: Arc<CachedClient>,
        wrapper: WrapperKind,
        skip_create: bool,
    },
    Child {
        parent: Arc<ModelRegistration>,
        parent_field: String,
    },
}

/// One opted-in model.
#[derive(Debug)]
pub struct ModelRegistration {
    model: String,
    type_name: String,
    callbacks: bool,
    shape: Shape,
}

impl ModelRegistration {
    /// Register a standalone model.
    ///
    /// The model's client config is merged over the global one, model keys
    /// winning. Nothing connects until the client is first used.
    pub fn root(
        model: &str,
        options: &ModelOptions,
        config: &GlobalConfig,
        factory: Arc<dyn ClientFactory>,
    ) -> Result<Self> {
        let descriptor = IndexDescriptor::for_model(model, options, &config.prefix)?;
        let client = CachedClient::new(config.client.merge(&options.client), factory);
        log::debug!(
            "Registered model '{model}' on index '{}' as type '{}'",
            descriptor.name(),
            descriptor.type_name()
        );

        Ok(Self {
            model: model.to_string(),
            type_name: descriptor.type_name().to_string(),
            callbacks: options.callbacks,
            shape: Shape::Root {
                descriptor: Arc::new(descriptor),
                client: Arc::new(client),
                wrapper: options.wrapper,
                skip_create: options.skip_create,
            },
        })
    }

    /// Register a child model inside its parent's index.
    ///
    /// The child's mapping gains a `_parent` field (the parent's type unless
    /// overridden) and is declared in the parent's settings under the
    /// child's type name.
    ///
    /// # Errors
    ///
    /// Fails when the parent is itself a child, or when the mapping fragment
    /// is not an object.
    pub fn child(model: &str, parent: Arc<ModelRegistration>, options: &ChildOptions) -> Result<Self> {
        if parent.is_child() {
            return Err(Error::config(format!(
                "Cannot attach child '{model}' to '{}': it is itself a child model",
                parent.model()
            )));
        }

        let type_name = IndexDescriptor::derive_type_name(model);
        let parent_type = options
            .parent_type
            .clone()
            .unwrap_or_else(|| parent.type_name().to_string());
        let mapping = child_mapping(&options.mapping, &parent_type)?;
        parent.descriptor().add_child_mapping(&type_name, mapping)?;
        log::debug!(
            "Registered child model '{model}' under '{}' on index '{}'",
            parent.model(),
            parent.index_name()
        );

        Ok(Self {
            model: model.to_string(),
            type_name,
            callbacks: options.callbacks,
            shape: Shape::Child {
                parent,
                parent_field: options.parent_field.clone(),
            },
        })
    }

    /// Model identifier.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Document type of this model's records.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Whether mutation hooks are enabled for this model.
    pub fn callbacks(&self) -> bool {
        self.callbacks
    }

    /// Whether this is a child registration.
    pub fn is_child(&self) -> bool {
        matches!(self.shape, Shape::Child { .. })
    }

    /// Parent registration of a child.
    pub fn parent(&self) -> Option<&Arc<ModelRegistration>> {
        match self.shape {
            Shape::Child { ref parent, .. } => Some(parent),
            Shape::Root { .. } => None,
        }
    }

    /// Record field holding a child's parent id.
    pub fn parent_field(&self) -> Option<&str> {
        match self.shape {
            Shape::Child {
                ref parent_field, ..
            } => Some(parent_field),
            Shape::Root { .. } => None,
        }
    }

    /// Index descriptor (the parent's, for children).
    pub fn descriptor(&self) -> &Arc<IndexDescriptor> {
        match self.shape {
            Shape::Root { ref descriptor, .. } => descriptor,
            Shape::Child { ref parent, .. } => parent.descriptor(),
        }
    }

    /// Index name (the parent's, for children).
    pub fn index_name(&self) -> &str {
        self.descriptor().name()
    }

    /// Cached client handle (the parent's, for children).
    pub fn cached_client(&self) -> &Arc<CachedClient> {
        match self.shape {
            Shape::Root { ref client, .. } => client,
            Shape::Child { ref parent, .. } => parent.cached_client(),
        }
    }

    /// The search client, connecting on first use.
    pub fn client(&self) -> Result<Arc<dyn SearchClient>> {
        self.cached_client().get()
    }

    /// Default result wrapper (the parent's, for children).
    pub fn wrapper(&self) -> WrapperKind {
        match self.shape {
            Shape::Root { wrapper, .. } => wrapper,
            Shape::Child { ref parent, .. } => parent.wrapper(),
        }
    }

    /// Whether bulk index creation skips this model (the parent's setting,
    /// for children).
    pub fn skip_create(&self) -> bool {
        match self.shape {
            Shape::Root { skip_create, .. } => skip_create,
            Shape::Child { ref parent, .. } => parent.skip_create(),
        }
    }

    /// Lifecycle handle for this model's index.
    pub fn index(&self) -> ManagedIndex {
        ManagedIndex::new(Arc::clone(self.descriptor()), Arc::clone(self.cached_client()))
    }
}

// ============================================================================
// Tests
// ============================================================================
