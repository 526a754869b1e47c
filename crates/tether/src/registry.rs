//! The per-database model registry.
//!
//! Owned by the adapter and recreated from scratch every time a database
//! is selected: registrations do not survive a reselection.

use indexmap::IndexMap;
use std::sync::Arc;
use tether_model::ModelDescriptor;

/// Maps table names to registered model descriptors.
#[derive(Debug, Default)]
pub struct Registry {
    models: IndexMap<String, Arc<ModelDescriptor>>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Registry::default()
    }

    /// Register a model under its table name. Re-registering a table
    /// replaces the previous descriptor.
    pub(crate) fn register(&mut self, model: ModelDescriptor) -> Arc<ModelDescriptor> {
        let model = Arc::new(model);
        self.models.insert(model.table().to_string(), model.clone());
        model
    }

    /// The model registered for `table`, if any.
    pub fn get(&self, table: &str) -> Option<&Arc<ModelDescriptor>> {
        self.models.get(table)
    }

    pub fn is_registered(&self, table: &str) -> bool {
        self.models.contains_key(table)
    }

    /// Resolve a model by its model name (as opposed to its table name);
    /// used when following declared references.
    pub fn by_model_name(&self, name: &str) -> Option<&Arc<ModelDescriptor>> {
        self.models.values().find(|model| model.name() == name)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
