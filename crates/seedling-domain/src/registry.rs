//! Model registry.
//!
//! Holds every [`ModelDefinition`] known to the application, keyed by model
//! name. The model kind is recorded once here, at registration, so the
//! materializer never has to work it out again.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{DomainError, DomainResult};
use crate::schema::ModelDefinition;

/// Registry of model definitions.
#[derive(Debug, Default, Clone)]
pub struct ModelRegistry {
	models: HashMap<String, Arc<ModelDefinition>>,
}

impl ModelRegistry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a definition, replacing any previous one with the same name.
	pub fn register(&mut self, definition: ModelDefinition) -> &mut Self {
		tracing::trace!(model = definition.name(), kind = ?definition.kind(), "registering model");
		self.models
			.insert(definition.name().to_string(), Arc::new(definition));
		self
	}

	/// Builder-style variant of [`ModelRegistry::register`].
	pub fn with(mut self, definition: ModelDefinition) -> Self {
		self.register(definition);
		self
	}

	/// Looks up a definition.
	///
	/// # Errors
	///
	/// Returns [`DomainError::ModelNotFound`] if no model with that name is
	/// registered.
	pub fn get(&self, name: &str) -> DomainResult<Arc<ModelDefinition>> {
		self.models
			.get(name)
			.cloned()
			.ok_or_else(|| DomainError::ModelNotFound(name.to_string()))
	}

	/// Checks if a model is registered.
	pub fn contains(&self, name: &str) -> bool {
		self.models.contains_key(name)
	}

	/// Returns all registered model names.
	pub fn names(&self) -> Vec<&str> {
		self.models.keys().map(String::as_str).collect()
	}

	/// Returns the number of registered models.
	pub fn len(&self) -> usize {
		self.models.len()
	}

	/// Returns true if no models are registered.
	pub fn is_empty(&self) -> bool {
		self.models.is_empty()
	}
}
