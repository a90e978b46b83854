//! Repository registry.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::{AsyncRepository, PreferredRepository, Repository, RepositoryProvider};
use crate::error::{FixtureError, FixtureResult};

/// [`RepositoryProvider`] backed by a map from model name to repository.
#[derive(Debug, Default)]
pub struct RepositoryRegistry {
	repositories: RwLock<HashMap<String, PreferredRepository>>,
}

impl RepositoryRegistry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a repository under its model name, replacing any previous
	/// one.
	pub fn register(&self, repository: PreferredRepository) {
		let model = repository.model_name().to_string();
		tracing::trace!(model = %model, is_async = repository.is_async(), "registering repository");
		self.repositories.write().insert(model, repository);
	}

	/// Registers a synchronous repository.
	pub fn register_sync<R: Repository + 'static>(&self, repository: R) -> Arc<R> {
		let repository = Arc::new(repository);
		self.register(PreferredRepository::Sync(repository.clone()));
		repository
	}

	/// Registers an asynchronous repository.
	pub fn register_async<R: AsyncRepository + 'static>(&self, repository: R) -> Arc<R> {
		let repository = Arc::new(repository);
		self.register(PreferredRepository::Async(repository.clone()));
		repository
	}

	/// Checks if a model has a repository.
	pub fn contains(&self, model: &str) -> bool {
		self.repositories.read().contains_key(model)
	}

	/// Returns the number of registered repositories.
	pub fn len(&self) -> usize {
		self.repositories.read().len()
	}

	/// Returns true if no repositories are registered.
	pub fn is_empty(&self) -> bool {
		self.repositories.read().is_empty()
	}
}

impl RepositoryProvider for RepositoryRegistry {
	fn preferred_repository(&self, model: &str) -> FixtureResult<PreferredRepository> {
		self.repositories
			.read()
			.get(model)
			.cloned()
			.ok_or_else(|| FixtureError::RepositoryUnavailable {
				model: model.to_string(),
				reason: "no repository registered".to_string(),
			})
	}
}
