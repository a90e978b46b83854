//! Persistence seam of the loader.
//!
//! A repository persists the records of one model. It is either
//! synchronous ([`Repository`]) or asynchronous ([`AsyncRepository`]); which
//! one is declared up front through [`PreferredRepository`], so the loader
//! never has to inspect a return value to find out.

mod master;
mod memory;
mod registry;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use seedling_domain::{EntityPool, ModelInstance};
use serde_json::Value;

use crate::definition::Record;
use crate::error::FixtureResult;

pub use master::MasterRepository;
pub use memory::{AsyncMemoryRepository, MemoryRepository};
pub use registry::RepositoryRegistry;

/// How a record is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveMethod {
	/// Insert a new entity.
	#[default]
	Create,
	/// Insert or replace an existing entity.
	Upsert,
}

/// Options of a save.
#[derive(Debug, Clone, Copy, Default)]
pub struct SaveOptions<'a> {
	/// Write mode.
	pub method: SaveMethod,
	/// Set when the save comes from fixture loading.
	pub fixture_insertion: bool,
	/// Entities of the current load run, used to include related entities.
	pub entity_pool: Option<&'a EntityPool>,
}

impl<'a> SaveOptions<'a> {
	/// Creates default options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Options used by the fixture loader.
	pub fn fixture(pool: &'a EntityPool) -> Self {
		Self {
			method: SaveMethod::Create,
			fixture_insertion: true,
			entity_pool: Some(pool),
		}
	}

	/// Sets the write mode.
	pub fn with_method(mut self, method: SaveMethod) -> Self {
		self.method = method;
		self
	}
}

/// Synchronous repository of one model.
pub trait Repository: Send + Sync {
	/// Model the repository stores.
	fn model_name(&self) -> &str;

	/// Materializes and stores a record.
	fn save(&self, record: Record, options: &SaveOptions<'_>) -> FixtureResult<ModelInstance>;

	/// Fetches the entity with the given identifier.
	fn get(&self, id: &Value) -> FixtureResult<Option<ModelInstance>>;

	/// Merges `record` into the stored entity and returns the result.
	fn update(&self, id: &Value, record: Record) -> FixtureResult<ModelInstance>;

	/// Deletes an entity. Returns false if there was none.
	fn delete(&self, id: &Value) -> FixtureResult<bool>;
}

/// Asynchronous repository of one model.
#[async_trait]
pub trait AsyncRepository: Send + Sync {
	/// Model the repository stores.
	fn model_name(&self) -> &str;

	/// Materializes and stores a record.
	async fn save(&self, record: Record, options: &SaveOptions<'_>) -> FixtureResult<ModelInstance>;

	/// Fetches the entity with the given identifier.
	async fn get(&self, id: &Value) -> FixtureResult<Option<ModelInstance>>;

	/// Merges `record` into the stored entity and returns the result.
	async fn update(&self, id: &Value, record: Record) -> FixtureResult<ModelInstance>;

	/// Deletes an entity. Returns false if there was none.
	async fn delete(&self, id: &Value) -> FixtureResult<bool>;
}

/// Repository of a model, tagged with its calling convention.
#[derive(Clone)]
pub enum PreferredRepository {
	/// Synchronous repository.
	Sync(Arc<dyn Repository>),
	/// Asynchronous repository.
	Async(Arc<dyn AsyncRepository>),
}

impl PreferredRepository {
	/// Model the repository stores.
	pub fn model_name(&self) -> &str {
		match self {
			Self::Sync(repository) => repository.model_name(),
			Self::Async(repository) => repository.model_name(),
		}
	}

	/// Returns true for asynchronous repositories.
	pub fn is_async(&self) -> bool {
		matches!(self, Self::Async(_))
	}
}

impl fmt::Debug for PreferredRepository {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let kind = if self.is_async() { "Async" } else { "Sync" };
		f.debug_tuple(kind).field(&self.model_name()).finish()
	}
}

/// Resolves the repository of a model.
pub trait RepositoryProvider: Send + Sync {
	/// Returns the preferred repository of `model`.
	///
	/// # Errors
	///
	/// Returns
	/// [`FixtureError::RepositoryUnavailable`](crate::error::FixtureError::RepositoryUnavailable)
	/// if the model has no repository.
	fn preferred_repository(&self, model: &str) -> FixtureResult<PreferredRepository>;
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_fixture_options() {
		let pool = EntityPool::new();
		let options = SaveOptions::fixture(&pool);

		assert_eq!(options.method, SaveMethod::Create);
		assert!(options.fixture_insertion);
		assert!(options.entity_pool.is_some());
	}

	#[rstest]
	fn test_default_options() {
		let options = SaveOptions::new().with_method(SaveMethod::Upsert);

		assert_eq!(options.method, SaveMethod::Upsert);
		assert!(!options.fixture_insertion);
		assert!(options.entity_pool.is_none());
	}
}
