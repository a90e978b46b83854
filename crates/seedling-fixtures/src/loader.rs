//! Fixture loading pipeline.
//!
//! [`FixtureLoader`] discovers fixtures, orders them by dependency and
//! persists their records model by model, in batches of
//! [`LoaderSettings::batch_size`] records. Every persisted entity is added to
//! the [`EntityPool`] of the run, which is handed to later fixtures and saves
//! so that records can reference entities created before them.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use seedling_domain::{ModelDefinition, ModelRegistry, PropertyDef};
//! use seedling_fixtures::prelude::*;
//!
//! # fn main() -> FixtureResult<()> {
//! let models = Arc::new(
//! 	ModelRegistry::new().with(ModelDefinition::entity("user").prop(PropertyDef::id("id"))),
//! );
//! let repositories = Arc::new(RepositoryRegistry::new());
//! repositories.register_sync(MemoryRepository::new("user", models));
//!
//! let settings = LoaderSettings::new().with_fixture_dir("fixtures");
//! let loader = FixtureLoader::new(repositories, settings)?;
//! let pool = loader.load(&LoadOptions::new())?;
//! println!("loaded {} entities", pool.len());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use futures::future::join_all;
use indexmap::IndexMap;
use seedling_domain::EntityPool;
use seedling_domain::instance::ID_PROP;
use serde_json::Value;

use crate::config::LoaderSettings;
use crate::definition::{FixtureDefinition, Record};
use crate::discovery;
use crate::error::{FixtureError, FixtureResult};
use crate::repository::{
	AsyncRepository, PreferredRepository, Repository, RepositoryProvider, SaveOptions,
};
use crate::resolver::DependencyResolver;

/// Options of one load run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
	/// Restricts loading to these models.
	///
	/// The filter applies after dependency expansion: dependencies that are
	/// not listed are not loaded.
	pub names: Option<Vec<String>>,
}

impl LoadOptions {
	/// Loads every fixture.
	pub fn new() -> Self {
		Self::default()
	}

	/// Loads only the named fixtures.
	pub fn only<I, S>(names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			names: Some(names.into_iter().map(Into::into).collect()),
		}
	}
}

/// Loads fixtures into repositories.
pub struct FixtureLoader {
	provider: Arc<dyn RepositoryProvider>,
	settings: LoaderSettings,
	fixtures: IndexMap<String, FixtureDefinition>,
}

/// Work for one model: where to save and what.
struct ModelLoad {
	model: String,
	repository: PreferredRepository,
	records: Vec<Record>,
}

impl FixtureLoader {
	/// Creates a loader saving through `provider`.
	///
	/// # Errors
	///
	/// Returns an error if `settings` are invalid.
	pub fn new(provider: Arc<dyn RepositoryProvider>, settings: LoaderSettings) -> FixtureResult<Self> {
		settings.validate()?;
		Ok(Self {
			provider,
			settings,
			fixtures: IndexMap::new(),
		})
	}

	/// Registers a fixture defined in code. It takes precedence over a
	/// discovered fixture of the same model.
	pub fn register(&mut self, fixture: FixtureDefinition) -> &mut Self {
		self.fixtures.insert(fixture.name().to_string(), fixture);
		self
	}

	/// Builder-style variant of [`FixtureLoader::register`].
	pub fn with_fixture(mut self, fixture: FixtureDefinition) -> Self {
		self.register(fixture);
		self
	}

	/// Loader settings.
	pub fn settings(&self) -> &LoaderSettings {
		&self.settings
	}

	/// Every known fixture: discovered ones first, then those registered in
	/// code.
	pub fn definitions(&self) -> FixtureResult<IndexMap<String, FixtureDefinition>> {
		let mut definitions = discovery::discover(&self.settings)?;
		for (name, fixture) in &self.fixtures {
			definitions.insert(name.clone(), fixture.clone());
		}
		Ok(definitions)
	}

	/// Loads fixtures, calling synchronous repositories only.
	///
	/// # Errors
	///
	/// Fails on the first error of discovery, ordering, data resolution or
	/// saving; models loaded before the failure stay persisted. A model
	/// with an asynchronous repository fails with
	/// [`FixtureError::AsyncRepositoryInSyncLoad`].
	pub fn load(&self, options: &LoadOptions) -> FixtureResult<EntityPool> {
		let (definitions, order) = self.plan(options)?;
		let mut pool = EntityPool::new();
		for name in &order {
			let Some(work) = self.prepare(&definitions[name.as_str()], &pool)? else {
				continue;
			};
			match &work.repository {
				PreferredRepository::Sync(repository) => {
					self.save_sync(&work.model, repository.as_ref(), work.records, &mut pool)?;
				}
				PreferredRepository::Async(_) => {
					return Err(FixtureError::AsyncRepositoryInSyncLoad(work.model));
				}
			}
		}
		tracing::info!(models = order.len(), entities = pool.len(), "fixtures loaded");
		Ok(pool)
	}

	/// Loads fixtures, awaiting asynchronous repositories.
	///
	/// Models are loaded one after another. Within a model, each batch of
	/// saves to an asynchronous repository runs concurrently and the next
	/// batch starts only after all of them completed. Synchronous
	/// repositories are called as in [`FixtureLoader::load`].
	pub async fn load_async(&self, options: &LoadOptions) -> FixtureResult<EntityPool> {
		let (definitions, order) = self.plan(options)?;
		let mut pool = EntityPool::new();
		for name in &order {
			let Some(work) = self.prepare(&definitions[name.as_str()], &pool)? else {
				continue;
			};
			match &work.repository {
				PreferredRepository::Sync(repository) => {
					self.save_sync(&work.model, repository.as_ref(), work.records, &mut pool)?;
				}
				PreferredRepository::Async(repository) => {
					self.save_async(&work.model, repository.as_ref(), work.records, &mut pool)
						.await?;
				}
			}
		}
		tracing::info!(models = order.len(), entities = pool.len(), "fixtures loaded");
		Ok(pool)
	}

	/// Known fixtures and the filtered load order.
	fn plan(
		&self,
		options: &LoadOptions,
	) -> FixtureResult<(IndexMap<String, FixtureDefinition>, Vec<String>)> {
		let definitions = self.definitions()?;
		let mut order = DependencyResolver::new(&definitions).resolve_order(definitions.keys())?;
		if let Some(names) = &options.names {
			order.retain(|name| names.contains(name));
		}
		tracing::debug!(order = ?order, "fixture load order");
		Ok((definitions, order))
	}

	/// Resolves the data and repository of a model. `None` skips the model.
	fn prepare(&self, fixture: &FixtureDefinition, pool: &EntityPool) -> FixtureResult<Option<ModelLoad>> {
		let model = fixture.name();
		let data = fixture.resolve_data(&self.settings.tsv_dir, pool)?;

		let repository = match self.provider.preferred_repository(model) {
			Ok(repository) => repository,
			Err(error) => {
				tracing::error!(model, error = %error, "skipping fixture without repository");
				return Ok(None);
			}
		};

		let Some(data) = data else {
			return Err(FixtureError::InvalidFixtureData {
				model: model.to_string(),
				path: fixture.path().map(ToOwned::to_owned).unwrap_or_default(),
			});
		};

		let records: Vec<Record> = data
			.into_iter()
			.map(|(id, mut record)| {
				record.insert(ID_PROP.to_string(), Value::String(id));
				record
			})
			.collect();
		tracing::debug!(model, records = records.len(), "inserting records");

		Ok(Some(ModelLoad {
			model: model.to_string(),
			repository,
			records,
		}))
	}

	fn save_sync(
		&self,
		model: &str,
		repository: &dyn Repository,
		records: Vec<Record>,
		pool: &mut EntityPool,
	) -> FixtureResult<()> {
		for (index, batch) in batches(records, self.settings.batch_size).enumerate() {
			tracing::trace!(model, batch = index, size = batch.len(), "saving batch");
			for record in batch {
				let instance = repository.save(record, &SaveOptions::fixture(pool))?;
				pool.set(instance);
			}
		}
		Ok(())
	}

	async fn save_async(
		&self,
		model: &str,
		repository: &dyn AsyncRepository,
		records: Vec<Record>,
		pool: &mut EntityPool,
	) -> FixtureResult<()> {
		for (index, batch) in batches(records, self.settings.batch_size).enumerate() {
			tracing::trace!(model, batch = index, size = batch.len(), "saving batch");
			let results = {
				let options = SaveOptions::fixture(pool);
				join_all(batch.into_iter().map(|record| repository.save(record, &options))).await
			};
			for result in results {
				pool.set(result?);
			}
		}
		Ok(())
	}
}

impl std::fmt::Debug for FixtureLoader {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FixtureLoader")
			.field("settings", &self.settings)
			.field("fixtures", &self.fixtures.keys().collect::<Vec<_>>())
			.finish_non_exhaustive()
	}
}

/// Splits `records` into consecutive batches of at most `size` records.
fn batches(records: Vec<Record>, size: usize) -> impl Iterator<Item = Vec<Record>> {
	let size = size.max(1);
	let mut records = records.into_iter();
	std::iter::from_fn(move || {
		let batch: Vec<Record> = records.by_ref().take(size).collect();
		(!batch.is_empty()).then_some(batch)
	})
}
