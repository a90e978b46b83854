//! In-memory repositories.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::RwLock;
use seedling_domain::instance::{ID_PROP, id_key};
use seedling_domain::{DomainError, IncludeOptions, MaterializeOptions, ModelInstance, ModelRegistry, ObjectMaterializer};
use serde_json::Value;

use super::{AsyncRepository, Repository, SaveMethod, SaveOptions};
use crate::definition::Record;
use crate::error::{FixtureError, FixtureResult};

/// Repository keeping materialized entities in memory.
///
/// Saved records are materialized with related entities included from the
/// save's entity pool. A record without a value for the model's identifier
/// property takes its `id` field (the fixture key), or else a sequential
/// identifier.
#[derive(Debug)]
pub struct MemoryRepository {
	model: String,
	registry: Arc<ModelRegistry>,
	entities: RwLock<IndexMap<String, ModelInstance>>,
	next_id: AtomicU64,
}

impl MemoryRepository {
	/// Creates an empty repository of `model`.
	pub fn new(model: impl Into<String>, registry: Arc<ModelRegistry>) -> Self {
		Self {
			model: model.into(),
			registry,
			entities: RwLock::new(IndexMap::new()),
			next_id: AtomicU64::new(1),
		}
	}

	/// Number of stored entities.
	pub fn len(&self) -> usize {
		self.entities.read().len()
	}

	/// Returns true if nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.entities.read().is_empty()
	}

	/// Every stored entity, in insertion order.
	pub fn all(&self) -> Vec<ModelInstance> {
		self.entities.read().values().cloned().collect()
	}

	fn materialize(&self, record: Record, options: &SaveOptions<'_>) -> FixtureResult<ModelInstance> {
		let mut materialize = MaterializeOptions::new().with_include(IncludeOptions::new());
		if let Some(pool) = options.entity_pool {
			materialize = materialize.with_entity_pool(pool);
		}
		ObjectMaterializer::new(&self.registry)
			.materialize(&self.model, Some(&Value::Object(record)), &materialize)?
			.ok_or_else(|| {
				FixtureError::Domain(DomainError::InvalidRecord {
					model: self.model.clone(),
					reason: "record materialized to nothing".to_string(),
				})
			})
	}

	fn key(&self, id: &Value) -> FixtureResult<String> {
		id_key(id).ok_or_else(|| {
			FixtureError::Domain(DomainError::InvalidRecord {
				model: self.model.clone(),
				reason: format!("identifier must be a string or a number, got {id}"),
			})
		})
	}

	fn assign_id(&self, record: &mut Record) -> FixtureResult<()> {
		let definition = self.registry.get(&self.model)?;
		let id_prop = definition.identifier();
		if record.get(id_prop).is_none_or(Value::is_null) {
			let id = match record.get(ID_PROP) {
				Some(key) if id_key(key).is_some() => key.clone(),
				_ => Value::String(self.next_id.fetch_add(1, Ordering::Relaxed).to_string()),
			};
			record.insert(id_prop.to_string(), id);
		}
		Ok(())
	}
}

impl Repository for MemoryRepository {
	fn model_name(&self) -> &str {
		&self.model
	}

	fn save(&self, mut record: Record, options: &SaveOptions<'_>) -> FixtureResult<ModelInstance> {
		self.assign_id(&mut record)?;
		let instance = self.materialize(record, options)?;
		let id = instance.id().cloned().unwrap_or_default();
		let key = self.key(&id)?;

		let mut entities = self.entities.write();
		if options.method == SaveMethod::Create && entities.contains_key(&key) {
			return Err(FixtureError::AlreadyExists {
				model: self.model.clone(),
				id: key,
			});
		}
		tracing::trace!(model = %self.model, id = %key, "stored entity");
		entities.insert(key, instance.clone());
		Ok(instance)
	}

	fn get(&self, id: &Value) -> FixtureResult<Option<ModelInstance>> {
		let key = self.key(id)?;
		Ok(self.entities.read().get(&key).cloned())
	}

	fn update(&self, id: &Value, record: Record) -> FixtureResult<ModelInstance> {
		let key = self.key(id)?;
		let current = self.get(id)?.ok_or_else(|| FixtureError::NotFound {
			model: self.model.clone(),
			id: key.clone(),
		})?;

		let mut merged = match current.to_json() {
			Value::Object(map) => map,
			_ => Record::new(),
		};
		merged.extend(record);
		let definition = self.registry.get(&self.model)?;
		merged.insert(definition.identifier().to_string(), id.clone());

		let instance = self.materialize(merged, &SaveOptions::new())?;
		self.entities.write().insert(key, instance.clone());
		Ok(instance)
	}

	fn delete(&self, id: &Value) -> FixtureResult<bool> {
		let key = self.key(id)?;
		Ok(self.entities.write().shift_remove(&key).is_some())
	}
}

/// Asynchronous in-memory repository.
///
/// Behaves like [`MemoryRepository`] but yields to the runtime before every
/// operation, like a repository backed by remote storage would.
#[derive(Debug)]
pub struct AsyncMemoryRepository {
	inner: MemoryRepository,
}

impl AsyncMemoryRepository {
	/// Creates an empty repository of `model`.
	pub fn new(model: impl Into<String>, registry: Arc<ModelRegistry>) -> Self {
		Self {
			inner: MemoryRepository::new(model, registry),
		}
	}

	/// Underlying synchronous store.
	pub fn store(&self) -> &MemoryRepository {
		&self.inner
	}
}

#[async_trait]
impl AsyncRepository for AsyncMemoryRepository {
	fn model_name(&self) -> &str {
		self.inner.model_name()
	}

	async fn save(&self, record: Record, options: &SaveOptions<'_>) -> FixtureResult<ModelInstance> {
		tokio::task::yield_now().await;
		self.inner.save(record, options)
	}

	async fn get(&self, id: &Value) -> FixtureResult<Option<ModelInstance>> {
		tokio::task::yield_now().await;
		self.inner.get(id)
	}

	async fn update(&self, id: &Value, record: Record) -> FixtureResult<ModelInstance> {
		tokio::task::yield_now().await;
		self.inner.update(id, record)
	}

	async fn delete(&self, id: &Value) -> FixtureResult<bool> {
		tokio::task::yield_now().await;
		self.inner.delete(id)
	}
}
