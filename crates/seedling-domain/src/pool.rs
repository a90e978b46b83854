//! Entity pool.
//!
//! The pool accumulates every entity produced during one fixture load so that
//! later fixtures (and the include step of the materializer) can reference
//! entities created earlier in the same run. It is append-only and is
//! discarded when the run completes.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::instance::{ModelInstance, id_key};

/// Key of an entity in the pool: model name plus identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PoolKey {
	model: String,
	id: String,
}

impl PoolKey {
	/// Builds a key; `None` if `id` is neither a string nor a number.
	pub fn new(model: impl Into<String>, id: &Value) -> Option<Self> {
		Some(Self {
			model: model.into(),
			id: id_key(id)?,
		})
	}

	/// Key of an instance; only entities with an identifier have one.
	pub fn of(instance: &ModelInstance) -> Option<Self> {
		Self::new(instance.model_name(), instance.id()?)
	}

	/// Model name.
	pub fn model(&self) -> &str {
		&self.model
	}

	/// Identifier rendered as a string.
	pub fn id(&self) -> &str {
		&self.id
	}
}

/// Registry of entities created during a load run.
#[derive(Debug, Clone, Default)]
pub struct EntityPool {
	entries: IndexMap<PoolKey, Arc<ModelInstance>>,
}

impl EntityPool {
	/// Creates an empty pool.
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts an instance, replacing any entity with the same key, and
	/// returns the shared handle.
	///
	/// Instances without a key (collections, entities without an id) are
	/// handed back without being pooled.
	pub fn set(&mut self, instance: ModelInstance) -> Arc<ModelInstance> {
		let instance = Arc::new(instance);
		match PoolKey::of(&instance) {
			Some(key) => {
				self.entries.insert(key, Arc::clone(&instance));
			}
			None => {
				tracing::debug!(
					model = instance.model_name(),
					"instance has no identifier, not pooled"
				);
			}
		}
		instance
	}

	/// Looks up an entity by model name and identifier.
	pub fn get(&self, model: &str, id: &Value) -> Option<Arc<ModelInstance>> {
		let key = PoolKey::new(model, id)?;
		self.get_by_key(&key)
	}

	/// Looks up an entity by key.
	pub fn get_by_key(&self, key: &PoolKey) -> Option<Arc<ModelInstance>> {
		self.entries.get(key).cloned()
	}

	/// Returns true if an entity with the given model and id is pooled.
	pub fn contains(&self, model: &str, id: &Value) -> bool {
		PoolKey::new(model, id).is_some_and(|key| self.entries.contains_key(&key))
	}

	/// Entities of one model, in insertion order.
	pub fn entities_of<'a>(&'a self, model: &'a str) -> impl Iterator<Item = &'a Arc<ModelInstance>> {
		self.entries
			.iter()
			.filter(move |(key, _)| key.model == model)
			.map(|(_, instance)| instance)
	}

	/// Distinct model names present in the pool, in first-seen order.
	pub fn models(&self) -> Vec<&str> {
		let mut models: Vec<&str> = Vec::new();
		for key in self.entries.keys() {
			if !models.contains(&key.model.as_str()) {
				models.push(&key.model);
			}
		}
		models
	}

	/// Iterates over every pooled entity.
	pub fn iter(&self) -> impl Iterator<Item = (&PoolKey, &Arc<ModelInstance>)> {
		self.entries.iter()
	}

	/// Number of pooled entities.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Returns true if the pool is empty.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}
