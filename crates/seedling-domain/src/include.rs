//! Inclusion of related entities.
//!
//! An entity-typed property (`author` referencing a `user`) is usually given
//! in a record only through its identifier property (`authorId`). The
//! include step fills such properties in: first from the [`EntityPool`] of
//! the current run, then, when including asynchronously, from an
//! [`AsyncEntityResolver`].

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;

use crate::error::{DomainError, DomainResult};
use crate::instance::{Entity, ModelInstance};
use crate::pool::EntityPool;
use crate::registry::ModelRegistry;
use crate::schema::ModelSchema;

/// Options of the include step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncludeOptions {
	/// Restricts inclusion to these properties. `None` includes every
	/// entity-typed property.
	pub props: Option<Vec<String>>,
}

impl IncludeOptions {
	/// Includes every entity-typed property.
	pub fn new() -> Self {
		Self::default()
	}

	/// Includes only the given properties.
	pub fn only<I, S>(props: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			props: Some(props.into_iter().map(Into::into).collect()),
		}
	}

	fn wants(&self, prop: &str) -> bool {
		self.props
			.as_ref()
			.is_none_or(|props| props.iter().any(|p| p == prop))
	}
}

/// Asynchronous source of entities not found in the pool, typically a
/// repository backed by remote storage.
#[async_trait]
pub trait AsyncEntityResolver: Send + Sync {
	/// Fetches the entity of `model` identified by `id`.
	async fn resolve(&self, model: &str, id: &Value) -> DomainResult<Option<ModelInstance>>;
}

struct Pending {
	prop: String,
	model: String,
	id: Value,
}

pub(crate) struct Includer<'a> {
	registry: &'a ModelRegistry,
	options: &'a IncludeOptions,
	pool: Option<&'a EntityPool>,
}

impl<'a> Includer<'a> {
	pub(crate) fn new(
		registry: &'a ModelRegistry,
		options: &'a IncludeOptions,
		pool: Option<&'a EntityPool>,
	) -> Self {
		Self {
			registry,
			options,
			pool,
		}
	}

	/// Includes related entities into `instance` and every instance nested
	/// in it. Returns the number of properties filled in.
	pub(crate) fn include(&self, instance: &mut ModelInstance) -> DomainResult<usize> {
		let mut count = 0;
		match instance {
			ModelInstance::Entity(entity) => {
				for nested in entity.nested_models_mut() {
					count += self.include(nested)?;
				}
				for pending in self.pending(entity)? {
					if let Some(found) = self.from_pool(&pending) {
						entity.set(pending.prop, found)?;
						count += 1;
					}
				}
			}
			ModelInstance::List(list) => {
				for item in list.items_mut() {
					count += self.include(item)?;
				}
			}
			ModelInstance::Dict(dict) => {
				for item in dict.items_mut() {
					count += self.include(item)?;
				}
			}
		}
		Ok(count)
	}

	/// Asynchronous variant of [`Includer::include`]; misses in the pool are
	/// looked up through `resolver`.
	pub(crate) fn include_async<'s>(
		&'s self,
		instance: &'s mut ModelInstance,
		resolver: Option<&'s dyn AsyncEntityResolver>,
	) -> BoxFuture<'s, DomainResult<usize>> {
		async move {
			let mut count = 0;
			match instance {
				ModelInstance::Entity(entity) => {
					for nested in entity.nested_models_mut() {
						count += self.include_async(nested, resolver).await?;
					}
					for pending in self.pending(entity)? {
						let found = match self.from_pool(&pending) {
							Some(found) => Some(found),
							None => match resolver {
								Some(resolver) => resolver
									.resolve(&pending.model, &pending.id)
									.await
									.map_err(|e| DomainError::IncludeError {
										model: entity.model().to_string(),
										prop: pending.prop.clone(),
										message: e.to_string(),
									})?,
								None => None,
							},
						};
						if let Some(found) = found {
							entity.set(pending.prop, found)?;
							count += 1;
						}
					}
				}
				ModelInstance::List(list) => {
					for item in list.items_mut() {
						count += self.include_async(item, resolver).await?;
					}
				}
				ModelInstance::Dict(dict) => {
					for item in dict.items_mut() {
						count += self.include_async(item, resolver).await?;
					}
				}
			}
			Ok(count)
		}
		.boxed()
	}

	fn pending(&self, entity: &Entity) -> DomainResult<Vec<Pending>> {
		let definition = self.registry.get(entity.model())?;
		let mut pending = Vec::new();
		for prop in definition.all_props() {
			if !definition.is_entity(prop) || !self.options.wants(prop) || entity.is_set(prop) {
				continue;
			}
			let (Some(model), Some(id_prop)) =
				(definition.sub_model_name(prop), definition.id_prop_for(prop))
			else {
				continue;
			};
			if let Some(id) = entity.value(id_prop) {
				pending.push(Pending {
					prop: prop.to_string(),
					model: model.to_string(),
					id: id.clone(),
				});
			}
		}
		Ok(pending)
	}

	fn from_pool(&self, pending: &Pending) -> Option<ModelInstance> {
		let found = self.pool?.get(&pending.model, &pending.id);
		if found.is_none() {
			tracing::trace!(
				model = %pending.model,
				id = %pending.id,
				prop = %pending.prop,
				"related entity not in pool"
			);
		}
		found.map(|instance| (*instance).clone())
	}
}
