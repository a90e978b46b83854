//! Object materialization.
//!
//! [`ObjectMaterializer`] turns a plain JSON record into a live
//! [`ModelInstance`], driven by the model definitions in a
//! [`ModelRegistry`]:
//!
//! - `Some(Value::Null)` yields `None`, whatever the model kind.
//! - `None` (no record at all) is treated as an empty record, so every
//!   default applies.
//! - Sub-model properties are materialized recursively with the same rules,
//!   except that a value of the wrong shape (a scalar where an entity record
//!   or a collection is expected) becomes null instead of an error.
//! - Lists and dicts accept an array of item records, an array of item ids,
//!   or the wrapped `{ "items": .. }` / `{ "ids": .. }` form.
//!
//! # Example
//!
//! ```
//! use seedling_domain::prelude::*;
//! use serde_json::json;
//!
//! let registry = ModelRegistry::new().with(
//! 	ModelDefinition::entity("user")
//! 		.prop(PropertyDef::id("id"))
//! 		.prop(PropertyDef::new("name"))
//! 		.prop(PropertyDef::new("roles").default_value(json!(["member"]))),
//! );
//!
//! let materializer = ObjectMaterializer::new(&registry);
//! let user = materializer
//! 	.materialize("user", Some(&json!({"id": "u1", "name": "Ann"})), &MaterializeOptions::new())
//! 	.unwrap()
//! 	.unwrap();
//!
//! let entity = user.as_entity().unwrap();
//! assert_eq!(entity.value("roles"), Some(&json!(["member"])));
//! ```

use std::borrow::Cow;

use serde_json::{Map, Value};

use crate::error::{DomainError, DomainResult};
use crate::include::{AsyncEntityResolver, IncludeOptions, Includer};
use crate::instance::{Entity, ModelDict, ModelInstance, ModelList, PropValue};
use crate::pool::EntityPool;
use crate::registry::ModelRegistry;
use crate::schema::{DefaultValue, ModelDefinition, ModelKind, ModelSchema};

/// Options of a materialization.
#[derive(Debug, Clone, Default)]
pub struct MaterializeOptions<'a> {
	/// Include related entities after building. Off unless set.
	pub include: Option<IncludeOptions>,
	/// Pool related entities are looked up in.
	pub entity_pool: Option<&'a EntityPool>,
}

impl<'a> MaterializeOptions<'a> {
	/// Creates default options (no inclusion).
	pub fn new() -> Self {
		Self::default()
	}

	/// Enables the include step.
	pub fn with_include(mut self, include: IncludeOptions) -> Self {
		self.include = Some(include);
		self
	}

	/// Sets the pool related entities are looked up in.
	pub fn with_entity_pool(mut self, pool: &'a EntityPool) -> Self {
		self.entity_pool = Some(pool);
		self
	}
}

/// Builds model instances from plain records.
#[derive(Debug, Clone, Copy)]
pub struct ObjectMaterializer<'r> {
	registry: &'r ModelRegistry,
}

/// Source of a collection's contents.
enum CollectionSeed<'v> {
	Items(Vec<&'v Value>),
	Keyed(Vec<(&'v String, &'v Value)>),
	Ids(Vec<Value>),
}

impl<'r> ObjectMaterializer<'r> {
	/// Creates a materializer over `registry`.
	pub fn new(registry: &'r ModelRegistry) -> Self {
		Self { registry }
	}

	/// Materializes `input` as an instance of `model`.
	///
	/// Immutable instances are frozen once inclusion has finished.
	///
	/// # Errors
	///
	/// Fails if a referenced model is not registered or a record does not
	/// have the shape its model requires.
	pub fn materialize(
		&self,
		model: &str,
		input: Option<&Value>,
		options: &MaterializeOptions<'_>,
	) -> DomainResult<Option<ModelInstance>> {
		let Some(mut instance) = self.build(model, input)? else {
			return Ok(None);
		};
		if let Some(include) = &options.include {
			let included =
				Includer::new(self.registry, include, options.entity_pool).include(&mut instance)?;
			tracing::trace!(model, included, "included related entities");
		}
		self.seal(&mut instance)?;
		Ok(Some(instance))
	}

	/// Asynchronous variant of [`ObjectMaterializer::materialize`]: the
	/// include step awaits `resolver` for entities missing from the pool.
	pub async fn materialize_async(
		&self,
		model: &str,
		input: Option<&Value>,
		options: &MaterializeOptions<'_>,
		resolver: Option<&dyn AsyncEntityResolver>,
	) -> DomainResult<Option<ModelInstance>> {
		let Some(mut instance) = self.build(model, input)? else {
			return Ok(None);
		};
		if let Some(include) = &options.include {
			let included = Includer::new(self.registry, include, options.entity_pool)
				.include_async(&mut instance, resolver)
				.await?;
			tracing::trace!(model, included, "included related entities");
		}
		self.seal(&mut instance)?;
		Ok(Some(instance))
	}

	/// Creates an instance with only defaults applied.
	pub fn create_empty(&self, model: &str) -> DomainResult<ModelInstance> {
		self.materialize(model, None, &MaterializeOptions::new())?
			.ok_or_else(|| DomainError::ModelNotFound(model.to_string()))
	}

	fn build(&self, model: &str, input: Option<&Value>) -> DomainResult<Option<ModelInstance>> {
		if matches!(input, Some(Value::Null)) {
			return Ok(None);
		}
		let definition = self.registry.get(model)?;
		let instance = match definition.kind() {
			ModelKind::Entity => ModelInstance::Entity(self.build_entity(&definition, input)?),
			ModelKind::List { item_model } => {
				ModelInstance::List(self.build_list(&definition, item_model, input)?)
			}
			ModelKind::Dict { item_model } => {
				ModelInstance::Dict(self.build_dict(&definition, item_model, input)?)
			}
		};
		Ok(Some(instance))
	}

	fn build_entity(&self, definition: &ModelDefinition, input: Option<&Value>) -> DomainResult<Entity> {
		let empty = Map::new();
		let record = match input {
			None => &empty,
			Some(Value::Object(record)) => record,
			Some(other) => {
				return Err(invalid(
					definition.name(),
					format!("expected an object, got {}", json_kind(other)),
				));
			}
		};

		let mut entity = Entity::new(definition.name()).with_id_prop(definition.identifier());
		for (prop, value) in record {
			if value.is_null() && definition.is_optional(prop) {
				continue;
			}
			let value = match definition.sub_model_name(prop) {
				Some(sub_model) => PropValue::from(self.build_nested(sub_model, value)?),
				None => PropValue::from(value.clone()),
			};
			entity.set(prop.clone(), value)?;
		}
		self.apply_defaults(definition, record, &mut entity)?;
		Ok(entity)
	}

	/// Materializes the value of a sub-model property or collection item.
	/// A value that cannot hold the model materializes as nothing.
	fn build_nested(&self, model: &str, value: &Value) -> DomainResult<Option<ModelInstance>> {
		let fits = match self.registry.get(model)?.kind() {
			ModelKind::Entity => value.is_object(),
			ModelKind::List { .. } | ModelKind::Dict { .. } => value.is_object() || value.is_array(),
		};
		if !fits {
			if !value.is_null() {
				tracing::debug!(model, value = json_kind(value), "nested value does not fit the model, using null");
			}
			return Ok(None);
		}
		self.build(model, Some(value))
	}

	/// Gives every declared property that is still unassigned a value.
	///
	/// Identifier, optional and entity-typed properties, and properties the
	/// record mentioned, are never defaulted; they are marked absent.
	fn apply_defaults(
		&self,
		definition: &ModelDefinition,
		record: &Map<String, Value>,
		entity: &mut Entity,
	) -> DomainResult<()> {
		for prop in definition.all_props() {
			if entity.contains(prop) {
				continue;
			}
			let value = if record.contains_key(prop)
				|| definition.is_id(prop)
				|| definition.is_optional(prop)
			{
				PropValue::Absent
			} else {
				let default = definition.default_value(prop);
				match definition.sub_model_name(prop) {
					Some(_) if definition.is_entity(prop) => PropValue::Absent,
					Some(sub_model) => {
						let built = match default.map(DefaultValue::produce) {
							Some(seed) => self.build_nested(sub_model, &seed)?,
							None => self.build(sub_model, None)?,
						};
						PropValue::from(built)
					}
					None => default.map_or(PropValue::Absent, |d| PropValue::from(d.produce())),
				}
			};
			entity.set(prop, value)?;
		}
		Ok(())
	}

	fn build_list(
		&self,
		definition: &ModelDefinition,
		item_model: &str,
		input: Option<&Value>,
	) -> DomainResult<ModelList> {
		let list = ModelList::new(definition.name(), item_model);
		match collection_seed(definition.name(), input)? {
			CollectionSeed::Ids(ids) => Ok(list.with_ids(ids)),
			seed => {
				let mut list = list;
				for item in self.build_items(item_model, seed)? {
					list.push(item)?;
				}
				Ok(list)
			}
		}
	}

	fn build_dict(
		&self,
		definition: &ModelDefinition,
		item_model: &str,
		input: Option<&Value>,
	) -> DomainResult<ModelDict> {
		let dict = ModelDict::new(definition.name(), item_model);
		match collection_seed(definition.name(), input)? {
			CollectionSeed::Ids(ids) => Ok(dict.with_ids(ids)),
			seed => {
				let mut dict = dict;
				for item in self.build_items(item_model, seed)? {
					dict.insert(item)?;
				}
				Ok(dict)
			}
		}
	}

	fn build_items(&self, item_model: &str, seed: CollectionSeed<'_>) -> DomainResult<Vec<ModelInstance>> {
		let records: Vec<Cow<'_, Value>> = match seed {
			CollectionSeed::Items(values) => values.into_iter().map(Cow::Borrowed).collect(),
			CollectionSeed::Keyed(entries) => {
				let item = self.registry.get(item_model)?;
				entries
					.into_iter()
					.map(|(key, value)| with_key_as_id(key, value, item.identifier()))
					.collect()
			}
			CollectionSeed::Ids(_) => Vec::new(),
		};
		let mut items = Vec::with_capacity(records.len());
		for record in &records {
			if let Some(item) = self.build_nested(item_model, record.as_ref())? {
				items.push(item);
			}
		}
		Ok(items)
	}

	/// Freezes every instance of an immutable model, innermost first.
	fn seal(&self, instance: &mut ModelInstance) -> DomainResult<()> {
		match instance {
			ModelInstance::Entity(entity) => {
				for nested in entity.nested_models_mut() {
					self.seal(nested)?;
				}
			}
			ModelInstance::List(list) => {
				for item in list.items_mut() {
					self.seal(item)?;
				}
			}
			ModelInstance::Dict(dict) => {
				for item in dict.items_mut() {
					self.seal(item)?;
				}
			}
		}
		if self.registry.get(instance.model_name())?.is_immutable() {
			instance.freeze();
		}
		Ok(())
	}
}

fn collection_seed<'v>(model: &str, input: Option<&'v Value>) -> DomainResult<CollectionSeed<'v>> {
	let Some(value) = input else {
		return Ok(CollectionSeed::Items(Vec::new()));
	};
	match value {
		Value::Array(values) => Ok(seed_from_array(values)),
		Value::Object(map) => match (map.get("items"), map.get("ids")) {
			(Some(Value::Array(values)), _) => Ok(CollectionSeed::Items(values.iter().collect())),
			(Some(Value::Object(keyed)), _) => Ok(CollectionSeed::Keyed(keyed.iter().collect())),
			(Some(Value::Null), _) => Ok(CollectionSeed::Items(Vec::new())),
			(Some(other), _) => Err(invalid(
				model,
				format!("'items' must be an array or an object, got {}", json_kind(other)),
			)),
			(None, Some(Value::Array(ids))) => Ok(CollectionSeed::Ids(ids.clone())),
			(None, Some(Value::Null)) => Ok(CollectionSeed::Ids(Vec::new())),
			(None, Some(other)) => Err(invalid(
				model,
				format!("'ids' must be an array, got {}", json_kind(other)),
			)),
			(None, None) => Ok(CollectionSeed::Keyed(map.iter().collect())),
		},
		other => Err(invalid(
			model,
			format!("expected an array or an object, got {}", json_kind(other)),
		)),
	}
}

/// An array whose first element is an object holds item records; any other
/// array holds item ids.
fn seed_from_array(values: &[Value]) -> CollectionSeed<'_> {
	if values.first().is_some_and(Value::is_object) {
		CollectionSeed::Items(values.iter().collect())
	} else {
		CollectionSeed::Ids(values.to_vec())
	}
}

fn with_key_as_id<'v>(key: &str, value: &'v Value, id_prop: &str) -> Cow<'v, Value> {
	match value {
		Value::Object(record) if !record.contains_key(id_prop) => {
			let mut record = record.clone();
			record.insert(id_prop.to_string(), Value::String(key.to_string()));
			Cow::Owned(Value::Object(record))
		}
		_ => Cow::Borrowed(value),
	}
}

fn invalid(model: &str, reason: String) -> DomainError {
	DomainError::InvalidRecord {
		model: model.to_string(),
		reason,
	}
}

fn json_kind(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "a boolean",
		Value::Number(_) => "a number",
		Value::String(_) => "a string",
		Value::Array(_) => "an array",
		Value::Object(_) => "an object",
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::schema::PropertyDef;
	use rstest::{fixture, rstest};
	use serde_json::json;

	#[fixture]
	fn registry() -> ModelRegistry {
		ModelRegistry::new()
			.with(
				ModelDefinition::entity("user")
					.prop(PropertyDef::id("id"))
					.prop(PropertyDef::new("name"))
					.prop(PropertyDef::new("nickname").optional())
					.prop(PropertyDef::new("settings").default_value(json!({"theme": "dark"})))
					.prop(PropertyDef::new("age")),
			)
			.with(ModelDefinition::list("user-list", "user"))
			.with(ModelDefinition::dict("user-dict", "user"))
	}

	#[rstest]
	fn test_null_yields_none(registry: ModelRegistry) {
		let materializer = ObjectMaterializer::new(&registry);
		for model in ["user", "user-list", "user-dict", "not-registered"] {
			let result = materializer
				.materialize(model, Some(&Value::Null), &MaterializeOptions::new())
				.unwrap();
			assert!(result.is_none(), "{model} should materialize null as None");
		}
	}

	#[rstest]
	fn test_optional_null_is_skipped(registry: ModelRegistry) {
		let materializer = ObjectMaterializer::new(&registry);
		let user = materializer
			.materialize(
				"user",
				Some(&json!({"id": "u1", "nickname": null, "name": null})),
				&MaterializeOptions::new(),
			)
			.unwrap()
			.unwrap();
		let entity = user.as_entity().unwrap();

		assert_eq!(entity.get("name"), Some(&PropValue::Null));
		assert_eq!(entity.get("nickname"), Some(&PropValue::Absent));
	}

	#[rstest]
	fn test_non_object_top_level_record_is_rejected(registry: ModelRegistry) {
		let materializer = ObjectMaterializer::new(&registry);
		let result = materializer.materialize("user", Some(&json!("u1")), &MaterializeOptions::new());
		assert!(matches!(result, Err(DomainError::InvalidRecord { .. })));
	}

	#[rstest]
	fn test_nested_scalar_becomes_null(registry: ModelRegistry) {
		// Arrange
		let registry = registry.with(
			ModelDefinition::entity("team")
				.prop(PropertyDef::id("id"))
				.prop(PropertyDef::entity("owner", "user"))
				.prop(PropertyDef::sub_model("members", "user-list"))
				.prop(PropertyDef::sub_model("roster", "user-dict")),
		);
		let materializer = ObjectMaterializer::new(&registry);

		// Act
		let team = materializer
			.materialize(
				"team",
				Some(&json!({"id": "t1", "owner": "u1", "members": 3, "roster": true})),
				&MaterializeOptions::new(),
			)
			.unwrap()
			.unwrap();

		// Assert
		let team = team.as_entity().unwrap();
		assert_eq!(team.get("owner"), Some(&PropValue::Null));
		assert_eq!(team.get("members"), Some(&PropValue::Null));
		assert_eq!(team.get("roster"), Some(&PropValue::Null));
	}

	#[rstest]
	fn test_scalar_items_are_skipped(registry: ModelRegistry) {
		let materializer = ObjectMaterializer::new(&registry);
		let list = materializer
			.materialize(
				"user-list",
				Some(&json!({"items": [{"id": "a"}, "b", {"id": "c"}]})),
				&MaterializeOptions::new(),
			)
			.unwrap()
			.unwrap();

		assert_eq!(list.as_list().unwrap().ids(), &[json!("a"), json!("c")]);
	}

	#[rstest]
	fn test_dict_of_custom_id_items() {
		// Arrange
		let registry = ModelRegistry::new()
			.with(
				ModelDefinition::entity("currency")
					.prop(PropertyDef::id("code"))
					.prop(PropertyDef::new("name")),
			)
			.with(ModelDefinition::dict("currency-dict", "currency"));
		let materializer = ObjectMaterializer::new(&registry);

		// Act
		let from_items = materializer
			.materialize(
				"currency-dict",
				Some(&json!([{"code": "JPY"}, {"code": "EUR"}])),
				&MaterializeOptions::new(),
			)
			.unwrap()
			.unwrap();
		let from_keys = materializer
			.materialize(
				"currency-dict",
				Some(&json!({"USD": {"name": "dollar"}})),
				&MaterializeOptions::new(),
			)
			.unwrap()
			.unwrap();

		// Assert
		let from_items = from_items.as_dict().unwrap();
		assert_eq!(from_items.keys().collect::<Vec<_>>(), vec!["JPY", "EUR"]);
		assert_eq!(from_items.get("EUR").and_then(ModelInstance::id), Some(&json!("EUR")));
		let usd = from_keys.as_dict().unwrap().get("USD").and_then(ModelInstance::as_entity).unwrap();
		assert_eq!(usd.value("code"), Some(&json!("USD")));
		assert_eq!(usd.get("id"), None);
	}

	#[rstest]
	fn test_unknown_model(registry: ModelRegistry) {
		let materializer = ObjectMaterializer::new(&registry);
		let result = materializer.materialize("ghost", None, &MaterializeOptions::new());
		assert!(matches!(result, Err(DomainError::ModelNotFound(_))));
	}

	#[rstest]
	fn test_list_of_ids(registry: ModelRegistry) {
		let materializer = ObjectMaterializer::new(&registry);
		let list = materializer
			.materialize("user-list", Some(&json!(["a", "b"])), &MaterializeOptions::new())
			.unwrap()
			.unwrap();
		let list = list.as_list().unwrap();

		assert!(list.is_empty());
		assert_eq!(list.ids(), &[json!("a"), json!("b")]);
	}

	#[rstest]
	fn test_dict_from_keyed_object(registry: ModelRegistry) {
		let materializer = ObjectMaterializer::new(&registry);
		let dict = materializer
			.materialize(
				"user-dict",
				Some(&json!({"a": {"name": "Ann"}, "b": {"name": "Bob"}})),
				&MaterializeOptions::new(),
			)
			.unwrap()
			.unwrap();
		let dict = dict.as_dict().unwrap();

		assert_eq!(dict.len(), 2);
		assert_eq!(
			dict.get("b").and_then(ModelInstance::as_entity).and_then(|e| e.value("name")),
			Some(&json!("Bob"))
		);
	}

	#[rstest]
	fn test_collection_rejects_scalar(registry: ModelRegistry) {
		let materializer = ObjectMaterializer::new(&registry);
		let result = materializer.materialize("user-list", Some(&json!(3)), &MaterializeOptions::new());
		assert!(matches!(result, Err(DomainError::InvalidRecord { .. })));
	}

	#[rstest]
	fn test_create_empty(registry: ModelRegistry) {
		let materializer = ObjectMaterializer::new(&registry);
		let user = materializer.create_empty("user").unwrap();
		let entity = user.as_entity().unwrap();

		assert_eq!(entity.get("age"), Some(&PropValue::Absent));
		assert_eq!(entity.value("settings"), Some(&json!({"theme": "dark"})));
	}
}
