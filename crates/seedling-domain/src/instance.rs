//! Live model instances.
//!
//! Materialization produces a [`ModelInstance`], a closed set of three
//! shapes: a scalar [`Entity`], an ordered [`ModelList`] or a keyed
//! [`ModelDict`]. Instances can be frozen, after which every mutating
//! method fails with [`DomainError::Frozen`].

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::{DomainError, DomainResult};

/// Name of the identifier property of entities whose model declares none.
pub const ID_PROP: &str = "id";

/// Converts an identifier value into the string key used for lookups.
///
/// Strings are used as is and numbers are rendered; any other value has no
/// key.
///
/// ```
/// # use seedling_domain::instance::id_key;
/// # use serde_json::json;
/// assert_eq!(id_key(&json!("u1")), Some("u1".to_string()));
/// assert_eq!(id_key(&json!(42)), Some("42".to_string()));
/// assert_eq!(id_key(&json!(null)), None);
/// ```
pub fn id_key(value: &Value) -> Option<String> {
	match value {
		Value::String(s) => Some(s.clone()),
		Value::Number(n) => Some(n.to_string()),
		_ => None,
	}
}

/// Value held by an entity property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
	/// Declared but never given a value.
	Absent,
	/// Explicitly null.
	Null,
	/// Plain JSON value.
	Value(Value),
	/// Nested model instance.
	Model(Box<ModelInstance>),
}

impl PropValue {
	/// Returns true for a value or a nested model.
	pub fn is_present(&self) -> bool {
		matches!(self, Self::Value(_) | Self::Model(_))
	}

	/// Plain value, if any.
	pub fn as_value(&self) -> Option<&Value> {
		match self {
			Self::Value(value) => Some(value),
			_ => None,
		}
	}

	/// Nested model, if any.
	pub fn as_model(&self) -> Option<&ModelInstance> {
		match self {
			Self::Model(model) => Some(model),
			_ => None,
		}
	}

	/// JSON rendering. Absent values have none.
	pub fn to_json(&self) -> Option<Value> {
		match self {
			Self::Absent => None,
			Self::Null => Some(Value::Null),
			Self::Value(value) => Some(value.clone()),
			Self::Model(model) => Some(model.to_json()),
		}
	}
}

impl From<Value> for PropValue {
	fn from(value: Value) -> Self {
		match value {
			Value::Null => Self::Null,
			value => Self::Value(value),
		}
	}
}

impl From<ModelInstance> for PropValue {
	fn from(model: ModelInstance) -> Self {
		Self::Model(Box::new(model))
	}
}

impl From<Option<ModelInstance>> for PropValue {
	fn from(model: Option<ModelInstance>) -> Self {
		model.map_or(Self::Null, Self::from)
	}
}

/// Scalar, identity-bearing model instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
	model: String,
	id_prop: String,
	props: IndexMap<String, PropValue>,
	frozen: bool,
}

impl Entity {
	/// Creates an empty instance of `model`, identified by `id`.
	pub fn new(model: impl Into<String>) -> Self {
		Self {
			model: model.into(),
			id_prop: ID_PROP.to_string(),
			props: IndexMap::new(),
			frozen: false,
		}
	}

	/// Sets the property holding the identifier.
	pub fn with_id_prop(mut self, prop: impl Into<String>) -> Self {
		self.id_prop = prop.into();
		self
	}

	/// Name of the property holding the identifier.
	pub fn id_prop(&self) -> &str {
		&self.id_prop
	}

	/// Model name.
	pub fn model(&self) -> &str {
		&self.model
	}

	/// Identifier value, if set.
	pub fn id(&self) -> Option<&Value> {
		self.value(&self.id_prop)
	}

	/// Property value, if the property has been assigned at all.
	pub fn get(&self, prop: &str) -> Option<&PropValue> {
		self.props.get(prop)
	}

	/// Plain value of a property.
	pub fn value(&self, prop: &str) -> Option<&Value> {
		self.get(prop).and_then(PropValue::as_value)
	}

	/// Mutable plain value of a property.
	///
	/// # Errors
	///
	/// Returns [`DomainError::Frozen`] if the instance is frozen.
	pub fn value_mut(&mut self, prop: &str) -> DomainResult<Option<&mut Value>> {
		if self.frozen {
			return Err(DomainError::Frozen(self.model.clone()));
		}
		Ok(match self.props.get_mut(prop) {
			Some(PropValue::Value(value)) => Some(value),
			_ => None,
		})
	}

	/// Nested model of a property.
	pub fn model_prop(&self, prop: &str) -> Option<&ModelInstance> {
		self.get(prop).and_then(PropValue::as_model)
	}

	/// Returns true if the property has been assigned, even to absence.
	pub fn contains(&self, prop: &str) -> bool {
		self.props.contains_key(prop)
	}

	/// Returns true if the property holds a value or a nested model.
	pub fn is_set(&self, prop: &str) -> bool {
		self.get(prop).is_some_and(PropValue::is_present)
	}

	/// Assigns a property.
	///
	/// # Errors
	///
	/// Returns [`DomainError::Frozen`] if the instance is frozen.
	pub fn set(&mut self, prop: impl Into<String>, value: impl Into<PropValue>) -> DomainResult<()> {
		if self.frozen {
			return Err(DomainError::Frozen(self.model.clone()));
		}
		self.props.insert(prop.into(), value.into());
		Ok(())
	}

	/// Iterates over assigned properties in assignment order.
	pub fn props(&self) -> impl Iterator<Item = (&str, &PropValue)> {
		self.props.iter().map(|(k, v)| (k.as_str(), v))
	}

	pub(crate) fn nested_models_mut(&mut self) -> impl Iterator<Item = &mut ModelInstance> {
		self.props.values_mut().filter_map(|value| match value {
			PropValue::Model(model) => Some(model.as_mut()),
			_ => None,
		})
	}

	/// Freezes the instance.
	pub fn freeze(&mut self) {
		self.frozen = true;
	}

	/// Returns true if the instance is frozen.
	pub fn is_frozen(&self) -> bool {
		self.frozen
	}

	/// JSON rendering of every assigned, non-absent property.
	pub fn to_json(&self) -> Value {
		let map: Map<String, Value> = self
			.props
			.iter()
			.filter_map(|(k, v)| v.to_json().map(|json| (k.clone(), json)))
			.collect();
		Value::Object(map)
	}
}

/// Ordered collection of model instances.
///
/// A list built from bare identifiers carries only [`ModelList::ids`]; its
/// items are left for the repository layer to fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelList {
	model: String,
	item_model: String,
	items: Vec<ModelInstance>,
	ids: Vec<Value>,
	frozen: bool,
}

impl ModelList {
	/// Creates an empty list.
	pub fn new(model: impl Into<String>, item_model: impl Into<String>) -> Self {
		Self {
			model: model.into(),
			item_model: item_model.into(),
			items: Vec::new(),
			ids: Vec::new(),
			frozen: false,
		}
	}

	pub(crate) fn with_ids(mut self, ids: Vec<Value>) -> Self {
		self.ids = ids;
		self
	}

	/// Model name of the list.
	pub fn model(&self) -> &str {
		&self.model
	}

	/// Model name of the items.
	pub fn item_model(&self) -> &str {
		&self.item_model
	}

	/// Number of items.
	pub fn len(&self) -> usize {
		self.items.len()
	}

	/// Returns true if there are no items.
	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	/// First item.
	pub fn first(&self) -> Option<&ModelInstance> {
		self.items.first()
	}

	/// Last item.
	pub fn last(&self) -> Option<&ModelInstance> {
		self.items.last()
	}

	/// Item at `index`.
	pub fn get(&self, index: usize) -> Option<&ModelInstance> {
		self.items.get(index)
	}

	/// Iterates over the items.
	pub fn iter(&self) -> std::slice::Iter<'_, ModelInstance> {
		self.items.iter()
	}

	/// Identifiers of the items.
	pub fn ids(&self) -> &[Value] {
		&self.ids
	}

	/// Appends an item.
	pub fn push(&mut self, item: ModelInstance) -> DomainResult<()> {
		self.ensure_mutable()?;
		if let Some(id) = item.id() {
			self.ids.push(id.clone());
		}
		self.items.push(item);
		Ok(())
	}

	/// Removes the item at `index`, returning it.
	pub fn remove(&mut self, index: usize) -> DomainResult<Option<ModelInstance>> {
		self.ensure_mutable()?;
		if index >= self.items.len() {
			return Ok(None);
		}
		let item = self.items.remove(index);
		if let Some(id) = item.id()
			&& let Some(pos) = self.ids.iter().position(|v| v == id)
		{
			self.ids.remove(pos);
		}
		Ok(Some(item))
	}

	/// Removes every item.
	pub fn clear(&mut self) -> DomainResult<()> {
		self.ensure_mutable()?;
		self.items.clear();
		self.ids.clear();
		Ok(())
	}

	/// Copies the items into a vector.
	pub fn to_vec(&self) -> Vec<ModelInstance> {
		self.items.clone()
	}

	pub(crate) fn items_mut(&mut self) -> impl Iterator<Item = &mut ModelInstance> {
		self.items.iter_mut()
	}

	/// Freezes the list.
	pub fn freeze(&mut self) {
		self.frozen = true;
	}

	/// Returns true if the list is frozen.
	pub fn is_frozen(&self) -> bool {
		self.frozen
	}

	fn ensure_mutable(&self) -> DomainResult<()> {
		if self.frozen {
			return Err(DomainError::Frozen(self.model.clone()));
		}
		Ok(())
	}

	/// JSON rendering: item records, or bare ids when no item was loaded.
	pub fn to_json(&self) -> Value {
		if self.items.is_empty() && !self.ids.is_empty() {
			return Value::Array(self.ids.clone());
		}
		Value::Array(self.items.iter().map(ModelInstance::to_json).collect())
	}
}

impl<'a> IntoIterator for &'a ModelList {
	type Item = &'a ModelInstance;
	type IntoIter = std::slice::Iter<'a, ModelInstance>;

	fn into_iter(self) -> Self::IntoIter {
		self.items.iter()
	}
}

/// Keyed collection of model instances, keyed by item identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDict {
	model: String,
	item_model: String,
	items: IndexMap<String, ModelInstance>,
	ids: Vec<Value>,
	frozen: bool,
}

impl ModelDict {
	/// Creates an empty dict.
	pub fn new(model: impl Into<String>, item_model: impl Into<String>) -> Self {
		Self {
			model: model.into(),
			item_model: item_model.into(),
			items: IndexMap::new(),
			ids: Vec::new(),
			frozen: false,
		}
	}

	pub(crate) fn with_ids(mut self, ids: Vec<Value>) -> Self {
		self.ids = ids;
		self
	}

	/// Model name of the dict.
	pub fn model(&self) -> &str {
		&self.model
	}

	/// Model name of the items.
	pub fn item_model(&self) -> &str {
		&self.item_model
	}

	/// Number of items.
	pub fn len(&self) -> usize {
		self.items.len()
	}

	/// Returns true if there are no items.
	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	/// Item stored under `key`.
	pub fn get(&self, key: &str) -> Option<&ModelInstance> {
		self.items.get(key)
	}

	/// Returns true if an item is stored under `key`.
	pub fn contains(&self, key: &str) -> bool {
		self.items.contains_key(key)
	}

	/// Keys in insertion order.
	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.items.keys().map(String::as_str)
	}

	/// Iterates over `(key, item)` pairs.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &ModelInstance)> {
		self.items.iter().map(|(k, v)| (k.as_str(), v))
	}

	/// Identifiers of the items.
	pub fn ids(&self) -> &[Value] {
		&self.ids
	}

	/// Inserts an item under its identifier, replacing an existing one.
	///
	/// # Errors
	///
	/// Fails if the dict is frozen or the item has no identifier.
	pub fn insert(&mut self, item: ModelInstance) -> DomainResult<()> {
		self.ensure_mutable()?;
		let Some(id) = item.id().cloned() else {
			return Err(self.missing_id());
		};
		let key = id_key(&id).ok_or_else(|| self.missing_id())?;
		if self.items.insert(key, item).is_none() {
			self.ids.push(id);
		}
		Ok(())
	}

	/// Removes the item stored under `key`.
	pub fn remove(&mut self, key: &str) -> DomainResult<Option<ModelInstance>> {
		self.ensure_mutable()?;
		let removed = self.items.shift_remove(key);
		if removed.is_some() {
			self.ids.retain(|id| id_key(id).as_deref() != Some(key));
		}
		Ok(removed)
	}

	/// Removes every item.
	pub fn clear(&mut self) -> DomainResult<()> {
		self.ensure_mutable()?;
		self.items.clear();
		self.ids.clear();
		Ok(())
	}

	pub(crate) fn items_mut(&mut self) -> impl Iterator<Item = &mut ModelInstance> {
		self.items.values_mut()
	}

	/// Freezes the dict.
	pub fn freeze(&mut self) {
		self.frozen = true;
	}

	/// Returns true if the dict is frozen.
	pub fn is_frozen(&self) -> bool {
		self.frozen
	}

	fn ensure_mutable(&self) -> DomainResult<()> {
		if self.frozen {
			return Err(DomainError::Frozen(self.model.clone()));
		}
		Ok(())
	}

	fn missing_id(&self) -> DomainError {
		DomainError::InvalidRecord {
			model: self.model.clone(),
			reason: format!("item of model '{}' has no identifier", self.item_model),
		}
	}

	/// JSON rendering: an object keyed by id, or bare ids when no item was
	/// loaded.
	pub fn to_json(&self) -> Value {
		if self.items.is_empty() && !self.ids.is_empty() {
			return Value::Array(self.ids.clone());
		}
		Value::Object(
			self.items
				.iter()
				.map(|(k, v)| (k.clone(), v.to_json()))
				.collect(),
		)
	}
}

/// Result of materialization.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelInstance {
	/// Scalar entity.
	Entity(Entity),
	/// Ordered collection.
	List(ModelList),
	/// Keyed collection.
	Dict(ModelDict),
}

impl ModelInstance {
	/// Model name.
	pub fn model_name(&self) -> &str {
		match self {
			Self::Entity(entity) => entity.model(),
			Self::List(list) => list.model(),
			Self::Dict(dict) => dict.model(),
		}
	}

	/// Identifier; only entities carry one.
	pub fn id(&self) -> Option<&Value> {
		self.as_entity().and_then(Entity::id)
	}

	/// Returns true for entities.
	pub fn is_entity(&self) -> bool {
		matches!(self, Self::Entity(_))
	}

	/// Entity view.
	pub fn as_entity(&self) -> Option<&Entity> {
		match self {
			Self::Entity(entity) => Some(entity),
			_ => None,
		}
	}

	/// Mutable entity view.
	pub fn as_entity_mut(&mut self) -> Option<&mut Entity> {
		match self {
			Self::Entity(entity) => Some(entity),
			_ => None,
		}
	}

	/// List view.
	pub fn as_list(&self) -> Option<&ModelList> {
		match self {
			Self::List(list) => Some(list),
			_ => None,
		}
	}

	/// Dict view.
	pub fn as_dict(&self) -> Option<&ModelDict> {
		match self {
			Self::Dict(dict) => Some(dict),
			_ => None,
		}
	}

	/// Freezes this instance (not its nested instances).
	pub fn freeze(&mut self) {
		match self {
			Self::Entity(entity) => entity.freeze(),
			Self::List(list) => list.freeze(),
			Self::Dict(dict) => dict.freeze(),
		}
	}

	/// Returns true if this instance is frozen.
	pub fn is_frozen(&self) -> bool {
		match self {
			Self::Entity(entity) => entity.is_frozen(),
			Self::List(list) => list.is_frozen(),
			Self::Dict(dict) => dict.is_frozen(),
		}
	}

	/// JSON rendering.
	pub fn to_json(&self) -> Value {
		match self {
			Self::Entity(entity) => entity.to_json(),
			Self::List(list) => list.to_json(),
			Self::Dict(dict) => dict.to_json(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	fn user(id: &str) -> ModelInstance {
		let mut entity = Entity::new("user");
		entity.set("id", json!(id)).unwrap();
		ModelInstance::Entity(entity)
	}

	#[rstest]
	fn test_prop_value_from_json() {
		assert_eq!(PropValue::from(json!(null)), PropValue::Null);
		assert_eq!(PropValue::from(json!(3)), PropValue::Value(json!(3)));
		assert!(!PropValue::Absent.is_present());
		assert!(!PropValue::Null.is_present());
		assert_eq!(PropValue::Absent.to_json(), None);
	}

	#[rstest]
	fn test_entity_set_and_get() {
		let mut entity = Entity::new("user");
		entity.set("id", json!("u1")).unwrap();
		entity.set("nickname", PropValue::Absent).unwrap();

		assert_eq!(entity.id(), Some(&json!("u1")));
		assert!(entity.contains("nickname"));
		assert!(!entity.is_set("nickname"));
		assert_eq!(entity.to_json(), json!({"id": "u1"}));
	}

	#[rstest]
	fn test_entity_custom_id_prop() {
		let mut entity = Entity::new("currency").with_id_prop("code");
		entity.set("id", json!("ignored")).unwrap();
		entity.set("code", json!("JPY")).unwrap();

		assert_eq!(entity.id_prop(), "code");
		assert_eq!(entity.id(), Some(&json!("JPY")));
	}

	#[rstest]
	fn test_frozen_entity_rejects_set() {
		let mut entity = Entity::new("country");
		entity.freeze();

		let result = entity.set("name", json!("Japan"));
		assert!(matches!(result, Err(DomainError::Frozen(model)) if model == "country"));
	}

	#[rstest]
	fn test_list_operations() {
		let mut list = ModelList::new("user-list", "user");
		list.push(user("a")).unwrap();
		list.push(user("b")).unwrap();
		list.push(user("c")).unwrap();

		assert_eq!(list.len(), 3);
		assert_eq!(list.first().and_then(ModelInstance::id), Some(&json!("a")));
		assert_eq!(list.last().and_then(ModelInstance::id), Some(&json!("c")));

		let removed = list.remove(1).unwrap().unwrap();
		assert_eq!(removed.id(), Some(&json!("b")));
		assert_eq!(list.ids(), &[json!("a"), json!("c")]);
		assert!(list.remove(10).unwrap().is_none());

		list.clear().unwrap();
		assert!(list.is_empty());
		assert!(list.ids().is_empty());
	}

	#[rstest]
	fn test_list_ids_only_renders_ids() {
		let list = ModelList::new("user-list", "user").with_ids(vec![json!(1), json!(2)]);
		assert!(list.is_empty());
		assert_eq!(list.to_json(), json!([1, 2]));
	}

	#[rstest]
	fn test_dict_operations() {
		let mut dict = ModelDict::new("user-dict", "user");
		dict.insert(user("a")).unwrap();
		dict.insert(user("b")).unwrap();
		dict.insert(user("a")).unwrap();

		assert_eq!(dict.len(), 2);
		assert_eq!(dict.keys().collect::<Vec<_>>(), vec!["a", "b"]);
		assert_eq!(dict.ids(), &[json!("a"), json!("b")]);

		dict.remove("a").unwrap();
		assert!(!dict.contains("a"));
		assert_eq!(dict.ids(), &[json!("b")]);
	}

	#[rstest]
	fn test_dict_insert_without_id() {
		let mut dict = ModelDict::new("user-dict", "user");
		let result = dict.insert(ModelInstance::Entity(Entity::new("user")));
		assert!(matches!(result, Err(DomainError::InvalidRecord { .. })));
	}

	#[rstest]
	fn test_frozen_collections() {
		let mut list = ModelList::new("user-list", "user");
		list.freeze();
		assert!(list.push(user("a")).is_err());
		assert!(list.clear().is_err());

		let mut dict = ModelDict::new("user-dict", "user");
		dict.freeze();
		assert!(dict.insert(user("a")).is_err());
	}

	#[rstest]
	fn test_instance_accessors() {
		let instance = user("x");
		assert!(instance.is_entity());
		assert_eq!(instance.model_name(), "user");
		assert!(instance.as_list().is_none());

		let list = ModelInstance::List(ModelList::new("user-list", "user"));
		assert_eq!(list.id(), None);
		assert_eq!(list.model_name(), "user-list");
	}
}
