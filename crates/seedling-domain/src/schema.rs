//! Model schema definitions.
//!
//! A [`ModelDefinition`] describes one model: whether it is a scalar entity,
//! an ordered list or a keyed dict, and which properties it declares. The
//! materializer only talks to it through the read-only [`ModelSchema`] trait,
//! so hosts with their own schema representation can plug it in.
//!
//! # Example
//!
//! ```
//! use seedling_domain::schema::{ModelDefinition, ModelKind, PropertyDef};
//! use serde_json::json;
//!
//! let user = ModelDefinition::entity("user")
//! 	.prop(PropertyDef::id("id"))
//! 	.prop(PropertyDef::new("name"))
//! 	.prop(PropertyDef::new("tags").default_value(json!([])))
//! 	.prop(PropertyDef::entity("team", "team"));
//!
//! assert_eq!(user.kind(), &ModelKind::Entity);
//! assert_eq!(user.props().count(), 4);
//! ```

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::instance::ID_PROP;

/// Read-only view of a model's declared properties.
pub trait ModelSchema: Send + Sync {
	/// Name of the model this schema describes.
	fn model_name(&self) -> &str;

	/// Every declared property, in declaration order.
	fn all_props(&self) -> Vec<&str>;

	/// Returns true if the property may be left out.
	fn is_optional(&self, prop: &str) -> bool;

	/// Returns true if the property is the identifier.
	fn is_id(&self, prop: &str) -> bool;

	/// Returns true if the property references an entity (as opposed to a
	/// collection or a value object).
	fn is_entity(&self, prop: &str) -> bool;

	/// Name of the sub-model the property references, if any.
	fn sub_model_name(&self, prop: &str) -> Option<&str>;

	/// Default value declared for the property, if any.
	fn default_value(&self, prop: &str) -> Option<&DefaultValue>;

	/// Name of the property holding the identifier of an entity-typed
	/// property (`authorId` for `author`).
	fn id_prop_for(&self, prop: &str) -> Option<&str>;

	/// The declared identifier property, if any.
	fn id_prop(&self) -> Option<&str> {
		self.all_props().into_iter().find(|prop| self.is_id(prop))
	}
}

/// Default value of a property.
#[derive(Clone)]
pub enum DefaultValue {
	/// A literal value. Each instance receives its own copy.
	Value(Value),
	/// A function producing a fresh value for every instance.
	Factory(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl DefaultValue {
	/// Produces the value to assign to a new instance.
	pub fn produce(&self) -> Value {
		match self {
			Self::Value(value) => value.clone(),
			Self::Factory(factory) => factory(),
		}
	}
}

impl fmt::Debug for DefaultValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
			Self::Factory(_) => f.write_str("Factory(..)"),
		}
	}
}

/// Declaration of a single property.
#[derive(Debug, Clone)]
pub struct PropertyDef {
	name: String,
	optional: bool,
	id: bool,
	sub_model: Option<String>,
	entity: bool,
	id_prop: Option<String>,
	default: Option<DefaultValue>,
}

impl PropertyDef {
	/// Declares a plain value property.
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			optional: false,
			id: false,
			sub_model: None,
			entity: false,
			id_prop: None,
			default: None,
		}
	}

	/// Declares the identifier property.
	pub fn id(name: impl Into<String>) -> Self {
		Self {
			id: true,
			..Self::new(name)
		}
	}

	/// Declares a property holding a non-entity sub-model (a value object
	/// or a collection).
	pub fn sub_model(name: impl Into<String>, model: impl Into<String>) -> Self {
		Self {
			sub_model: Some(model.into()),
			..Self::new(name)
		}
	}

	/// Declares a property referencing another entity.
	///
	/// The identifier is expected in `<name>Id` unless overridden with
	/// [`PropertyDef::with_id_prop`].
	pub fn entity(name: impl Into<String>, model: impl Into<String>) -> Self {
		let name = name.into();
		Self {
			id_prop: Some(format!("{name}Id")),
			sub_model: Some(model.into()),
			entity: true,
			..Self::new(name)
		}
	}

	/// Marks the property optional.
	pub fn optional(mut self) -> Self {
		self.optional = true;
		self
	}

	/// Sets a literal default value.
	pub fn default_value(mut self, value: Value) -> Self {
		self.default = Some(DefaultValue::Value(value));
		self
	}

	/// Sets a default produced by calling `factory` for every instance.
	pub fn default_with<F>(mut self, factory: F) -> Self
	where
		F: Fn() -> Value + Send + Sync + 'static,
	{
		self.default = Some(DefaultValue::Factory(Arc::new(factory)));
		self
	}

	/// Overrides the identifier property of an entity-typed property.
	pub fn with_id_prop(mut self, id_prop: impl Into<String>) -> Self {
		self.id_prop = Some(id_prop.into());
		self
	}

	/// Property name.
	pub fn name(&self) -> &str {
		&self.name
	}
}

/// Kind of model, fixed when the model is registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelKind {
	/// Scalar, identity-bearing model.
	Entity,
	/// Ordered collection of `item_model` instances.
	List {
		/// Model of the items.
		item_model: String,
	},
	/// Keyed collection of `item_model` instances.
	Dict {
		/// Model of the items.
		item_model: String,
	},
}

impl ModelKind {
	/// Item model of a collection kind.
	pub fn item_model(&self) -> Option<&str> {
		match self {
			Self::Entity => None,
			Self::List { item_model } | Self::Dict { item_model } => Some(item_model),
		}
	}
}

/// Concrete model description implementing [`ModelSchema`].
#[derive(Debug, Clone)]
pub struct ModelDefinition {
	name: String,
	kind: ModelKind,
	props: IndexMap<String, PropertyDef>,
	immutable: bool,
}

impl ModelDefinition {
	fn with_kind(name: impl Into<String>, kind: ModelKind) -> Self {
		Self {
			name: name.into(),
			kind,
			props: IndexMap::new(),
			immutable: false,
		}
	}

	/// Describes an entity model.
	pub fn entity(name: impl Into<String>) -> Self {
		Self::with_kind(name, ModelKind::Entity)
	}

	/// Describes a list model holding `item_model` instances.
	pub fn list(name: impl Into<String>, item_model: impl Into<String>) -> Self {
		Self::with_kind(
			name,
			ModelKind::List {
				item_model: item_model.into(),
			},
		)
	}

	/// Describes a dict model holding `item_model` instances.
	pub fn dict(name: impl Into<String>, item_model: impl Into<String>) -> Self {
		Self::with_kind(
			name,
			ModelKind::Dict {
				item_model: item_model.into(),
			},
		)
	}

	/// Adds a property declaration. A later declaration with the same name
	/// replaces the earlier one.
	pub fn prop(mut self, prop: PropertyDef) -> Self {
		self.props.insert(prop.name.clone(), prop);
		self
	}

	/// Marks instances of this model immutable; they are frozen once
	/// materialization (including inclusion) has finished.
	pub fn immutable(mut self) -> Self {
		self.immutable = true;
		self
	}

	/// Model name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Model kind.
	pub fn kind(&self) -> &ModelKind {
		&self.kind
	}

	/// Whether instances are frozen after materialization.
	pub fn is_immutable(&self) -> bool {
		self.immutable
	}

	/// Property identifying instances: the declared identifier, or `id`
	/// when none is declared.
	pub fn identifier(&self) -> &str {
		self.id_prop().unwrap_or(ID_PROP)
	}

	/// Declared properties.
	pub fn props(&self) -> impl Iterator<Item = &PropertyDef> {
		self.props.values()
	}

	fn get(&self, prop: &str) -> Option<&PropertyDef> {
		self.props.get(prop)
	}
}

impl ModelSchema for ModelDefinition {
	fn model_name(&self) -> &str {
		&self.name
	}

	fn all_props(&self) -> Vec<&str> {
		self.props.keys().map(String::as_str).collect()
	}

	fn is_optional(&self, prop: &str) -> bool {
		self.get(prop).is_some_and(|p| p.optional)
	}

	fn is_id(&self, prop: &str) -> bool {
		self.get(prop).is_some_and(|p| p.id)
	}

	fn is_entity(&self, prop: &str) -> bool {
		self.get(prop).is_some_and(|p| p.entity)
	}

	fn sub_model_name(&self, prop: &str) -> Option<&str> {
		self.get(prop).and_then(|p| p.sub_model.as_deref())
	}

	fn default_value(&self, prop: &str) -> Option<&DefaultValue> {
		self.get(prop).and_then(|p| p.default.as_ref())
	}

	fn id_prop_for(&self, prop: &str) -> Option<&str> {
		self.get(prop).and_then(|p| p.id_prop.as_deref())
	}
}
