//! Domain layer of seedling: model schemas, object materialization and the
//! entity pool.
//!
//! This crate provides:
//!
//! - **Schema**: [`ModelDefinition`] and the read-only [`ModelSchema`] trait
//!   describing a model's properties, defaults and kind
//! - **Registry**: [`ModelRegistry`] mapping model names to definitions
//! - **Instances**: [`ModelInstance`], a closed union of [`Entity`],
//!   [`ModelList`] and [`ModelDict`]
//! - **Materialization**: [`ObjectMaterializer`], turning plain JSON records
//!   into instances, recursively and with schema defaults
//! - **Entity pool**: [`EntityPool`], the per-run registry of created
//!   entities used to link records to each other
//!
//! # Quick Start
//!
//! ```
//! use seedling_domain::prelude::*;
//! use serde_json::json;
//!
//! let registry = ModelRegistry::new()
//! 	.with(
//! 		ModelDefinition::entity("team")
//! 			.prop(PropertyDef::id("id"))
//! 			.prop(PropertyDef::new("name")),
//! 	)
//! 	.with(
//! 		ModelDefinition::entity("member")
//! 			.prop(PropertyDef::id("id"))
//! 			.prop(PropertyDef::entity("team", "team")),
//! 	);
//!
//! let materializer = ObjectMaterializer::new(&registry);
//! let mut pool = EntityPool::new();
//! let team = materializer
//! 	.materialize("team", Some(&json!({"id": "t1", "name": "core"})), &MaterializeOptions::new())
//! 	.unwrap()
//! 	.unwrap();
//! pool.set(team);
//!
//! let options = MaterializeOptions::new()
//! 	.with_include(IncludeOptions::new())
//! 	.with_entity_pool(&pool);
//! let member = materializer
//! 	.materialize("member", Some(&json!({"id": "m1", "teamId": "t1"})), &options)
//! 	.unwrap()
//! 	.unwrap();
//!
//! assert!(member.as_entity().unwrap().is_set("team"));
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod include;
pub mod instance;
pub mod materializer;
pub mod pool;
pub mod prelude;
pub mod registry;
pub mod schema;

pub use error::{DomainError, DomainResult};
pub use include::{AsyncEntityResolver, IncludeOptions};
pub use instance::{Entity, ModelDict, ModelInstance, ModelList, PropValue};
pub use materializer::{MaterializeOptions, ObjectMaterializer};
pub use pool::{EntityPool, PoolKey};
pub use registry::ModelRegistry;
pub use schema::{DefaultValue, ModelDefinition, ModelKind, ModelSchema, PropertyDef};
