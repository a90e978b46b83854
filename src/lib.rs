//! # seedling
//!
//! Dependency-ordered fixture loading and model hydration for domain-model
//! frameworks.
//!
//! seedling turns declarative, file-based fixtures into live, linked model
//! instances. It is made of two layers:
//!
//! - [`domain`]: model schemas, the [`ObjectMaterializer`](domain::ObjectMaterializer)
//!   turning plain records into typed instances, and the
//!   [`EntityPool`](domain::EntityPool) of entities created during a run
//! - [`fixtures`]: fixture discovery, dependency ordering and batched
//!   persistence through synchronous or asynchronous repositories
//!
//! ## Feature Flags
//!
//! - `fixtures` (default) - Fixture loading on top of the domain layer
//!
//! ## Quick Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use seedling::prelude::*;
//! use serde_json::json;
//!
//! # fn main() -> FixtureResult<()> {
//! let models = Arc::new(
//! 	ModelRegistry::new()
//! 		.with(ModelDefinition::entity("team").prop(PropertyDef::id("id")))
//! 		.with(
//! 			ModelDefinition::entity("member")
//! 				.prop(PropertyDef::id("id"))
//! 				.prop(PropertyDef::entity("team", "team")),
//! 		),
//! );
//!
//! let repositories = Arc::new(RepositoryRegistry::new());
//! repositories.register_sync(MemoryRepository::new("team", Arc::clone(&models)));
//! repositories.register_sync(MemoryRepository::new("member", Arc::clone(&models)));
//!
//! let mut teams = RecordMap::new();
//! teams.insert("t1".to_string(), Record::new());
//! let mut members = RecordMap::new();
//! let mut ann = Record::new();
//! ann.insert("teamId".to_string(), json!("t1"));
//! members.insert("m1".to_string(), ann);
//!
//! let loader = FixtureLoader::new(repositories, LoaderSettings::new())?
//! 	.with_fixture(FixtureDefinition::records("team", teams))
//! 	.with_fixture(FixtureDefinition::records("member", members).with_dependencies(["team"]));
//!
//! let pool = loader.load(&LoadOptions::new())?;
//! let member = pool.get("member", &json!("m1")).expect("member is loaded");
//! assert!(member.as_entity().is_some_and(|m| m.is_set("team")));
//! # Ok(())
//! # }
//! ```

pub mod domain;
#[cfg(feature = "fixtures")]
pub mod fixtures;

/// Convenience re-exports for common usage.
pub mod prelude {
	pub use seedling_domain::prelude::*;

	#[cfg(feature = "fixtures")]
	pub use seedling_fixtures::prelude::*;
}
