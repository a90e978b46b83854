//! Domain layer module.
//!
//! This module provides model schemas, object materialization and the
//! entity pool.
//!
//! # Examples
//!
//! ```rust
//! use seedling::domain::{MaterializeOptions, ModelDefinition, ModelRegistry, ObjectMaterializer};
//!
//! let registry = ModelRegistry::new().with(ModelDefinition::entity("user"));
//! let user = ObjectMaterializer::new(&registry)
//! 	.materialize("user", None, &MaterializeOptions::new())
//! 	.unwrap();
//! assert!(user.is_some());
//! ```

pub use seedling_domain::*;
