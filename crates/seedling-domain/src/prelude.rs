//! Convenience re-exports for common usage.
//!
//! ```ignore
//! use seedling_domain::prelude::*;
//! ```

pub use crate::error::{DomainError, DomainResult};
pub use crate::include::{AsyncEntityResolver, IncludeOptions};
pub use crate::instance::{Entity, ModelDict, ModelInstance, ModelList, PropValue};
pub use crate::materializer::{MaterializeOptions, ObjectMaterializer};
pub use crate::pool::{EntityPool, PoolKey};
pub use crate::registry::ModelRegistry;
pub use crate::schema::{DefaultValue, ModelDefinition, ModelKind, ModelSchema, PropertyDef};
