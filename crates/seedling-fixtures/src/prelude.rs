//! Convenience re-exports for common usage.
//!
//! ```ignore
//! use seedling_fixtures::prelude::*;
//! ```

// Error types
pub use crate::error::{FixtureError, FixtureResult};

// Fixture types
pub use crate::config::LoaderSettings;
pub use crate::definition::{FixtureDefinition, FixtureSource, LoaderScope, Record, RecordMap};
pub use crate::loader::{FixtureLoader, LoadOptions};
pub use crate::resolver::DependencyResolver;

// Repository types
pub use crate::repository::{
	AsyncMemoryRepository, AsyncRepository, MasterRepository, MemoryRepository, PreferredRepository,
	Repository, RepositoryProvider, RepositoryRegistry, SaveMethod, SaveOptions,
};
