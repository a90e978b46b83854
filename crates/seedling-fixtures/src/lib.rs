//! Fixture loading for seedling.
//!
//! This crate turns declarative, file-based fixtures into persisted,
//! linked model instances:
//!
//! - **Discovery**: fixtures are read from `<fixture dir>/data/<model>.json`
//!   or `.toml`, or registered in code
//! - **Ordering**: [`DependencyResolver`] puts every model after the models
//!   it depends on, rejecting unknown names and cycles
//! - **Loading**: [`FixtureLoader`] saves records model by model, in
//!   batches, through synchronous or asynchronous repositories
//! - **Linking**: every saved entity joins the run's
//!   [`EntityPool`](seedling_domain::EntityPool), from which later records
//!   include the entities they reference
//!
//! # Quick Start
//!
//! Create a fixture file (`fixtures/data/user.json`):
//!
//! ```json
//! {
//!   "dependencies": ["team"],
//!   "data": {
//!     "u1": { "name": "Ann", "teamId": "t1" }
//!   }
//! }
//! ```
//!
//! Records can also come from a TSV file in `fixtures/tsvs/`:
//!
//! ```json
//! { "data": "teams.tsv" }
//! ```
//!
//! Load everything:
//!
//! ```ignore
//! use seedling_fixtures::prelude::*;
//!
//! let loader = FixtureLoader::new(repositories, LoaderSettings::new().with_fixture_dir("fixtures"))?;
//! let pool = loader.load_async(&LoadOptions::new()).await?;
//! println!("Loaded {} entities", pool.len());
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod definition;
pub mod discovery;
pub mod error;
pub mod loader;
pub mod prelude;
pub mod repository;
pub mod resolver;
pub mod tsv;

pub use config::LoaderSettings;
pub use definition::{FixtureDefinition, FixtureSource, LoaderScope, Record, RecordMap};
pub use error::{FixtureError, FixtureResult};
pub use loader::{FixtureLoader, LoadOptions};
pub use repository::{
	AsyncMemoryRepository, AsyncRepository, MasterRepository, MemoryRepository, PreferredRepository,
	Repository, RepositoryProvider, RepositoryRegistry, SaveMethod, SaveOptions,
};
pub use resolver::DependencyResolver;
