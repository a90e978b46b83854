//! Error types for fixture loading.
//!
//! This module defines the error types used throughout the seedling-fixtures
//! crate.

use std::path::PathBuf;

use seedling_domain::DomainError;
use thiserror::Error;

/// Errors that can occur while loading fixtures.
#[derive(Debug, Error)]
pub enum FixtureError {
	/// A model name has no fixture definition. Usually the name comes from
	/// the `dependencies` list of another fixture.
	#[error("Model '{0}' is not found. It might be written in some 'dependencies' property")]
	ModelNotFound(String),

	/// The dependency graph contains a cycle.
	#[error("Dependency chain is making a loop: {}", path.join(" -> "))]
	DependencyLoop {
		/// Names along the loop, starting and ending with the same name.
		path: Vec<String>,
	},

	/// The fixture provided no usable data.
	#[error("Invalid fixture in model '{model}'. Check the fixture file: {}", path.display())]
	InvalidFixtureData {
		/// Model of the fixture.
		model: String,
		/// File the fixture was read from.
		path: PathBuf,
	},

	/// No repository could be resolved for a model.
	#[error("Repository for model '{model}' is unavailable: {reason}")]
	RepositoryUnavailable {
		/// Model whose repository was requested.
		model: String,
		/// Why it could not be resolved.
		reason: String,
	},

	/// No stored entity has the identifier.
	#[error("Entity '{id}' of model '{model}' not found")]
	NotFound {
		/// Model of the repository.
		model: String,
		/// Requested identifier.
		id: String,
	},

	/// A create met an entity with the same identifier.
	#[error("Entity '{id}' of model '{model}' already exists")]
	AlreadyExists {
		/// Model of the repository.
		model: String,
		/// Conflicting identifier.
		id: String,
	},

	/// The synchronous load met an asynchronous repository.
	#[error("Repository of model '{0}' is asynchronous; use the asynchronous load")]
	AsyncRepositoryInSyncLoad(String),

	/// Save without fixture insertion on a master repository.
	#[error("Cannot save with MasterRepository (model '{0}')")]
	CannotSaveWithMasterRepository(String),

	/// Update on a master repository.
	#[error("Cannot update with MasterRepository (model '{0}')")]
	CannotUpdateWithMasterRepository(String),

	/// Delete on a master repository.
	#[error("Cannot delete with MasterRepository (model '{0}')")]
	CannotDeleteWithMasterRepository(String),

	/// Master data is disabled in the loader settings.
	#[error("MasterRepository of model '{0}' is disabled. Enable master data in the loader settings")]
	MasterNotFound(String),

	/// Loader settings are invalid.
	#[error("Invalid settings: {field}: {message}")]
	InvalidSettings {
		/// Offending setting.
		field: String,
		/// What is wrong with it.
		message: String,
	},

	/// I/O operation failed.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	/// JSON fixture file could not be parsed.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	/// TOML fixture or settings file could not be parsed.
	#[error("TOML error: {0}")]
	Toml(#[from] toml::de::Error),

	/// TSV file could not be parsed.
	#[error("TSV error: {0}")]
	Tsv(#[from] csv::Error),

	/// Materialization or instance error.
	#[error(transparent)]
	Domain(#[from] DomainError),
}

/// Result type alias for fixture operations.
pub type FixtureResult<T> = Result<T, FixtureError>;
