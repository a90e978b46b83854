//! Error types for the domain layer.
//!
//! This module defines the errors raised while looking up model definitions,
//! materializing records and mutating model instances.

use thiserror::Error;

/// Errors that can occur while working with models.
#[derive(Debug, Error)]
pub enum DomainError {
	/// Model was not found in the registry.
	#[error("Model not found: {0}")]
	ModelNotFound(String),

	/// A record could not be turned into an instance of the model.
	#[error("Invalid record for model '{model}': {reason}")]
	InvalidRecord {
		/// Model the record was materialized as.
		model: String,
		/// Why the record was rejected.
		reason: String,
	},

	/// Attempted to mutate a frozen (immutable) instance.
	#[error("Cannot modify frozen instance of model '{0}'")]
	Frozen(String),

	/// A related entity could not be resolved during inclusion.
	#[error("Include error: {model}.{prop}: {message}")]
	IncludeError {
		/// Model owning the property.
		model: String,
		/// Property being included.
		prop: String,
		/// Resolver error message.
		message: String,
	},
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
