//! Read-only repository for master data.
//!
//! Master data (static reference tables such as countries or currencies) is
//! written once, by fixture loading, and only read afterwards.

use std::sync::Arc;

use seedling_domain::ModelInstance;
use serde_json::Value;

use super::{Repository, SaveOptions};
use crate::config::LoaderSettings;
use crate::definition::Record;
use crate::error::{FixtureError, FixtureResult};

/// Repository wrapper accepting writes only from fixture loading.
///
/// Reads are delegated to the wrapped repository. Saves succeed only with
/// [`SaveOptions::fixture_insertion`] set; updates and deletes always fail.
pub struct MasterRepository {
	inner: Arc<dyn Repository>,
}

impl MasterRepository {
	/// Wraps `inner`.
	///
	/// # Errors
	///
	/// Returns [`FixtureError::MasterNotFound`] unless master data is
	/// enabled in `settings`.
	pub fn new(inner: Arc<dyn Repository>, settings: &LoaderSettings) -> FixtureResult<Self> {
		if !settings.master {
			return Err(FixtureError::MasterNotFound(inner.model_name().to_string()));
		}
		Ok(Self { inner })
	}
}

impl std::fmt::Debug for MasterRepository {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MasterRepository")
			.field("model", &self.inner.model_name())
			.finish()
	}
}

impl Repository for MasterRepository {
	fn model_name(&self) -> &str {
		self.inner.model_name()
	}

	fn save(&self, record: Record, options: &SaveOptions<'_>) -> FixtureResult<ModelInstance> {
		if !options.fixture_insertion {
			return Err(FixtureError::CannotSaveWithMasterRepository(
				self.model_name().to_string(),
			));
		}
		self.inner.save(record, options)
	}

	fn get(&self, id: &Value) -> FixtureResult<Option<ModelInstance>> {
		self.inner.get(id)
	}

	fn update(&self, _id: &Value, _record: Record) -> FixtureResult<ModelInstance> {
		Err(FixtureError::CannotUpdateWithMasterRepository(
			self.model_name().to_string(),
		))
	}

	fn delete(&self, _id: &Value) -> FixtureResult<bool> {
		Err(FixtureError::CannotDeleteWithMasterRepository(
			self.model_name().to_string(),
		))
	}
}
