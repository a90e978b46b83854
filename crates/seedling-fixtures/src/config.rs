//! Loader settings.
//!
//! Settings can be built in code with the `with_*` setters or read from a
//! TOML file:
//!
//! ```toml
//! fixture_dirs = ["fixtures", "fixtures-dev"]
//! batch_size = 10
//! master = true
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FixtureError, FixtureResult};

/// Number of records persisted together when no batch size is configured.
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Settings of a [`FixtureLoader`](crate::loader::FixtureLoader).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderSettings {
	/// Directories searched for fixtures, in order.
	pub fixture_dirs: Vec<PathBuf>,

	/// Maximum number of saves in flight for one model.
	pub batch_size: usize,

	/// Sub-directory of a fixture dir holding fixture files.
	pub data_dir: String,

	/// Sub-directory of a fixture dir holding TSV files.
	pub tsv_dir: String,

	/// Enables master (read-only) repositories.
	pub master: bool,
}

impl Default for LoaderSettings {
	fn default() -> Self {
		Self {
			fixture_dirs: Vec::new(),
			batch_size: DEFAULT_BATCH_SIZE,
			data_dir: "data".to_string(),
			tsv_dir: "tsvs".to_string(),
			master: false,
		}
	}
}

impl LoaderSettings {
	/// Creates default settings.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a fixture directory.
	pub fn with_fixture_dir(mut self, dir: impl Into<PathBuf>) -> Self {
		self.fixture_dirs.push(dir.into());
		self
	}

	/// Sets the batch size.
	pub fn with_batch_size(mut self, size: usize) -> Self {
		self.batch_size = size;
		self
	}

	/// Sets the fixture file sub-directory.
	pub fn with_data_dir(mut self, dir: impl Into<String>) -> Self {
		self.data_dir = dir.into();
		self
	}

	/// Sets the TSV sub-directory.
	pub fn with_tsv_dir(mut self, dir: impl Into<String>) -> Self {
		self.tsv_dir = dir.into();
		self
	}

	/// Enables or disables master repositories.
	pub fn with_master(mut self, enabled: bool) -> Self {
		self.master = enabled;
		self
	}

	/// Loads settings from a TOML file.
	///
	/// # Errors
	///
	/// Returns an error if the file cannot be read, cannot be parsed or
	/// holds invalid values.
	pub fn from_file(path: impl AsRef<Path>) -> FixtureResult<Self> {
		let content = std::fs::read_to_string(path.as_ref())?;
		Self::from_toml(&content)
	}

	/// Parses settings from a TOML string.
	pub fn from_toml(content: &str) -> FixtureResult<Self> {
		let settings: Self = toml::from_str(content)?;
		settings.validate()?;
		Ok(settings)
	}

	/// Checks that the settings are usable.
	pub fn validate(&self) -> FixtureResult<()> {
		if self.batch_size == 0 {
			return Err(FixtureError::InvalidSettings {
				field: "batch_size".to_string(),
				message: "must be at least 1".to_string(),
			});
		}
		Ok(())
	}
}
