//! Fixture definitions.
//!
//! A fixture declares the records of one model and the models it depends
//! on. Fixture files live in `<fixture dir>/data/<model>.json` (or
//! `.toml`) and look like:
//!
//! ```json
//! {
//!   "dependencies": ["team"],
//!   "data": {
//!     "u1": { "name": "Ann", "teamId": "t1" },
//!     "u2": { "name": "Bob", "teamId": "t1" }
//!   }
//! }
//! ```
//!
//! `data` may also name a TSV file under `<fixture dir>/tsvs/`. Fixtures
//! built in code can compute their records with a loader function instead.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use seedling_domain::EntityPool;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::FixtureResult;
use crate::tsv;

/// A plain data record.
pub type Record = Map<String, Value>;

/// Records keyed by identifier, in declaration order.
pub type RecordMap = IndexMap<String, Record>;

/// Function computing the records of a fixture at load time.
///
/// It receives the scope of its fixture and the entities created so far in
/// the run. Returning `None` marks the fixture invalid.
pub type LoaderFn =
	Arc<dyn Fn(&LoaderScope<'_>, &EntityPool) -> FixtureResult<Option<RecordMap>> + Send + Sync>;

/// Where the records of a fixture come from.
#[derive(Clone)]
pub enum FixtureSource {
	/// Records given inline.
	Records(RecordMap),
	/// TSV file name, relative to the TSV directory of the fixture dir.
	Tsv(String),
	/// Records computed at load time.
	Loader(LoaderFn),
	/// No usable data; loading the fixture fails.
	Missing,
}

impl fmt::Debug for FixtureSource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Records(records) => f.debug_tuple("Records").field(&records.len()).finish(),
			Self::Tsv(file) => f.debug_tuple("Tsv").field(file).finish(),
			Self::Loader(_) => f.write_str("Loader(..)"),
			Self::Missing => f.write_str("Missing"),
		}
	}
}

/// Fixture of one model.
#[derive(Debug, Clone)]
pub struct FixtureDefinition {
	name: String,
	dependencies: Vec<String>,
	source: FixtureSource,
	path: Option<PathBuf>,
	fixture_dir: Option<PathBuf>,
}

impl FixtureDefinition {
	/// Creates a fixture with inline records.
	pub fn records(name: impl Into<String>, records: RecordMap) -> Self {
		Self::with_source(name, FixtureSource::Records(records))
	}

	/// Creates a fixture reading its records from a TSV file.
	pub fn tsv(name: impl Into<String>, file: impl Into<String>) -> Self {
		Self::with_source(name, FixtureSource::Tsv(file.into()))
	}

	/// Creates a fixture whose records are computed by `loader`.
	///
	/// # Example
	///
	/// ```
	/// use seedling_fixtures::definition::{FixtureDefinition, Record, RecordMap};
	///
	/// let fixture = FixtureDefinition::loader("user", |_scope, pool| {
	/// 	let mut records = RecordMap::new();
	/// 	for team in pool.entities_of("team") {
	/// 		let mut record = Record::new();
	/// 		record.insert("teamId".into(), team.id().cloned().unwrap_or_default());
	/// 		records.insert(format!("owner-{}", records.len()), record);
	/// 	}
	/// 	Ok(Some(records))
	/// })
	/// .with_dependencies(["team"]);
	///
	/// assert_eq!(fixture.dependencies(), ["team"]);
	/// ```
	pub fn loader<F>(name: impl Into<String>, loader: F) -> Self
	where
		F: Fn(&LoaderScope<'_>, &EntityPool) -> FixtureResult<Option<RecordMap>> + Send + Sync + 'static,
	{
		Self::with_source(name, FixtureSource::Loader(Arc::new(loader)))
	}

	fn with_source(name: impl Into<String>, source: FixtureSource) -> Self {
		Self {
			name: name.into(),
			dependencies: Vec::new(),
			source,
			path: None,
			fixture_dir: None,
		}
	}

	/// Sets the models this fixture depends on.
	pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.dependencies = dependencies.into_iter().map(Into::into).collect();
		self
	}

	/// Sets the fixture directory TSV files are resolved against.
	pub fn with_fixture_dir(mut self, dir: impl Into<PathBuf>) -> Self {
		self.fixture_dir = Some(dir.into());
		self
	}

	/// Reads a fixture file.
	///
	/// The model name is the part of the file name before the first dot and
	/// the format is picked from the extension (`json` or `toml`).
	///
	/// # Errors
	///
	/// Returns an error if the file cannot be read or parsed.
	pub fn from_file(path: impl AsRef<Path>, fixture_dir: impl Into<PathBuf>) -> FixtureResult<Self> {
		let path = path.as_ref();
		let (name, format) = split_file_name(path).unwrap_or_default();
		let content = std::fs::read_to_string(path)?;
		let file: FixtureFile = match FixtureFormat::from_extension(format) {
			Some(FixtureFormat::Toml) => toml::from_str(&content)?,
			_ => serde_json::from_str(&content)?,
		};
		Ok(Self {
			name: name.to_string(),
			dependencies: file.dependencies,
			source: file.data.map_or(FixtureSource::Missing, FixtureSource::from),
			path: Some(path.to_path_buf()),
			fixture_dir: Some(fixture_dir.into()),
		})
	}

	/// Model name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Names of the models this fixture depends on.
	pub fn dependencies(&self) -> &[String] {
		&self.dependencies
	}

	/// Source of the records.
	pub fn source(&self) -> &FixtureSource {
		&self.source
	}

	/// File the fixture was read from, if any.
	pub fn path(&self) -> Option<&Path> {
		self.path.as_deref()
	}

	/// Fixture directory, if any.
	pub fn fixture_dir(&self) -> Option<&Path> {
		self.fixture_dir.as_deref()
	}

	/// Produces the records of the fixture.
	///
	/// `None` means the fixture has no usable data.
	pub(crate) fn resolve_data(&self, tsv_dir: &str, pool: &EntityPool) -> FixtureResult<Option<RecordMap>> {
		let scope = LoaderScope {
			definition: self,
			tsv_dir,
		};
		match &self.source {
			FixtureSource::Records(records) => Ok(Some(records.clone())),
			FixtureSource::Tsv(file) => scope.read_tsv(file).map(Some),
			FixtureSource::Loader(loader) => loader(&scope, pool),
			FixtureSource::Missing => Ok(None),
		}
	}
}

/// View of its own fixture handed to a loader function.
#[derive(Debug, Clone, Copy)]
pub struct LoaderScope<'a> {
	definition: &'a FixtureDefinition,
	tsv_dir: &'a str,
}

impl LoaderScope<'_> {
	/// Model name of the fixture.
	pub fn name(&self) -> &str {
		self.definition.name()
	}

	/// Fixture directory, if the fixture has one.
	pub fn fixture_dir(&self) -> Option<&Path> {
		self.definition.fixture_dir()
	}

	/// Reads a TSV file from the TSV directory of this fixture's dir.
	pub fn read_tsv(&self, file: &str) -> FixtureResult<RecordMap> {
		let dir = self.fixture_dir().unwrap_or_else(|| Path::new("."));
		tsv::read_tsv(dir.join(self.tsv_dir).join(file))
	}
}

/// Supported fixture file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureFormat {
	/// JSON format (`.json`).
	Json,
	/// TOML format (`.toml`).
	Toml,
}

impl FixtureFormat {
	/// Detects the format from an extension.
	pub fn from_extension(ext: &str) -> Option<Self> {
		match ext.to_lowercase().as_str() {
			"json" => Some(Self::Json),
			"toml" => Some(Self::Toml),
			_ => None,
		}
	}
}

/// Splits a fixture file name into model name and extension: the first two
/// dot-separated segments.
pub(crate) fn split_file_name(path: &Path) -> Option<(&str, &str)> {
	let file_name = path.file_name()?.to_str()?;
	let mut segments = file_name.split('.');
	let name = segments.next()?;
	let ext = segments.next().unwrap_or_default();
	Some((name, ext))
}

#[derive(Debug, Deserialize)]
struct FixtureFile {
	#[serde(default)]
	dependencies: Vec<String>,
	#[serde(default)]
	data: Option<FixtureData>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FixtureData {
	Tsv(String),
	Records(RecordMap),
	Other(Value),
}

impl From<FixtureData> for FixtureSource {
	fn from(data: FixtureData) -> Self {
		match data {
			FixtureData::Tsv(file) => Self::Tsv(file),
			FixtureData::Records(records) => Self::Records(records),
			FixtureData::Other(value) => {
				tracing::warn!(data = %value, "fixture data is neither a record map nor a TSV file name");
				Self::Missing
			}
		}
	}
}
