//! Fixture discovery on the file system.
//!
//! Every configured fixture dir is scanned for `<data dir>/<model>.<ext>`
//! files. Files are visited in name order so that discovery is
//! reproducible; a model found in several dirs keeps the definition from the
//! last one.

use std::path::Path;

use indexmap::IndexMap;

use crate::config::LoaderSettings;
use crate::definition::{FixtureDefinition, FixtureFormat, split_file_name};
use crate::error::FixtureResult;

/// Discovers the fixtures of every configured fixture dir, keyed by model
/// name in first-discovery order.
///
/// # Errors
///
/// Returns an error if a data dir cannot be listed or a fixture file cannot
/// be read or parsed.
pub fn discover(settings: &LoaderSettings) -> FixtureResult<IndexMap<String, FixtureDefinition>> {
	let mut fixtures = IndexMap::new();
	for fixture_dir in &settings.fixture_dirs {
		for fixture in discover_dir(fixture_dir, &settings.data_dir)? {
			if fixtures.contains_key(fixture.name()) {
				tracing::debug!(
					model = fixture.name(),
					dir = %fixture_dir.display(),
					"fixture overrides an earlier definition"
				);
			}
			fixtures.insert(fixture.name().to_string(), fixture);
		}
	}
	Ok(fixtures)
}

/// Discovers the fixtures of one fixture dir.
pub fn discover_dir(fixture_dir: &Path, data_dir: &str) -> FixtureResult<Vec<FixtureDefinition>> {
	let data_path = fixture_dir.join(data_dir);
	let mut paths = Vec::new();
	for entry in std::fs::read_dir(&data_path)? {
		let path = entry?.path();
		if path.is_file() {
			paths.push(path);
		}
	}
	paths.sort();

	let mut fixtures = Vec::with_capacity(paths.len());
	for path in paths {
		let supported = split_file_name(&path)
			.is_some_and(|(name, ext)| !name.is_empty() && FixtureFormat::from_extension(ext).is_some());
		if !supported {
			tracing::trace!(path = %path.display(), "skipping non-fixture file");
			continue;
		}
		fixtures.push(FixtureDefinition::from_file(&path, fixture_dir)?);
	}
	tracing::debug!(
		dir = %data_path.display(),
		fixtures = fixtures.len(),
		"discovered fixtures"
	);
	Ok(fixtures)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::FixtureError;
	use rstest::rstest;
	use std::fs;

	fn fixture_dir(files: &[(&str, &str)]) -> tempfile::TempDir {
		let dir = tempfile::tempdir().unwrap();
		fs::create_dir(dir.path().join("data")).unwrap();
		for (name, content) in files {
			fs::write(dir.path().join("data").join(name), content).unwrap();
		}
		dir
	}

	#[rstest]
	fn test_discover_dir_filters_extensions() {
		let dir = fixture_dir(&[
			("user.json", r#"{"data": {}}"#),
			("team.toml", "data = {}"),
			("notes.txt", "ignored"),
			("user.backup.json", "ignored"),
			(".hidden", "ignored"),
		]);

		let fixtures = discover_dir(dir.path(), "data").unwrap();
		let names: Vec<_> = fixtures.iter().map(FixtureDefinition::name).collect();

		assert_eq!(names, vec!["team", "user"]);
	}

	#[rstest]
	fn test_later_dir_overrides() {
		let first = fixture_dir(&[("user.json", r#"{"data": "first.tsv"}"#)]);
		let second = fixture_dir(&[("user.json", r#"{"data": "second.tsv"}"#)]);
		let settings = LoaderSettings::new()
			.with_fixture_dir(first.path())
			.with_fixture_dir(second.path());

		let fixtures = discover(&settings).unwrap();

		assert_eq!(fixtures.len(), 1);
		assert_eq!(fixtures["user"].fixture_dir(), Some(second.path()));
	}

	#[rstest]
	fn test_missing_data_dir_is_an_error() {
		let dir = tempfile::tempdir().unwrap();
		let settings = LoaderSettings::new().with_fixture_dir(dir.path());

		assert!(matches!(discover(&settings), Err(FixtureError::Io(_))));
	}
}
