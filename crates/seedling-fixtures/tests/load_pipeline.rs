//! Load pipeline integration tests
//!
//! Tests discovery from fixture directories, dependency ordering, batching
//! against asynchronous repositories, name filtering and master data.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rstest::{fixture, rstest};
use seedling_domain::{Entity, ModelDefinition, ModelInstance, ModelRegistry, PropertyDef};
use seedling_fixtures::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &str) {
	let path = root.join(relative);
	fs::create_dir_all(path.parent().unwrap()).unwrap();
	fs::write(path, content).unwrap();
}

#[fixture]
fn models() -> Arc<ModelRegistry> {
	Arc::new(
		ModelRegistry::new()
			.with(
				ModelDefinition::entity("country")
					.prop(PropertyDef::id("id"))
					.prop(PropertyDef::new("name"))
					.immutable(),
			)
			.with(
				ModelDefinition::entity("team")
					.prop(PropertyDef::id("id"))
					.prop(PropertyDef::new("name"))
					.prop(PropertyDef::entity("country", "country")),
			)
			.with(
				ModelDefinition::entity("member")
					.prop(PropertyDef::id("id"))
					.prop(PropertyDef::new("name"))
					.prop(PropertyDef::new("age"))
					.prop(PropertyDef::entity("team", "team")),
			),
	)
}

/// A fixture tree with a JSON, a TOML and a TSV-backed fixture.
#[fixture]
fn fixture_dir() -> TempDir {
	let dir = tempfile::tempdir().unwrap();
	write(
		dir.path(),
		"data/country.toml",
		r#"
[data.jp]
name = "Japan"
"#,
	);
	write(
		dir.path(),
		"data/team.json",
		r#"{"dependencies": ["country"], "data": {"t1": {"name": "core", "countryId": "jp"}}}"#,
	);
	write(
		dir.path(),
		"data/member.json",
		r#"{"dependencies": ["team"], "data": "members.tsv"}"#,
	);
	write(
		dir.path(),
		"tsvs/members.tsv",
		"id\tname\tage\tteamId\nm1\tAnn\t31\tt1\nm2\tBob\t27\tt1\n\t\t\t\nm9\tghost\t0\tt1\n",
	);
	write(dir.path(), "data/README.md", "not a fixture");
	dir
}

fn memory_provider(models: &Arc<ModelRegistry>) -> Arc<RepositoryRegistry> {
	let provider = Arc::new(RepositoryRegistry::new());
	for model in ["country", "team", "member"] {
		provider.register_sync(MemoryRepository::new(model, Arc::clone(models)));
	}
	provider
}

/// Test: fixtures from files are loaded in dependency order and linked
#[rstest]
fn test_load_from_fixture_dir(models: Arc<ModelRegistry>, fixture_dir: TempDir) {
	// Arrange
	let provider = memory_provider(&models);
	let settings = LoaderSettings::new().with_fixture_dir(fixture_dir.path());
	let loader = FixtureLoader::new(provider, settings).unwrap();

	// Act
	let pool = loader.load(&LoadOptions::new()).unwrap();

	// Assert
	assert_eq!(pool.models(), vec!["country", "team", "member"]);
	assert_eq!(pool.len(), 4);

	let member = pool.get("member", &json!("m1")).unwrap();
	let member = member.as_entity().unwrap();
	assert_eq!(member.value("age"), Some(&json!(31)));
	assert_eq!(member.value("id"), Some(&json!("m1")));

	let team = member.model_prop("team").unwrap();
	let country = team.as_entity().unwrap().model_prop("country").unwrap();
	assert!(country.is_frozen());
	assert_eq!(country.as_entity().unwrap().value("name"), Some(&json!("Japan")));
	assert!(!pool.contains("member", &json!("m9")));
}

/// Test: the asynchronous load drives synchronous repositories too
#[rstest]
#[tokio::test]
async fn test_load_async_with_sync_repositories(models: Arc<ModelRegistry>, fixture_dir: TempDir) {
	let provider = memory_provider(&models);
	let settings = LoaderSettings::new().with_fixture_dir(fixture_dir.path());
	let loader = FixtureLoader::new(provider, settings).unwrap();

	let pool = loader.load_async(&LoadOptions::new()).await.unwrap();

	assert_eq!(pool.len(), 4);
}

/// Test: filtering by name loads only the named models, not their
/// dependencies
#[rstest]
fn test_names_filter_skips_dependencies(models: Arc<ModelRegistry>, fixture_dir: TempDir) {
	// Arrange
	let provider = memory_provider(&models);
	let settings = LoaderSettings::new().with_fixture_dir(fixture_dir.path());
	let loader = FixtureLoader::new(provider, settings).unwrap();

	// Act
	let pool = loader.load(&LoadOptions::only(["member"])).unwrap();

	// Assert
	assert_eq!(pool.models(), vec!["member"]);
	assert_eq!(pool.len(), 2);
	let member = pool.get("member", &json!("m2")).unwrap();
	assert!(!member.as_entity().unwrap().is_set("team"));
}

/// Test: a model without repository is skipped, the others still load
#[rstest]
fn test_missing_repository_skips_model(models: Arc<ModelRegistry>, fixture_dir: TempDir) {
	// Arrange
	let provider = Arc::new(RepositoryRegistry::new());
	provider.register_sync(MemoryRepository::new("country", Arc::clone(&models)));
	let members = provider.register_sync(MemoryRepository::new("member", models));
	let settings = LoaderSettings::new().with_fixture_dir(fixture_dir.path());
	let loader = FixtureLoader::new(provider, settings).unwrap();

	// Act
	let pool = loader.load(&LoadOptions::new()).unwrap();

	// Assert
	assert_eq!(pool.models(), vec!["country", "member"]);
	assert_eq!(members.len(), 2);
}

/// Test: a fixture file without data fails the load with its path
#[rstest]
fn test_fixture_without_data(models: Arc<ModelRegistry>) {
	// Arrange
	let dir = tempfile::tempdir().unwrap();
	write(dir.path(), "data/country.json", r#"{"dependencies": []}"#);
	let settings = LoaderSettings::new().with_fixture_dir(dir.path());
	let loader = FixtureLoader::new(memory_provider(&models), settings).unwrap();

	// Act
	let result = loader.load(&LoadOptions::new());

	// Assert
	match result {
		Err(FixtureError::InvalidFixtureData { model, path }) => {
			assert_eq!(model, "country");
			assert_eq!(path, dir.path().join("data/country.json"));
		}
		other => panic!("expected InvalidFixtureData, got {other:?}"),
	}
}

/// Test: an undeclared dependency fails before anything is saved
#[rstest]
fn test_unknown_dependency(models: Arc<ModelRegistry>) {
	let dir = tempfile::tempdir().unwrap();
	write(
		dir.path(),
		"data/team.json",
		r#"{"dependencies": ["league"], "data": {"t1": {}}}"#,
	);
	let provider = memory_provider(&models);
	let teams = provider.register_sync(MemoryRepository::new("team", Arc::clone(&models)));
	let loader = FixtureLoader::new(provider, LoaderSettings::new().with_fixture_dir(dir.path())).unwrap();

	let result = loader.load(&LoadOptions::new());

	assert!(matches!(result, Err(FixtureError::ModelNotFound(ref name)) if name == "league"));
	assert!(teams.is_empty());
}

/// Test: later fixture dirs override earlier ones
#[rstest]
fn test_later_fixture_dir_wins(models: Arc<ModelRegistry>) {
	let base = tempfile::tempdir().unwrap();
	let overlay = tempfile::tempdir().unwrap();
	write(base.path(), "data/country.json", r#"{"data": {"jp": {"name": "Japan"}}}"#);
	write(overlay.path(), "data/country.json", r#"{"data": {"fr": {"name": "France"}}}"#);
	let settings = LoaderSettings::new()
		.with_fixture_dir(base.path())
		.with_fixture_dir(overlay.path());
	let loader = FixtureLoader::new(memory_provider(&models), settings).unwrap();

	let pool = loader.load(&LoadOptions::new()).unwrap();

	assert!(pool.contains("country", &json!("fr")));
	assert!(!pool.contains("country", &json!("jp")));
}

#[derive(Debug, Clone, PartialEq)]
enum Event {
	Start(String),
	End(String),
}

/// Asynchronous repository recording when each save starts and ends.
struct RecordingRepository {
	model: String,
	events: Mutex<Vec<Event>>,
}

impl RecordingRepository {
	fn new(model: &str) -> Self {
		Self {
			model: model.to_string(),
			events: Mutex::new(Vec::new()),
		}
	}

	fn position(&self, event: &Event) -> usize {
		self.events.lock().iter().position(|e| e == event).unwrap()
	}
}

#[async_trait]
impl AsyncRepository for RecordingRepository {
	fn model_name(&self) -> &str {
		&self.model
	}

	async fn save(&self, record: Record, _options: &SaveOptions<'_>) -> FixtureResult<ModelInstance> {
		let id = record["id"].as_str().unwrap_or_default().to_string();
		self.events.lock().push(Event::Start(id.clone()));
		tokio::task::yield_now().await;
		tokio::task::yield_now().await;
		self.events.lock().push(Event::End(id));

		let mut entity = Entity::new(&self.model);
		for (prop, value) in record {
			entity.set(prop, value)?;
		}
		Ok(ModelInstance::Entity(entity))
	}

	async fn get(&self, _id: &Value) -> FixtureResult<Option<ModelInstance>> {
		Ok(None)
	}

	async fn update(&self, id: &Value, _record: Record) -> FixtureResult<ModelInstance> {
		Err(FixtureError::NotFound {
			model: self.model.clone(),
			id: id.to_string(),
		})
	}

	async fn delete(&self, _id: &Value) -> FixtureResult<bool> {
		Ok(false)
	}
}

fn numbered_records(count: usize) -> RecordMap {
	(0..count)
		.map(|i| (format!("r{i:02}"), Record::new()))
		.collect()
}

/// Test: twelve records are saved in batches of 5, 5 and 2, and no batch
/// starts before the previous one completed
#[rstest]
#[tokio::test]
async fn test_async_batches_settle_in_order() {
	// Arrange
	let provider = Arc::new(RepositoryRegistry::new());
	let repository = provider.register_async(RecordingRepository::new("log"));
	let loader = FixtureLoader::new(provider, LoaderSettings::new())
		.unwrap()
		.with_fixture(FixtureDefinition::records("log", numbered_records(12)));

	// Act
	let pool = loader.load_async(&LoadOptions::new()).await.unwrap();

	// Assert
	assert_eq!(pool.len(), 12);
	let ids: Vec<String> = (0..12).map(|i| format!("r{i:02}")).collect();
	let batches: Vec<&[String]> = ids.chunks(5).collect();
	assert_eq!(batches.iter().map(|b| b.len()).collect::<Vec<_>>(), vec![5, 5, 2]);

	for pair in batches.windows(2) {
		let (previous, next) = (pair[0], pair[1]);
		let last_end = previous
			.iter()
			.map(|id| repository.position(&Event::End(id.clone())))
			.max()
			.unwrap();
		let first_start = next
			.iter()
			.map(|id| repository.position(&Event::Start(id.clone())))
			.min()
			.unwrap();
		assert!(last_end < first_start, "a batch started before the previous one settled");
	}

	// Every save of a batch is in flight before any of them completes.
	let first_end = repository.position(&Event::End("r00".to_string()));
	let last_start = repository.position(&Event::Start("r04".to_string()));
	assert!(last_start < first_end);
}

/// Test: a custom batch size is honored
#[rstest]
#[tokio::test]
async fn test_custom_batch_size() {
	let provider = Arc::new(RepositoryRegistry::new());
	let repository = provider.register_async(RecordingRepository::new("log"));
	let loader = FixtureLoader::new(provider, LoaderSettings::new().with_batch_size(1))
		.unwrap()
		.with_fixture(FixtureDefinition::records("log", numbered_records(3)));

	loader.load_async(&LoadOptions::new()).await.unwrap();

	let events = repository.events.lock().clone();
	assert_eq!(
		events,
		vec![
			Event::Start("r00".to_string()),
			Event::End("r00".to_string()),
			Event::Start("r01".to_string()),
			Event::End("r01".to_string()),
			Event::Start("r02".to_string()),
			Event::End("r02".to_string()),
		]
	);
}

/// Test: the synchronous load refuses asynchronous repositories
#[rstest]
fn test_sync_load_rejects_async_repository() {
	let provider = Arc::new(RepositoryRegistry::new());
	let repository = provider.register_async(RecordingRepository::new("log"));
	let loader = FixtureLoader::new(provider, LoaderSettings::new())
		.unwrap()
		.with_fixture(FixtureDefinition::records("log", numbered_records(2)));

	let result = loader.load(&LoadOptions::new());

	assert!(matches!(result, Err(FixtureError::AsyncRepositoryInSyncLoad(ref model)) if model == "log"));
	assert!(repository.events.lock().is_empty());
}

/// Test: master data is written through fixture loading only
#[rstest]
#[tokio::test]
async fn test_master_repository_accepts_fixtures(models: Arc<ModelRegistry>) {
	// Arrange
	let dir = tempfile::tempdir().unwrap();
	write(dir.path(), "data/country.json", r#"{"data": {"jp": {"name": "Japan"}}}"#);
	let settings = LoaderSettings::new()
		.with_fixture_dir(dir.path())
		.with_master(true);
	let store: Arc<dyn Repository> = Arc::new(MemoryRepository::new("country", models));
	let master = MasterRepository::new(store, &settings).unwrap();
	let provider = Arc::new(RepositoryRegistry::new());
	let master = provider.register_sync(master);
	let loader = FixtureLoader::new(provider, settings).unwrap();

	// Act
	let pool = loader.load_async(&LoadOptions::new()).await.unwrap();

	// Assert
	assert!(pool.contains("country", &json!("jp")));
	assert!(master.get(&json!("jp")).unwrap().is_some());
	let mut record = Record::new();
	record.insert("id".to_string(), json!("fr"));
	assert!(matches!(
		master.save(record, &SaveOptions::new()),
		Err(FixtureError::CannotSaveWithMasterRepository(_))
	));
}
