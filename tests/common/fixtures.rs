//! Fixtures: a seeded SQLite movie store and a canned title page fetcher.

use super::constants::POPULATION;
use movie_sampler::dataset::{AutoFields, DatasetKey, DatasetRecord, UpsertOutcome};
use movie_sampler::fetcher::{parse_title_page, TitlePageFetcher};
use movie_sampler::movie_store::{
    DatasetStore, PopulationRecord, PopulationStore, SqliteMovieStore, TitleFilter,
};
use movie_sampler::{MovieError, MovieResult};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;

pub struct TestStore {
    pub store: SqliteMovieStore,
    pub db_path: PathBuf,
    _temp_dir: TempDir,
}

impl TestStore {
    /// An empty store in a fresh temporary directory.
    pub fn empty() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("movie_list.db");
        let store = SqliteMovieStore::new(&db_path, Duration::from_millis(500)).unwrap();
        TestStore {
            store,
            db_path,
            _temp_dir: temp_dir,
        }
    }

    /// A store holding [`POPULATION`].
    pub fn seeded() -> Self {
        let test_store = Self::empty();
        let records: Vec<PopulationRecord> = POPULATION
            .iter()
            .map(|(id, title)| PopulationRecord::new(*id, *title))
            .collect();
        test_store
            .store
            .insert_population_records(&records)
            .unwrap();
        test_store
    }
}

/// Serves a fixed HTML page for every URL, or fails every fetch.
pub struct StubFetcher {
    html: Option<String>,
    pub requested: Mutex<Vec<String>>,
}

impl StubFetcher {
    #[allow(dead_code)]
    pub fn serving(html: &str) -> Self {
        StubFetcher {
            html: Some(html.to_string()),
            requested: Mutex::new(Vec::new()),
        }
    }

    #[allow(dead_code)]
    pub fn failing() -> Self {
        StubFetcher {
            html: None,
            requested: Mutex::new(Vec::new()),
        }
    }
}

impl TitlePageFetcher for StubFetcher {
    fn fetch_page(&self, url: &str) -> MovieResult<AutoFields> {
        self.requested.lock().unwrap().push(url.to_string());
        match &self.html {
            Some(html) => Ok(parse_title_page(html)),
            None => Err(MovieError::FetchError {
                url: url.to_string(),
                reason: "HTTP status 503 Service Unavailable".to_string(),
            }),
        }
    }
}

/// A store whose every call fails, as when the database cannot be reached.
#[allow(dead_code)]
pub struct UnavailableStore;

#[allow(dead_code)]
fn unavailable<T>() -> anyhow::Result<T> {
    Err(anyhow::anyhow!("database is locked"))
}

impl PopulationStore for UnavailableStore {
    fn ping(&self) -> anyhow::Result<()> {
        unavailable()
    }

    fn find_population(&self, _filter: &TitleFilter) -> anyhow::Result<Vec<PopulationRecord>> {
        unavailable()
    }

    fn count_population(&self, _filter: &TitleFilter) -> anyhow::Result<usize> {
        unavailable()
    }

    fn sample_population(
        &self,
        _size: usize,
        _filter: &TitleFilter,
    ) -> anyhow::Result<Vec<PopulationRecord>> {
        unavailable()
    }

    fn delete_population_record(&self, _id: i64) -> anyhow::Result<usize> {
        unavailable()
    }

    fn delete_population_records(&self, _ids: &[i64]) -> anyhow::Result<usize> {
        unavailable()
    }

    fn insert_population_records(&self, _records: &[PopulationRecord]) -> anyhow::Result<usize> {
        unavailable()
    }
}

impl DatasetStore for UnavailableStore {
    fn upsert_dataset_record(
        &self,
        _key: &DatasetKey,
        _record: &DatasetRecord,
    ) -> anyhow::Result<UpsertOutcome> {
        unavailable()
    }

    fn get_dataset_record(&self, _key: &DatasetKey) -> anyhow::Result<Option<DatasetRecord>> {
        unavailable()
    }

    fn count_dataset_records(&self) -> anyhow::Result<usize> {
        unavailable()
    }
}
