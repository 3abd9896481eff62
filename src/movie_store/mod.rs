mod memory_store;
mod models;
mod schema;
mod sqlite_movie_store;

pub use memory_store::InMemoryMovieStore;
pub use models::{fold_title, PopulationRecord, TitleFilter};
pub use schema::MOVIE_VERSIONED_SCHEMAS;
pub use sqlite_movie_store::SqliteMovieStore;

use crate::dataset::{DatasetKey, DatasetRecord, UpsertOutcome};
use crate::sampler::reservoir_sample;
use anyhow::Result;

pub trait PopulationStore: Send + Sync {
    /// Checks that the store is reachable.
    fn ping(&self) -> Result<()>;

    /// Returns the records matching the filter, ordered by id.
    fn find_population(&self, filter: &TitleFilter) -> Result<Vec<PopulationRecord>>;

    fn count_population(&self, filter: &TitleFilter) -> Result<usize>;

    /// Draws up to `size` distinct matching records uniformly at random, in
    /// random order.
    ///
    /// The default implementation streams every match through a reservoir;
    /// stores with a native random-sampling primitive should override it.
    fn sample_population(&self, size: usize, filter: &TitleFilter) -> Result<Vec<PopulationRecord>> {
        let candidates = self.find_population(filter)?;
        Ok(reservoir_sample(candidates, size, &mut rand::rng()))
    }

    /// Deletes one record, returns the number of deleted records (0 or 1).
    fn delete_population_record(&self, id: i64) -> Result<usize>;

    /// Deletes every record whose id is in `ids`, returns how many were deleted.
    fn delete_population_records(&self, ids: &[i64]) -> Result<usize>;

    /// Inserts records, skipping ids that already exist. Returns how many were inserted.
    fn insert_population_records(&self, records: &[PopulationRecord]) -> Result<usize>;
}

pub trait DatasetStore: Send + Sync {
    /// Inserts the record or merges it into the one stored under `key`,
    /// atomically. Absent or empty incoming values never overwrite stored ones.
    fn upsert_dataset_record(&self, key: &DatasetKey, record: &DatasetRecord)
        -> Result<UpsertOutcome>;

    fn get_dataset_record(&self, key: &DatasetKey) -> Result<Option<DatasetRecord>>;

    fn count_dataset_records(&self) -> Result<usize>;
}
