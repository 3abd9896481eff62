//! In-process movie store for tests. Sampling goes through the reservoir
//! fallback of [`PopulationStore::sample_population`].

use super::models::{PopulationRecord, TitleFilter};
use super::{DatasetStore, PopulationStore};
use crate::dataset::{DatasetKey, DatasetRecord, UpsertOutcome};
use anyhow::{anyhow, Result};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Collections {
    population: BTreeMap<i64, String>,
    dataset: Vec<(DatasetKey, DatasetRecord)>,
}

#[derive(Default)]
pub struct InMemoryMovieStore {
    collections: Mutex<Collections>,
}

impl InMemoryMovieStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_population<I, S>(records: I) -> Self
    where
        I: IntoIterator<Item = (i64, S)>,
        S: Into<String>,
    {
        let store = Self::new();
        if let Ok(mut collections) = store.collections.lock() {
            for (id, title) in records {
                collections.population.entry(id).or_insert_with(|| title.into());
            }
        }
        store
    }

    fn lock(&self) -> Result<MutexGuard<'_, Collections>> {
        self.collections
            .lock()
            .map_err(|_| anyhow!("In-memory movie store lock poisoned"))
    }
}

impl PopulationStore for InMemoryMovieStore {
    fn ping(&self) -> Result<()> {
        self.lock().map(|_| ())
    }

    fn find_population(&self, filter: &TitleFilter) -> Result<Vec<PopulationRecord>> {
        let collections = self.lock()?;
        Ok(collections
            .population
            .iter()
            .filter(|(_, title)| filter.matches(title))
            .map(|(id, title)| PopulationRecord::new(*id, title.clone()))
            .collect())
    }

    fn count_population(&self, filter: &TitleFilter) -> Result<usize> {
        let collections = self.lock()?;
        Ok(collections
            .population
            .values()
            .filter(|title| filter.matches(title))
            .count())
    }

    fn delete_population_record(&self, id: i64) -> Result<usize> {
        let mut collections = self.lock()?;
        Ok(collections.population.remove(&id).map_or(0, |_| 1))
    }

    fn delete_population_records(&self, ids: &[i64]) -> Result<usize> {
        let mut collections = self.lock()?;
        let distinct: HashSet<i64> = ids.iter().copied().collect();
        Ok(distinct
            .into_iter()
            .filter(|id| collections.population.remove(id).is_some())
            .count())
    }

    fn insert_population_records(&self, records: &[PopulationRecord]) -> Result<usize> {
        let mut collections = self.lock()?;
        let mut inserted = 0;
        for record in records {
            if !collections.population.contains_key(&record.id) {
                collections
                    .population
                    .insert(record.id, record.title.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }
}

impl DatasetStore for InMemoryMovieStore {
    fn upsert_dataset_record(
        &self,
        key: &DatasetKey,
        record: &DatasetRecord,
    ) -> Result<UpsertOutcome> {
        let mut collections = self.lock()?;
        let position = collections.dataset.iter().position(|(k, _)| k == key);
        match position {
            Some(index) => {
                let merged = record.clone().merged_over(&collections.dataset[index].1);
                collections.dataset[index].1 = merged;
                Ok(UpsertOutcome::Updated)
            }
            None => {
                collections.dataset.push((key.clone(), record.clone()));
                Ok(UpsertOutcome::Inserted)
            }
        }
    }

    fn get_dataset_record(&self, key: &DatasetKey) -> Result<Option<DatasetRecord>> {
        let collections = self.lock()?;
        Ok(collections
            .dataset
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, record)| record.clone()))
    }

    fn count_dataset_records(&self) -> Result<usize> {
        Ok(self.lock()?.dataset.len())
    }
}
