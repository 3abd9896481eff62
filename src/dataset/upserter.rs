use super::{build_record, AutoFields, DatasetKey, DatasetRecord, ManualFields, UpsertOutcome};
use crate::error::{MovieError, MovieResult};
use crate::fetcher::TitlePageFetcher;
use crate::movie_store::DatasetStore;
use std::sync::Arc;
use tracing::{info, warn};

pub struct DatasetUpserter {
    fetcher: Arc<dyn TitlePageFetcher>,
    store: Arc<dyn DatasetStore>,
}

impl DatasetUpserter {
    pub fn new(fetcher: Arc<dyn TitlePageFetcher>, store: Arc<dyn DatasetStore>) -> Self {
        Self { fetcher, store }
    }

    /// Scrapes the title page at `url`. Fields the page lacks are left unset
    /// and only logged.
    pub fn fetch_auto_fields(&self, url: &str) -> MovieResult<AutoFields> {
        let url = url.trim();
        let fields = self.fetcher.fetch_page(url)?;
        let missing = fields.missing_fields();
        if !missing.is_empty() {
            warn!("Title page {} is missing {}", url, missing.join(", "));
        }
        Ok(fields)
    }

    /// Writes the record under its key: the URL when present, otherwise
    /// title and year. Stored values survive when the record leaves them
    /// unset.
    pub fn upsert(&self, record: &DatasetRecord) -> MovieResult<UpsertOutcome> {
        let key = record.key().ok_or(MovieError::MissingKey)?;
        let outcome = self
            .store
            .upsert_dataset_record(&key, record)
            .map_err(MovieError::StoreUnavailable)?;
        info!("Dataset record {} {:?}", key, outcome);
        Ok(outcome)
    }

    /// Builds a record from manual and scraped fields and upserts it.
    pub fn save(
        &self,
        url: Option<&str>,
        manual: ManualFields,
        auto: &AutoFields,
    ) -> MovieResult<(DatasetRecord, UpsertOutcome)> {
        let record = build_record(url, manual, auto)?;
        let outcome = self.upsert(&record)?;
        Ok((record, outcome))
    }

    pub fn lookup(&self, key: &DatasetKey) -> MovieResult<Option<DatasetRecord>> {
        self.store
            .get_dataset_record(key)
            .map_err(MovieError::StoreUnavailable)
    }

    pub fn count(&self) -> MovieResult<usize> {
        self.store
            .count_dataset_records()
            .map_err(MovieError::StoreUnavailable)
    }
}
