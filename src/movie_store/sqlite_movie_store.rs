//! SQLite-backed movie store.

use super::models::{fold_title, PopulationRecord, TitleFilter};
use super::schema::{DATASET_TABLE_V1, MOVIE_VERSIONED_SCHEMAS, POPULATION_TABLE_V1};
use super::{DatasetStore, PopulationStore};
use crate::dataset::{DatasetKey, DatasetRecord, UpsertOutcome};
use crate::sqlite_persistence::BASE_DB_VERSION;
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, ToSql};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};

const DATASET_COLUMNS: &str = "url, title, genres, year, rating, director, vote_count, writer, country, runtime_minutes, gross_profit";

/// Every merged column keeps its stored value when the incoming one is NULL.
/// Empty lists are written as NULL for the same reason.
const DATASET_MERGE_SET: &str = "
    title = COALESCE(excluded.title, dataset.title),
    genres = COALESCE(excluded.genres, dataset.genres),
    year = COALESCE(excluded.year, dataset.year),
    rating = COALESCE(excluded.rating, dataset.rating),
    director = COALESCE(excluded.director, dataset.director),
    vote_count = COALESCE(excluded.vote_count, dataset.vote_count),
    writer = COALESCE(excluded.writer, dataset.writer),
    country = COALESCE(excluded.country, dataset.country),
    runtime_minutes = COALESCE(excluded.runtime_minutes, dataset.runtime_minutes),
    gross_profit = COALESCE(excluded.gross_profit, dataset.gross_profit),
    revision = dataset.revision + 1,
    updated_at = excluded.updated_at";

#[derive(Clone)]
pub struct SqliteMovieStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteMovieStore {
    /// Opens (or creates) the movie database at `db_path`.
    ///
    /// Every statement waits at most `busy_timeout` for a lock held by
    /// another connection before failing.
    pub fn new<P: AsRef<Path>>(db_path: P, busy_timeout: Duration) -> Result<Self> {
        let path = db_path.as_ref();
        let is_new_db = !path.exists();

        let mut conn = Connection::open(path)
            .with_context(|| format!("Failed to open movie database at {:?}", path))?;
        conn.busy_timeout(busy_timeout)?;

        if is_new_db {
            info!("Creating new movie database at {:?}", path);
            let latest = MOVIE_VERSIONED_SCHEMAS
                .last()
                .context("No movie schema defined")?;
            latest.create(&conn)?;
        } else {
            let raw_version: i64 = conn
                .query_row("PRAGMA user_version;", [], |row| row.get(0))
                .context("Failed to read database version")?;
            let db_version = raw_version - BASE_DB_VERSION as i64;

            let version_index = MOVIE_VERSIONED_SCHEMAS
                .iter()
                .position(|s| s.version as i64 == db_version)
                .with_context(|| format!("Unknown movie database version {}", db_version))?;
            MOVIE_VERSIONED_SCHEMAS[version_index]
                .validate(&conn)
                .with_context(|| {
                    format!(
                        "Movie database schema validation failed for version {}",
                        db_version
                    )
                })?;
            Self::migrate_if_needed(&mut conn, version_index)?;
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn migrate_if_needed(conn: &mut Connection, from_index: usize) -> Result<()> {
        if from_index + 1 >= MOVIE_VERSIONED_SCHEMAS.len() {
            return Ok(());
        }
        let tx = conn.transaction()?;
        let mut latest_from = MOVIE_VERSIONED_SCHEMAS[from_index].version;
        for schema in MOVIE_VERSIONED_SCHEMAS.iter().skip(from_index + 1) {
            info!(
                "Migrating movie database from version {} to {}",
                latest_from, schema.version
            );
            if let Some(migration_fn) = schema.migration {
                migration_fn(&tx).with_context(|| {
                    format!("Failed to run migration to version {}", schema.version)
                })?;
            }
            latest_from = schema.version;
        }
        tx.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + latest_from),
            [],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("Movie database connection lock poisoned"))
    }

    /// Builds the `WHERE` clause for a title filter together with its parameter.
    fn filter_clause(filter: &TitleFilter) -> (&'static str, Vec<String>) {
        match filter.folded_query() {
            None => ("", vec![]),
            Some(query) => (
                " WHERE instr(title_folded, ?1) > 0",
                vec![query.to_string()],
            ),
        }
    }

    fn row_to_population_record(row: &rusqlite::Row) -> rusqlite::Result<PopulationRecord> {
        Ok(PopulationRecord {
            id: row.get("id")?,
            title: row.get("title")?,
        })
    }

    fn encode_list(values: &[String]) -> Result<Option<String>> {
        if values.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::to_string(values)?))
    }

    fn decode_list(row: &rusqlite::Row, column: &str) -> rusqlite::Result<Vec<String>> {
        let raw: Option<String> = row.get(column)?;
        match raw {
            None => Ok(Vec::new()),
            Some(raw) => serde_json::from_str(&raw).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
            }),
        }
    }

    fn row_to_dataset_record(row: &rusqlite::Row) -> rusqlite::Result<DatasetRecord> {
        Ok(DatasetRecord {
            url: row.get("url")?,
            title: row.get("title")?,
            genres: Self::decode_list(row, "genres")?,
            year: row.get("year")?,
            rating: row.get("rating")?,
            director: Self::decode_list(row, "director")?,
            vote_count: row.get("vote_count")?,
            writer: Self::decode_list(row, "writer")?,
            country: Self::decode_list(row, "country")?,
            runtime_minutes: row.get("runtime_minutes")?,
            gross_profit: row.get("gross_profit")?,
        })
    }
}

impl PopulationStore for SqliteMovieStore {
    fn ping(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i32>(0))
            .context("Movie database did not answer")?;
        Ok(())
    }

    fn find_population(&self, filter: &TitleFilter) -> Result<Vec<PopulationRecord>> {
        let conn = self.lock()?;
        let (where_clause, filter_params) = Self::filter_clause(filter);
        let mut stmt = conn.prepare(&format!(
            "SELECT id, title FROM {}{} ORDER BY id",
            POPULATION_TABLE_V1.name, where_clause
        ))?;
        let records = stmt
            .query_map(params_from_iter(filter_params.iter()), Self::row_to_population_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    fn count_population(&self, filter: &TitleFilter) -> Result<usize> {
        let conn = self.lock()?;
        let (where_clause, filter_params) = Self::filter_clause(filter);
        let count: i64 = conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM {}{}",
                POPULATION_TABLE_V1.name, where_clause
            ),
            params_from_iter(filter_params.iter()),
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn sample_population(&self, size: usize, filter: &TitleFilter) -> Result<Vec<PopulationRecord>> {
        let conn = self.lock()?;
        let (where_clause, filter_params) = Self::filter_clause(filter);
        let limit_param = filter_params.len() + 1;
        let mut stmt = conn.prepare(&format!(
            "SELECT id, title FROM {}{} ORDER BY RANDOM() LIMIT ?{}",
            POPULATION_TABLE_V1.name, where_clause, limit_param
        ))?;

        let limit = size as i64;
        let mut query_params: Vec<&dyn ToSql> =
            filter_params.iter().map(|p| p as &dyn ToSql).collect();
        query_params.push(&limit);

        let records = stmt
            .query_map(query_params.as_slice(), Self::row_to_population_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        debug!("Sampled {} of {} requested records", records.len(), size);
        Ok(records)
    }

    fn delete_population_record(&self, id: i64) -> Result<usize> {
        let conn = self.lock()?;
        let deleted = conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1", POPULATION_TABLE_V1.name),
            params![id],
        )?;
        Ok(deleted)
    }

    fn delete_population_records(&self, ids: &[i64]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let conn = self.lock()?;
        let placeholders = (1..=ids.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let deleted = conn.execute(
            &format!(
                "DELETE FROM {} WHERE id IN ({})",
                POPULATION_TABLE_V1.name, placeholders
            ),
            params_from_iter(ids.iter()),
        )?;
        Ok(deleted)
    }

    fn insert_population_records(&self, records: &[PopulationRecord]) -> Result<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT OR IGNORE INTO {} (id, title, title_folded) VALUES (?1, ?2, ?3)",
                POPULATION_TABLE_V1.name
            ))?;
            for record in records {
                inserted += stmt.execute(params![
                    record.id,
                    record.title,
                    fold_title(&record.title)
                ])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }
}

impl DatasetStore for SqliteMovieStore {
    fn upsert_dataset_record(
        &self,
        key: &DatasetKey,
        record: &DatasetRecord,
    ) -> Result<UpsertOutcome> {
        let conflict_target = match key {
            DatasetKey::Url(_) => "(url)",
            DatasetKey::TitleYear { .. } => "(title, year) WHERE url IS NULL",
        };
        let (url, title, year) = match key {
            DatasetKey::Url(url) => (Some(url.clone()), record.title.clone(), record.year),
            DatasetKey::TitleYear { title, year } => (None, Some(title.clone()), Some(*year)),
        };
        let now = Utc::now().to_rfc3339();

        let conn = self.lock()?;
        let revision: i64 = conn
            .query_row(
                &format!(
                    "INSERT INTO {table} ({columns}, revision, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 1, ?12, ?12)
                     ON CONFLICT{target} DO UPDATE SET {merge}
                     RETURNING revision",
                    table = DATASET_TABLE_V1.name,
                    columns = DATASET_COLUMNS,
                    target = conflict_target,
                    merge = DATASET_MERGE_SET,
                ),
                params![
                    url,
                    title,
                    Self::encode_list(&record.genres)?,
                    year,
                    record.rating,
                    Self::encode_list(&record.director)?,
                    record.vote_count,
                    Self::encode_list(&record.writer)?,
                    Self::encode_list(&record.country)?,
                    record.runtime_minutes,
                    record.gross_profit,
                    now,
                ],
                |row| row.get(0),
            )
            .with_context(|| format!("Failed to upsert dataset record {}", key))?;

        Ok(UpsertOutcome::from_revision(revision))
    }

    fn get_dataset_record(&self, key: &DatasetKey) -> Result<Option<DatasetRecord>> {
        let conn = self.lock()?;
        let select = format!("SELECT {} FROM {}", DATASET_COLUMNS, DATASET_TABLE_V1.name);
        let record = match key {
            DatasetKey::Url(url) => conn
                .query_row(
                    &format!("{} WHERE url = ?1", select),
                    params![url],
                    Self::row_to_dataset_record,
                )
                .optional()?,
            DatasetKey::TitleYear { title, year } => conn
                .query_row(
                    &format!("{} WHERE url IS NULL AND title = ?1 AND year = ?2", select),
                    params![title, year],
                    Self::row_to_dataset_record,
                )
                .optional()?,
        };
        Ok(record)
    }

    fn count_dataset_records(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", DATASET_TABLE_V1.name),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
