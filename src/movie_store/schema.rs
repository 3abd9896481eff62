//! SQLite schema definitions for the movie database.
//!
//! The database holds two collections: the `population` being sampled and
//! the curated `dataset`.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, UniqueIndex, VersionedSchema};

// =============================================================================
// Version 1 - Population and dataset
// =============================================================================

/// Population table - one row per movie that can still be sampled
pub const POPULATION_TABLE_V1: Table = Table {
    name: "population",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        // lowercased title, filtered with instr() so filtered sampling stays in SQL
        sqlite_column!("title_folded", &SqlType::Text, non_null = true),
    ],
    indices: &[("idx_population_title_folded", "title_folded")],
    unique_indices: &[],
};

/// Dataset table - curated movie records, keyed by url or by (title, year)
pub const DATASET_TABLE_V1: Table = Table {
    name: "dataset",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("url", &SqlType::Text),
        sqlite_column!("title", &SqlType::Text),
        sqlite_column!("genres", &SqlType::Text), // JSON array
        sqlite_column!("year", &SqlType::Integer),
        sqlite_column!("rating", &SqlType::Real),
        sqlite_column!("director", &SqlType::Text), // JSON array
        sqlite_column!("vote_count", &SqlType::Integer),
        sqlite_column!("writer", &SqlType::Text),  // JSON array
        sqlite_column!("country", &SqlType::Text), // JSON array
        sqlite_column!("runtime_minutes", &SqlType::Integer),
        sqlite_column!("gross_profit", &SqlType::Integer),
        sqlite_column!(
            "revision",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("1")
        ),
        sqlite_column!("created_at", &SqlType::Text, non_null = true),
        sqlite_column!("updated_at", &SqlType::Text, non_null = true),
    ],
    indices: &[],
    unique_indices: &[
        UniqueIndex {
            name: "idx_dataset_url",
            columns: "url",
            predicate: None,
        },
        UniqueIndex {
            name: "idx_dataset_title_year",
            columns: "title, year",
            predicate: Some("url IS NULL"),
        },
    ],
};

pub const MOVIE_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 1,
    tables: &[POPULATION_TABLE_V1, DATASET_TABLE_V1],
    migration: None,
}];
