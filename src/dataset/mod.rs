//! Curated dataset records: building them from manual and scraped fields and
//! writing them to the dataset collection.

mod models;
mod upserter;

pub use models::{AutoFields, DatasetKey, DatasetRecord, ManualFields, UpsertOutcome};
pub use upserter::DatasetUpserter;

use crate::error::{MovieError, MovieResult};
use std::collections::HashSet;
use tracing::warn;

/// Splits comma-separated user input into a list: entries are trimmed, empty
/// entries dropped and case-insensitive duplicates removed, keeping the first.
pub fn parse_list(input: &str) -> Vec<String> {
    normalize_list(input.split(',').map(str::to_string).collect())
}

fn normalize_list(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .filter(|v| seen.insert(v.to_lowercase()))
        .collect()
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Combines manual and scraped fields into one record.
///
/// Manual values win; scraped ones only fill what the user left unset.
/// `gross_profit` is never scraped. Fails with [`MovieError::MissingKey`]
/// when the record has neither a URL nor both a title and a year.
pub fn build_record(
    url: Option<&str>,
    manual: ManualFields,
    auto: &AutoFields,
) -> MovieResult<DatasetRecord> {
    let gross_profit = match manual.gross_profit {
        Some(value) if value < 0 => {
            warn!("Ignoring negative gross profit {}", value);
            None
        }
        other => other,
    };

    let record = DatasetRecord {
        url: non_blank(url),
        title: non_blank(manual.title.as_deref()),
        genres: normalize_list(manual.genres),
        year: manual.year.or(auto.year),
        rating: manual.rating.or(auto.rating),
        director: normalize_list(manual.director),
        vote_count: manual.vote_count.or(auto.vote_count),
        writer: normalize_list(manual.writer),
        country: normalize_list(manual.country),
        runtime_minutes: manual.runtime_minutes.or(auto.runtime_minutes),
        gross_profit,
    };

    if record.key().is_none() {
        return Err(MovieError::MissingKey);
    }
    Ok(record)
}
