//! Errors surfaced by the sampling, selection and dataset operations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MovieError {
    #[error("Invalid sample size {requested}: must be between 1 and {available}")]
    InvalidSampleSize { requested: usize, available: usize },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Partial deletion: deleted {actual} of {expected} records, the population changed concurrently")]
    PartialDeletion { expected: usize, actual: usize },

    #[error("Failed to fetch {url}: {reason}")]
    FetchError { url: String, reason: String },

    #[error("Missing key: a record needs either a URL or both a title and a year")]
    MissingKey,

    #[error("Store unavailable: {0:#}")]
    StoreUnavailable(anyhow::Error),
}

pub type MovieResult<T> = Result<T, MovieError>;
