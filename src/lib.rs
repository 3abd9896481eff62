//! Movie Sampler Library
//!
//! Random sampling and pruning of a movie population, and a curated movie
//! dataset fed by manual input and scraped title pages.

pub mod cli_style;
pub mod config;
pub mod csv_io;
pub mod dataset;
pub mod error;
pub mod fetcher;
pub mod movie_store;
pub mod sampler;
pub mod selection;
pub mod session;
pub mod sqlite_persistence;

// Re-export commonly used types for convenience
pub use dataset::{DatasetRecord, DatasetUpserter};
pub use error::{MovieError, MovieResult};
pub use movie_store::{DatasetStore, PopulationStore, SqliteMovieStore};
pub use sampler::Sampler;
pub use selection::SelectionState;
pub use session::Session;
