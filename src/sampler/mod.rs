//! Uniform random sampling of the population, without replacement.

use crate::error::{MovieError, MovieResult};
use crate::movie_store::{PopulationRecord, PopulationStore, TitleFilter};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Draws up to `size` items uniformly at random without replacement, in a
/// uniformly random order.
///
/// Single pass reservoir (Algorithm R). The reservoir keeps the first items
/// in arrival order, so it is shuffled before returning.
pub fn reservoir_sample<T, I, R>(items: I, size: usize, rng: &mut R) -> Vec<T>
where
    I: IntoIterator<Item = T>,
    R: Rng + ?Sized,
{
    if size == 0 {
        return Vec::new();
    }
    let mut reservoir = Vec::with_capacity(size);
    for (seen, item) in items.into_iter().enumerate() {
        if seen < size {
            reservoir.push(item);
        } else {
            let slot = rng.random_range(0..=seen);
            if slot < size {
                reservoir[slot] = item;
            }
        }
    }
    reservoir.shuffle(rng);
    reservoir
}

pub struct Sampler<'a> {
    store: &'a dyn PopulationStore,
}

impl<'a> Sampler<'a> {
    pub fn new(store: &'a dyn PopulationStore) -> Self {
        Self { store }
    }

    /// Draws exactly `size` distinct records matching `filter`.
    ///
    /// Fails with [`MovieError::InvalidSampleSize`] when `size` is zero or
    /// larger than the number of matching records.
    pub fn draw_sample(
        &self,
        size: usize,
        filter: &TitleFilter,
    ) -> MovieResult<Vec<PopulationRecord>> {
        let available = self
            .store
            .count_population(filter)
            .map_err(MovieError::StoreUnavailable)?;
        if size == 0 || size > available {
            return Err(MovieError::InvalidSampleSize {
                requested: size,
                available,
            });
        }

        let sample = self
            .store
            .sample_population(size, filter)
            .map_err(MovieError::StoreUnavailable)?;

        // the population can shrink between the count and the draw
        if sample.len() != size {
            warn!(
                "Population changed while sampling: wanted {}, got {}",
                size,
                sample.len()
            );
            return Err(MovieError::InvalidSampleSize {
                requested: size,
                available: sample.len(),
            });
        }

        debug!("Drew {} of {} records (filter {})", size, available, filter);
        Ok(sample)
    }

    /// Same draw as [`Sampler::draw_sample`]. Never writes to the store.
    pub fn preview_sample(
        &self,
        size: usize,
        filter: &TitleFilter,
    ) -> MovieResult<Vec<PopulationRecord>> {
        self.draw_sample(size, filter)
    }

    /// Deletes exactly the given ids and returns the number deleted.
    ///
    /// Repeated ids count once. When the store deletes a different number of
    /// records than requested, [`MovieError::PartialDeletion`] reports both.
    pub fn commit_sample_deletion(&self, sample_ids: &[i64]) -> MovieResult<usize> {
        let distinct: Vec<i64> = sample_ids
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if distinct.is_empty() {
            return Err(MovieError::InvalidSampleSize {
                requested: 0,
                available: 0,
            });
        }

        let deleted = self
            .store
            .delete_population_records(&distinct)
            .map_err(MovieError::StoreUnavailable)?;

        if deleted != distinct.len() {
            warn!(
                "Partial deletion: {} of {} sampled records deleted",
                deleted,
                distinct.len()
            );
            return Err(MovieError::PartialDeletion {
                expected: distinct.len(),
                actual: deleted,
            });
        }

        info!("Deleted {} sampled records", deleted);
        Ok(deleted)
    }

    /// Draws a sample and deletes exactly the drawn records.
    pub fn draw_and_delete(
        &self,
        size: usize,
        filter: &TitleFilter,
    ) -> MovieResult<Vec<PopulationRecord>> {
        let sample = self.draw_sample(size, filter)?;
        let ids: Vec<i64> = sample.iter().map(|r| r.id).collect();
        self.commit_sample_deletion(&ids)?;
        Ok(sample)
    }
}
