//! The single "currently selected" record of an interactive session.
//!
//! The selection is always a member of the filtered population, or none when
//! that population is empty. Every re-pick is a fresh uniform draw.

use crate::error::{MovieError, MovieResult};
use crate::movie_store::{PopulationRecord, PopulationStore, TitleFilter};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

pub struct SelectionState<R = StdRng> {
    filter: TitleFilter,
    filtered: Vec<PopulationRecord>,
    selected_id: Option<i64>,
    rng: R,
}

impl SelectionState<StdRng> {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }
}

impl Default for SelectionState<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> SelectionState<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            filter: TitleFilter::all(),
            filtered: Vec::new(),
            selected_id: None,
            rng,
        }
    }

    pub fn filter(&self) -> &TitleFilter {
        &self.filter
    }

    pub fn filtered(&self) -> &[PopulationRecord] {
        &self.filtered
    }

    pub fn selected_id(&self) -> Option<i64> {
        self.selected_id
    }

    pub fn selected(&self) -> Option<&PopulationRecord> {
        let id = self.selected_id?;
        self.filtered.iter().find(|r| r.id == id)
    }

    /// Replaces the filter and reloads the filtered set. The selection is
    /// kept only if it is still part of the new set.
    pub fn apply_filter(
        &mut self,
        store: &dyn PopulationStore,
        query: &str,
    ) -> MovieResult<&[PopulationRecord]> {
        self.filter = TitleFilter::new(query);
        self.reload(store)?;
        Ok(&self.filtered)
    }

    /// Reloads the filtered set from the store with the current filter,
    /// re-picking if the selection disappeared.
    pub fn reload(&mut self, store: &dyn PopulationStore) -> MovieResult<()> {
        self.filtered = store
            .find_population(&self.filter)
            .map_err(MovieError::StoreUnavailable)?;
        if self.selected().is_none() {
            self.repick();
        }
        Ok(())
    }

    /// Reloads the filtered set and picks a new selection from it, whether or
    /// not the previous one was still valid. The new pick may equal the old.
    pub fn refresh(
        &mut self,
        store: &dyn PopulationStore,
    ) -> MovieResult<Option<&PopulationRecord>> {
        self.filtered = store
            .find_population(&self.filter)
            .map_err(MovieError::StoreUnavailable)?;
        self.repick();
        Ok(self.selected())
    }

    /// Deletes the selected record from the store and re-picks.
    ///
    /// Fails with [`MovieError::NotFound`] when nothing is selected or the
    /// record was already gone from the store; in the latter case the stale
    /// id is dropped and a new record is picked anyway.
    pub fn delete_selected(
        &mut self,
        store: &dyn PopulationStore,
    ) -> MovieResult<PopulationRecord> {
        let id = self
            .selected_id
            .ok_or_else(|| MovieError::NotFound("no movie is selected".to_string()))?;

        let deleted = store
            .delete_population_record(id)
            .map_err(MovieError::StoreUnavailable)?;

        let position = self.filtered.iter().position(|r| r.id == id);
        let removed = position.map(|index| self.filtered.remove(index));
        self.repick();

        match (deleted, removed) {
            (0, _) => Err(MovieError::NotFound(format!(
                "movie {} is no longer in the population",
                id
            ))),
            (_, Some(record)) => {
                info!("Deleted movie {} ({:?})", record.id, record.title);
                Ok(record)
            }
            (_, None) => Err(MovieError::NotFound(format!("movie {}", id))),
        }
    }

    fn repick(&mut self) {
        self.selected_id = self.filtered.choose(&mut self.rng).map(|r| r.id);
        debug!(
            "Selected {:?} out of {} records",
            self.selected_id,
            self.filtered.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movie_store::InMemoryMovieStore;
    use std::collections::HashSet;

    fn seeded_selection() -> SelectionState<StdRng> {
        SelectionState::with_rng(StdRng::seed_from_u64(42))
    }

    #[test]
    fn refresh_eventually_selects_every_record() {
        let store = InMemoryMovieStore::with_population([(1, "A"), (2, "B"), (3, "C"), (4, "D")]);
        let mut selection = seeded_selection();
        selection.apply_filter(&store, "").unwrap();

        let mut seen = HashSet::new();
        for _ in 0..200 {
            let picked = selection.refresh(&store).unwrap().unwrap();
            seen.insert(picked.id);
        }
        assert_eq!(seen, HashSet::from([1, 2, 3, 4]));
    }

    #[test]
    fn filter_excluding_selection_repicks_from_new_set() {
        let store = InMemoryMovieStore::with_population([
            (1, "Los otros"),
            (2, "Volver"),
            (3, "Abre los ojos"),
            (4, "Tesis"),
        ]);
        for seed in 0..20 {
            let mut selection = SelectionState::with_rng(StdRng::seed_from_u64(seed));
            selection.apply_filter(&store, "volver").unwrap();
            assert_eq!(selection.selected_id(), Some(2));

            let filtered = selection.apply_filter(&store, "LOS").unwrap();
            assert_eq!(filtered.len(), 2);
            let picked = selection.selected_id().unwrap();
            assert!(picked == 1 || picked == 3);
        }
    }

    #[test]
    fn filter_keeps_selection_that_still_matches() {
        let store = InMemoryMovieStore::with_population([(1, "Los otros"), (2, "Volver")]);
        let mut selection = seeded_selection();
        selection.apply_filter(&store, "otros").unwrap();
        assert_eq!(selection.selected_id(), Some(1));
        selection.apply_filter(&store, "").unwrap();
        assert_eq!(selection.selected_id(), Some(1));
    }

    #[test]
    fn empty_filter_result_clears_selection() {
        let store = InMemoryMovieStore::with_population([(1, "A")]);
        let mut selection = seeded_selection();
        selection.apply_filter(&store, "a").unwrap();
        assert_eq!(selection.selected_id(), Some(1));

        selection.apply_filter(&store, "zzz").unwrap();
        assert_eq!(selection.selected_id(), None);
        assert!(selection.refresh(&store).unwrap().is_none());
    }

    #[test]
    fn delete_selected_removes_and_repicks() {
        let store = InMemoryMovieStore::with_population([(1, "A"), (2, "B")]);
        let mut selection = seeded_selection();
        selection.apply_filter(&store, "").unwrap();

        let first = selection.delete_selected(&store).unwrap();
        let remaining = selection.selected_id().unwrap();
        assert_ne!(first.id, remaining);
        assert_eq!(selection.filtered().len(), 1);

        selection.delete_selected(&store).unwrap();
        assert_eq!(selection.selected_id(), None);
        assert!(matches!(
            selection.delete_selected(&store),
            Err(MovieError::NotFound(_))
        ));
        assert_eq!(store.count_population(&TitleFilter::all()).unwrap(), 0);
    }

    #[test]
    fn delete_of_already_removed_record_is_not_found() {
        let store = InMemoryMovieStore::with_population([(1, "A"), (2, "B")]);
        let mut selection = seeded_selection();
        selection.apply_filter(&store, "").unwrap();
        let stale = selection.selected_id().unwrap();

        // another writer removes it first
        store.delete_population_record(stale).unwrap();

        assert!(matches!(
            selection.delete_selected(&store),
            Err(MovieError::NotFound(_))
        ));
        assert_eq!(selection.selected_id(), Some(if stale == 1 { 2 } else { 1 }));
    }
}
