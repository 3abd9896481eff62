//! Store failures surface as `StoreUnavailable` and leave session state alone.

mod common;

use common::{StubFetcher, TestStore, UnavailableStore, LOS_QUERY};
use movie_sampler::dataset::{DatasetRecord, DatasetUpserter};
use movie_sampler::movie_store::{PopulationStore, TitleFilter};
use movie_sampler::selection::SelectionState;
use movie_sampler::{MovieError, Sampler, Session};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

#[test]
fn test_sampler_surfaces_store_failure() {
    let sampler = Sampler::new(&UnavailableStore);

    assert!(matches!(
        sampler.draw_sample(2, &TitleFilter::all()),
        Err(MovieError::StoreUnavailable(_))
    ));
    assert!(matches!(
        sampler.commit_sample_deletion(&[1, 2]),
        Err(MovieError::StoreUnavailable(_))
    ));
}

#[test]
fn test_selection_is_unchanged_when_store_fails() {
    let test_store = TestStore::seeded();
    let mut selection = SelectionState::with_rng(StdRng::seed_from_u64(5));
    selection.apply_filter(&test_store.store, LOS_QUERY).unwrap();
    let selected = selection.selected_id();
    let filtered = selection.filtered().to_vec();
    assert!(selected.is_some());

    let failing: &dyn PopulationStore = &UnavailableStore;
    assert!(matches!(
        selection.refresh(failing),
        Err(MovieError::StoreUnavailable(_))
    ));
    assert_eq!(selection.selected_id(), selected);
    assert_eq!(selection.filtered(), filtered.as_slice());

    assert!(matches!(
        selection.delete_selected(failing),
        Err(MovieError::StoreUnavailable(_))
    ));
    assert_eq!(selection.selected_id(), selected);
    assert_eq!(selection.filtered(), filtered.as_slice());

    // nothing was deleted, retrying against a working store succeeds
    let deleted = selection.delete_selected(&test_store.store).unwrap();
    assert_eq!(Some(deleted.id), selected);
}

#[test]
fn test_upsert_surfaces_store_failure() {
    let upserter = DatasetUpserter::new(
        Arc::new(StubFetcher::failing()),
        Arc::new(UnavailableStore),
    );
    let record = DatasetRecord {
        title: Some("X".to_string()),
        year: Some(2020),
        ..Default::default()
    };

    match upserter.upsert(&record) {
        Err(MovieError::StoreUnavailable(e)) => {
            assert!(e.to_string().contains("database is locked"))
        }
        other => panic!("expected store failure, got {:?}", other),
    }
    assert!(matches!(
        upserter.count(),
        Err(MovieError::StoreUnavailable(_))
    ));
}

#[test]
fn test_preview_survives_failed_commit() {
    let test_store = TestStore::seeded();
    let mut session = Session::new();
    let sample = Sampler::new(&test_store.store)
        .preview_sample(2, &TitleFilter::all())
        .unwrap();
    session.remember_preview(sample);

    assert!(matches!(
        session.commit_preview(&UnavailableStore),
        Err(MovieError::StoreUnavailable(_))
    ));
    assert_eq!(session.previewed_sample().map(|s| s.len()), Some(2));

    assert_eq!(session.commit_preview(&test_store.store).unwrap(), 2);
    assert!(session.previewed_sample().is_none());
}
