//! State owned by one interactive session.

use crate::dataset::AutoFields;
use crate::error::{MovieError, MovieResult};
use crate::movie_store::{PopulationRecord, PopulationStore, TitleFilter};
use crate::sampler::Sampler;
use crate::selection::SelectionState;

#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPage {
    pub url: String,
    pub fields: AutoFields,
}

#[derive(Default)]
pub struct Session {
    pub selection: SelectionState,
    fetched: Option<FetchedPage>,
    previewed_sample: Option<Vec<PopulationRecord>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remember_fetch(&mut self, url: &str, fields: AutoFields) {
        self.fetched = Some(FetchedPage {
            url: url.trim().to_string(),
            fields,
        });
    }

    pub fn clear_fetch(&mut self) {
        self.fetched = None;
    }

    pub fn last_fetch(&self) -> Option<&FetchedPage> {
        self.fetched.as_ref()
    }

    /// Keeps the last previewed sample so it can be committed later.
    pub fn remember_preview(&mut self, sample: Vec<PopulationRecord>) {
        self.previewed_sample = Some(sample);
    }

    pub fn previewed_sample(&self) -> Option<&[PopulationRecord]> {
        self.previewed_sample.as_deref()
    }

    /// Deletes the previewed sample. The preview is dropped once the store
    /// has answered, and kept when it could not be reached.
    pub fn commit_preview(&mut self, store: &dyn PopulationStore) -> MovieResult<usize> {
        let ids: Vec<i64> = self
            .previewed_sample
            .as_deref()
            .ok_or_else(|| MovieError::NotFound("no previewed sample".to_string()))?
            .iter()
            .map(|r| r.id)
            .collect();
        let result = Sampler::new(store).commit_sample_deletion(&ids);
        if !matches!(result, Err(MovieError::StoreUnavailable(_))) {
            self.previewed_sample = None;
        }
        result
    }

    /// The filter a sampling command uses: its own query when given,
    /// otherwise the selection's active filter.
    pub fn sample_filter(&self, query: Option<&str>) -> TitleFilter {
        match query {
            Some(query) => TitleFilter::new(query),
            None => self.selection.filter().clone(),
        }
    }

    /// The fields fetched for `url`, or none if the last fetch was for a
    /// different page.
    pub fn auto_fields_for(&self, url: Option<&str>) -> AutoFields {
        match (&self.fetched, url.map(str::trim)) {
            (Some(page), Some(url)) if page.url == url => page.fields.clone(),
            _ => AutoFields::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movie_store::InMemoryMovieStore;

    #[test]
    fn fetched_fields_only_apply_to_the_same_url() {
        let mut session = Session::new();
        let fields = AutoFields {
            rating: Some(7.1),
            ..Default::default()
        };
        session.remember_fetch("https://www.imdb.com/title/tt1/ ", fields.clone());

        assert_eq!(
            session.auto_fields_for(Some("https://www.imdb.com/title/tt1/")),
            fields
        );
        assert!(session
            .auto_fields_for(Some("https://www.imdb.com/title/tt2/"))
            .is_empty());
        assert!(session.auto_fields_for(None).is_empty());

        session.clear_fetch();
        assert!(session.last_fetch().is_none());
    }

    #[test]
    fn commit_preview_deletes_once() {
        let store = InMemoryMovieStore::with_population([(1, "A"), (2, "B"), (3, "C")]);
        let mut session = Session::new();
        assert!(matches!(
            session.commit_preview(&store),
            Err(MovieError::NotFound(_))
        ));

        session.remember_preview(vec![PopulationRecord::new(1, "A"), PopulationRecord::new(3, "C")]);
        assert_eq!(session.commit_preview(&store).unwrap(), 2);
        assert!(session.previewed_sample().is_none());

        // the store answered, so a partial deletion still drops the preview
        session.remember_preview(vec![PopulationRecord::new(2, "B"), PopulationRecord::new(3, "C")]);
        assert!(matches!(
            session.commit_preview(&store),
            Err(MovieError::PartialDeletion { expected: 2, actual: 1 })
        ));
        assert!(session.previewed_sample().is_none());
    }

    #[test]
    fn sample_filter_defaults_to_the_selection_filter() {
        let store = InMemoryMovieStore::with_population([(1, "Abre los ojos"), (2, "Volver")]);
        let mut session = Session::new();
        assert_eq!(session.sample_filter(None), TitleFilter::all());

        session.selection.apply_filter(&store, "ojos").unwrap();
        assert_eq!(session.sample_filter(None), TitleFilter::new("ojos"));
        assert_eq!(session.sample_filter(Some("volver")), TitleFilter::new("volver"));
    }
}
