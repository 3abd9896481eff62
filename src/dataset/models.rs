//! Dataset record models.

use serde::{Deserialize, Serialize};

/// Fields scraped from a title page. Each one is independently optional,
/// pages routinely omit some of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoFields {
    pub year: Option<i32>,
    pub rating: Option<f64>,
    pub vote_count: Option<i64>,
    pub runtime_minutes: Option<i32>,
}

impl AutoFields {
    pub fn is_empty(&self) -> bool {
        self.missing_fields().len() == 4
    }

    /// Names of the fields the page did not provide.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.year.is_none() {
            missing.push("year");
        }
        if self.rating.is_none() {
            missing.push("rating");
        }
        if self.vote_count.is_none() {
            missing.push("voteCount");
        }
        if self.runtime_minutes.is_none() {
            missing.push("runtimeMinutes");
        }
        missing
    }
}

/// Fields typed in by the user. Anything set here wins over [`AutoFields`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManualFields {
    pub title: Option<String>,
    pub genres: Vec<String>,
    pub year: Option<i32>,
    pub rating: Option<f64>,
    pub director: Vec<String>,
    pub vote_count: Option<i64>,
    pub writer: Vec<String>,
    pub country: Vec<String>,
    pub runtime_minutes: Option<i32>,
    pub gross_profit: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    pub year: Option<i32>,
    pub rating: Option<f64>,
    #[serde(default)]
    pub director: Vec<String>,
    pub vote_count: Option<i64>,
    #[serde(default)]
    pub writer: Vec<String>,
    #[serde(default)]
    pub country: Vec<String>,
    pub runtime_minutes: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gross_profit: Option<i64>,
}

/// The identity a dataset record is matched on when upserting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetKey {
    Url(String),
    TitleYear { title: String, year: i32 },
}

impl std::fmt::Display for DatasetKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetKey::Url(url) => write!(f, "url={}", url),
            DatasetKey::TitleYear { title, year } => write!(f, "title={:?}, year={}", title, year),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

impl UpsertOutcome {
    pub fn from_revision(revision: i64) -> Self {
        if revision <= 1 {
            UpsertOutcome::Inserted
        } else {
            UpsertOutcome::Updated
        }
    }
}

fn first_non_empty(incoming: Vec<String>, existing: &[String]) -> Vec<String> {
    if incoming.is_empty() {
        existing.to_vec()
    } else {
        incoming
    }
}

impl DatasetRecord {
    /// Resolves the upsert key: a non-empty URL, otherwise title and year.
    pub fn key(&self) -> Option<DatasetKey> {
        if let Some(url) = self.url.as_deref().map(str::trim) {
            if !url.is_empty() {
                return Some(DatasetKey::Url(url.to_string()));
            }
        }
        match (self.title.as_deref().map(str::trim), self.year) {
            (Some(title), Some(year)) if !title.is_empty() => Some(DatasetKey::TitleYear {
                title: title.to_string(),
                year,
            }),
            _ => None,
        }
    }

    /// Overlays `self` on a previously stored record. Absent or empty values
    /// in `self` keep whatever `existing` had.
    pub fn merged_over(self, existing: &DatasetRecord) -> DatasetRecord {
        DatasetRecord {
            url: self.url.or_else(|| existing.url.clone()),
            title: self.title.or_else(|| existing.title.clone()),
            genres: first_non_empty(self.genres, &existing.genres),
            year: self.year.or(existing.year),
            rating: self.rating.or(existing.rating),
            director: first_non_empty(self.director, &existing.director),
            vote_count: self.vote_count.or(existing.vote_count),
            writer: first_non_empty(self.writer, &existing.writer),
            country: first_non_empty(self.country, &existing.country),
            runtime_minutes: self.runtime_minutes.or(existing.runtime_minutes),
            gross_profit: self.gross_profit.or(existing.gross_profit),
        }
    }
}
