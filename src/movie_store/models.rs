//! Population models.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PopulationRecord {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "Movie")]
    pub title: String,
}

impl PopulationRecord {
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
        }
    }
}

/// Folds a title for case-insensitive matching. The folded form is what the
/// store indexes, so queries and stored titles must go through the same
/// function.
pub fn fold_title(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Case-insensitive substring filter on population titles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitleFilter {
    folded_query: Option<String>,
}

impl TitleFilter {
    /// A filter that matches every record.
    pub fn all() -> Self {
        Self::default()
    }

    /// A blank query is the same as [`TitleFilter::all`].
    pub fn new(query: &str) -> Self {
        let folded = fold_title(query);
        Self {
            folded_query: if folded.is_empty() { None } else { Some(folded) },
        }
    }

    pub fn folded_query(&self) -> Option<&str> {
        self.folded_query.as_deref()
    }

    pub fn is_all(&self) -> bool {
        self.folded_query.is_none()
    }

    pub fn matches(&self, title: &str) -> bool {
        match &self.folded_query {
            None => true,
            Some(query) => fold_title(title).contains(query.as_str()),
        }
    }
}

impl std::fmt::Display for TitleFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.folded_query {
            None => write!(f, "<all>"),
            Some(query) => write!(f, "{:?}", query),
        }
    }
}
