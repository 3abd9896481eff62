//! Fetching the scraped fields of a movie title page.

mod imdb;
mod parse;

pub use imdb::{ImdbFetcher, DEFAULT_USER_AGENT};
pub use parse::parse_title_page;

use crate::dataset::AutoFields;
use crate::error::MovieResult;

pub trait TitlePageFetcher: Send + Sync {
    /// Returns whatever fields the page provides. Only a failure to get or
    /// read the page itself is an error.
    fn fetch_page(&self, url: &str) -> MovieResult<AutoFields>;
}
