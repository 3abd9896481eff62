//! IMDb title page client.

use super::{parse_title_page, TitlePageFetcher};
use crate::dataset::AutoFields;
use crate::error::{MovieError, MovieResult};
use anyhow::Result;
use reqwest::blocking::Client;
use std::time::Duration;
use tracing::{debug, info};

/// IMDb serves a reduced page to unknown agents.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/123.0 Safari/537.36";

pub struct ImdbFetcher {
    client: Client,
}

impl ImdbFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    fn fetch_error(url: &str, reason: impl ToString) -> MovieError {
        MovieError::FetchError {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl TitlePageFetcher for ImdbFetcher {
    fn fetch_page(&self, url: &str) -> MovieResult<AutoFields> {
        debug!("Fetching title page {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| Self::fetch_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::fetch_error(url, format!("HTTP status {}", status)));
        }

        let body = response.text().map_err(|e| Self::fetch_error(url, e))?;
        let fields = parse_title_page(&body);
        info!("Fetched {}: {:?}", url, fields);
        Ok(fields)
    }
}
