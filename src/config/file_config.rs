use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Store address (can override CLI)
    pub db_dir: Option<String>,
    pub db_name: Option<String>,
    pub busy_timeout_ms: Option<u64>,

    // Title page fetching
    pub fetch_timeout_sec: Option<u64>,
    pub user_agent: Option<String>,

    pub default_sample_size: Option<usize>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
