mod file_config;

pub use file_config::FileConfig;

use crate::fetcher::DEFAULT_USER_AGENT;
use anyhow::{bail, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DB_NAME: &str = "movie_list";
pub const DEFAULT_FETCH_TIMEOUT_SEC: u64 = 20;
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 15_000;
pub const DEFAULT_SAMPLE_SIZE: usize = 10;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub db_name: String,
    pub busy_timeout_ms: u64,
    pub fetch_timeout_sec: u64,
    pub user_agent: Option<String>,
    pub default_sample_size: usize,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            db_dir: None,
            db_name: DEFAULT_DB_NAME.to_string(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            fetch_timeout_sec: DEFAULT_FETCH_TIMEOUT_SEC,
            user_agent: None,
            default_sample_size: DEFAULT_SAMPLE_SIZE,
        }
    }
}

/// Loaded once at startup and never changed afterwards.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    pub db_name: String,
    pub busy_timeout_ms: u64,
    pub fetch_timeout_sec: u64,
    pub user_agent: String,
    pub default_sample_size: usize,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let db_name = file.db_name.unwrap_or_else(|| cli.db_name.clone());
        if db_name.trim().is_empty() || db_name.contains(['/', '\\']) {
            bail!("Invalid database name: {:?}", db_name);
        }

        let default_sample_size = file
            .default_sample_size
            .unwrap_or(cli.default_sample_size);
        if default_sample_size == 0 {
            bail!("default_sample_size must be at least 1");
        }

        let user_agent = file
            .user_agent
            .or_else(|| cli.user_agent.clone())
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        Ok(Self {
            db_dir,
            db_name,
            busy_timeout_ms: file.busy_timeout_ms.unwrap_or(cli.busy_timeout_ms),
            fetch_timeout_sec: file.fetch_timeout_sec.unwrap_or(cli.fetch_timeout_sec),
            user_agent,
            default_sample_size,
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.db_dir.join(format!("{}.db", self.db_name))
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_sec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_temp_db_dir() -> TempDir {
        TempDir::new().unwrap()
    }

    #[test]
    fn test_resolve_cli_only() {
        let temp_dir = make_temp_db_dir();
        let cli = CliConfig {
            db_dir: Some(temp_dir.path().to_path_buf()),
            db_name: "films".to_string(),
            busy_timeout_ms: 500,
            fetch_timeout_sec: 5,
            user_agent: Some("test-agent".to_string()),
            default_sample_size: 3,
        };

        let config = AppConfig::resolve(&cli, None).unwrap();

        assert_eq!(config.db_dir, temp_dir.path());
        assert_eq!(config.db_path(), temp_dir.path().join("films.db"));
        assert_eq!(config.busy_timeout(), Duration::from_millis(500));
        assert_eq!(config.fetch_timeout(), Duration::from_secs(5));
        assert_eq!(config.user_agent, "test-agent");
        assert_eq!(config.default_sample_size, 3);
    }

    #[test]
    fn test_resolve_defaults() {
        let temp_dir = make_temp_db_dir();
        let cli = CliConfig {
            db_dir: Some(temp_dir.path().to_path_buf()),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli, None).unwrap();

        assert_eq!(config.db_path(), temp_dir.path().join("movie_list.db"));
        assert_eq!(config.busy_timeout_ms, 15_000);
        assert_eq!(config.fetch_timeout_sec, 20);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.default_sample_size, 10);
    }

    #[test]
    fn test_resolve_toml_overrides_cli() {
        let temp_dir = make_temp_db_dir();
        let cli = CliConfig {
            db_dir: Some(PathBuf::from("/should/be/overridden")),
            db_name: "cli_name".to_string(),
            ..Default::default()
        };
        let file_config = FileConfig {
            db_dir: Some(temp_dir.path().to_string_lossy().to_string()),
            db_name: Some("toml_name".to_string()),
            fetch_timeout_sec: Some(60),
            default_sample_size: Some(25),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli, Some(file_config)).unwrap();

        assert_eq!(config.db_dir, temp_dir.path());
        assert_eq!(config.db_name, "toml_name");
        assert_eq!(config.fetch_timeout_sec, 60);
        assert_eq!(config.default_sample_size, 25);
        // not in TOML, CLI value kept
        assert_eq!(config.busy_timeout_ms, DEFAULT_BUSY_TIMEOUT_MS);
    }

    #[test]
    fn test_resolve_missing_db_dir() {
        let result = AppConfig::resolve(&CliConfig::default(), None);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("db_dir must be specified"));
    }

    #[test]
    fn test_resolve_nonexistent_db_dir() {
        let cli = CliConfig {
            db_dir: Some(PathBuf::from("/nonexistent/path/that/does/not/exist")),
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("does not exist"));
    }

    #[test]
    fn test_resolve_rejects_bad_values() {
        let temp_dir = make_temp_db_dir();
        let cli = CliConfig {
            db_dir: Some(temp_dir.path().to_path_buf()),
            db_name: "../escape".to_string(),
            ..Default::default()
        };
        assert!(AppConfig::resolve(&cli, None).is_err());

        let cli = CliConfig {
            db_dir: Some(temp_dir.path().to_path_buf()),
            default_sample_size: 0,
            ..Default::default()
        };
        assert!(AppConfig::resolve(&cli, None).is_err());
    }

    #[test]
    fn test_file_config_load() {
        let temp_dir = make_temp_db_dir();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
db_name = "curated"
busy_timeout_ms = 2000

user_agent = "movie-sampler/0.1"
"#,
        )
        .unwrap();

        let file_config = FileConfig::load(&path).unwrap();
        assert_eq!(file_config.db_name, Some("curated".to_string()));
        assert_eq!(file_config.busy_timeout_ms, Some(2000));
        assert_eq!(file_config.user_agent, Some("movie-sampler/0.1".to_string()));
        assert!(file_config.db_dir.is_none());
    }
}
