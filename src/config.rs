//! Configuration for lodebot.
//!
//! Settings are built in three layers: built-in defaults, an optional TOML
//! file, then environment variables (`.env` is loaded by `main`).

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::lodestone::DEFAULT_REGION;
use crate::repository::util::is_postgres_url;

/// Default SQLite database filename inside the data directory.
pub const DEFAULT_DATABASE_FILENAME: &str = "lodebot.db";

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Environment variables read on top of file configuration.
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_REDIS_URL: &str = "REDIS_URL";
pub const ENV_REGION: &str = "LODESTONE_REGION";
pub const ENV_TIMEOUT: &str = "LODESTONE_TIMEOUT";
pub const ENV_USER_AGENT: &str = "BOT_USER_AGENT";
pub const ENV_SELECTOR_ROOT: &str = "LODESTONE_SELECTOR_ROOT";

/// Errors while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },
}

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory (holds the default SQLite database).
    pub data_dir: PathBuf,
    /// Database URL (overrides data_dir/lodebot.db if set).
    /// Supports sqlite: paths and postgres:// URLs.
    pub database_url: Option<String>,
    /// Redis URL for verification tokens (None = in-memory).
    pub redis_url: Option<String>,
    /// Lodestone region subdomain (`na`, `eu`, `fr`, `de`, `jp`).
    pub region: String,
    /// Request timeout in seconds.
    pub request_timeout: u64,
    /// Custom User-Agent (None = scraper default).
    pub user_agent: Option<String>,
    /// Root of the selector catalog.
    pub selector_root: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lodebot");

        Self {
            data_dir,
            database_url: None,
            redis_url: None,
            region: DEFAULT_REGION.to_string(),
            request_timeout: DEFAULT_TIMEOUT_SECS,
            user_agent: None,
            selector_root: Path::new(env!("CARGO_MANIFEST_DIR")).join("selectors"),
        }
    }
}

/// On-disk configuration file. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub data_dir: Option<PathBuf>,
    pub database: Option<String>,
    pub redis: Option<String>,
    pub region: Option<String>,
    pub timeout: Option<u64>,
    pub user_agent: Option<String>,
    pub selectors: Option<PathBuf>,
}

impl FileConfig {
    /// Read and parse a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl Settings {
    /// Load settings: defaults, then `config_path` if given, then the process
    /// environment.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = Self::default();
        if let Some(path) = config_path {
            tracing::debug!("Loading config from {}", path.display());
            settings.apply_file(FileConfig::load(path)?, path.parent());
        }
        settings.apply_env(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    /// Apply file values. Relative paths resolve against `base`.
    pub fn apply_file(&mut self, file: FileConfig, base: Option<&Path>) {
        let resolve = |p: PathBuf| match base {
            Some(base) if p.is_relative() => base.join(p),
            _ => p,
        };

        if let Some(dir) = file.data_dir {
            self.data_dir = resolve(dir);
        }
        if let Some(url) = non_empty(file.database) {
            self.database_url = Some(url);
        }
        if let Some(url) = non_empty(file.redis) {
            self.redis_url = Some(url);
        }
        if let Some(region) = non_empty(file.region) {
            self.region = region;
        }
        if let Some(timeout) = file.timeout {
            self.request_timeout = timeout;
        }
        if let Some(ua) = non_empty(file.user_agent) {
            self.user_agent = Some(ua);
        }
        if let Some(root) = file.selectors {
            self.selector_root = resolve(root);
        }
    }

    /// Apply environment overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = non_empty(lookup(ENV_DATABASE_URL)) {
            self.database_url = Some(url);
        }
        if let Some(url) = non_empty(lookup(ENV_REDIS_URL)) {
            self.redis_url = Some(url);
        }
        if let Some(region) = non_empty(lookup(ENV_REGION)) {
            self.region = region;
        }
        if let Some(raw) = non_empty(lookup(ENV_TIMEOUT)) {
            self.request_timeout =
                raw.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        key: ENV_TIMEOUT.to_string(),
                        value: raw.clone(),
                    })?;
        }
        if let Some(ua) = non_empty(lookup(ENV_USER_AGENT)) {
            self.user_agent = Some(ua);
        }
        if let Some(root) = non_empty(lookup(ENV_SELECTOR_ROOT)) {
            self.selector_root = PathBuf::from(root);
        }
        Ok(())
    }

    /// Get the database URL, constructing from the data directory if not set.
    pub fn database_url(&self) -> String {
        match &self.database_url {
            Some(url) => url.clone(),
            None => format!("sqlite:{}", self.database_path().display()),
        }
    }

    /// Path of the default SQLite database.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DEFAULT_DATABASE_FILENAME)
    }

    pub fn is_postgres(&self) -> bool {
        self.database_url
            .as_ref()
            .is_some_and(|url| is_postgres_url(url))
    }

    /// Create the data directory when the default SQLite database is used.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        if self.database_url.is_some() {
            return Ok(());
        }
        fs::create_dir_all(&self.data_dir).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create data directory '{}': {}",
                    self.data_dir.display(),
                    e
                ),
            )
        })
    }
}
