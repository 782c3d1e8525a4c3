//! Runtime configuration for store, index backend and logging.
//!
//! # Responsibility
//! - Provide defaults usable without any environment.
//! - Parse `TODO_*` environment overrides into typed values.
//!
//! # Invariants
//! - A loaded config always carries a valid index name.
//! - Unknown or malformed values are rejected, never silently replaced.

use crate::logging::default_log_level;
use crate::search::fts::is_valid_index_name;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_INDEX_PATH: &str = "TODO_INDEX_PATH";
pub const ENV_INDEX_NAME: &str = "TODO_INDEX_NAME";
pub const ENV_INDEX_TIMEOUT_MS: &str = "TODO_INDEX_TIMEOUT_MS";
pub const ENV_INDEX_MAX_HITS: &str = "TODO_INDEX_MAX_HITS";
pub const ENV_TOMBSTONE_ON_DELETE: &str = "TODO_TOMBSTONE_ON_DELETE";
pub const ENV_SEED_SAMPLE_DATA: &str = "TODO_SEED_SAMPLE_DATA";
pub const ENV_LOG_LEVEL: &str = "TODO_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "TODO_LOG_DIR";

const DEFAULT_INDEX_NAME: &str = "todos";
const DEFAULT_INDEX_TIMEOUT_MS: u64 = 2_000;
const DEFAULT_MAX_HITS: u32 = 100;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
    InvalidIndexName(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue {
                key,
                value,
                expected,
            } => write!(f, "invalid value `{value}` for {key}; expected {expected}"),
            Self::InvalidIndexName(name) => write!(
                f,
                "invalid index name `{name}`; expected [A-Za-z_][A-Za-z0-9_]*"
            ),
        }
    }
}

impl Error for ConfigError {}

/// Store and index settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoConfig {
    /// SQLite file hosting the index. `None` keeps the index in memory.
    pub index_path: Option<PathBuf>,
    pub index_name: String,
    /// Upper bound for any single index call before it degrades.
    pub index_timeout: Duration,
    /// Maximum number of candidates fetched per query.
    pub max_hits: u32,
    /// Remove index entries on delete instead of leaving them to
    /// read-time reconciliation.
    pub tombstone_on_delete: bool,
    /// Seed the store with `sample_todos()` at bootstrap.
    pub seed_sample_data: bool,
    pub log_level: String,
    /// Absolute directory for rolling log files. `None` disables file logs.
    pub log_dir: Option<PathBuf>,
}

impl Default for TodoConfig {
    fn default() -> Self {
        Self {
            index_path: None,
            index_name: DEFAULT_INDEX_NAME.to_string(),
            index_timeout: Duration::from_millis(DEFAULT_INDEX_TIMEOUT_MS),
            max_hits: DEFAULT_MAX_HITS,
            tombstone_on_delete: false,
            seed_sample_data: false,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl TodoConfig {
    /// Loads defaults overridden by `TODO_*` process environment variables.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads defaults overridden by values returned from `lookup`.
    ///
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(path) = read(ENV_INDEX_PATH) {
            config.index_path = Some(PathBuf::from(path));
        }
        if let Some(name) = read(ENV_INDEX_NAME) {
            config = config.with_index_name(name)?;
        }
        if let Some(value) = read(ENV_INDEX_TIMEOUT_MS) {
            let millis = value.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                key: ENV_INDEX_TIMEOUT_MS,
                value: value.clone(),
                expected: "milliseconds as unsigned integer",
            })?;
            config.index_timeout = Duration::from_millis(millis);
        }
        if let Some(value) = read(ENV_INDEX_MAX_HITS) {
            config.max_hits = value.parse::<u32>().map_err(|_| ConfigError::InvalidValue {
                key: ENV_INDEX_MAX_HITS,
                value: value.clone(),
                expected: "unsigned integer",
            })?;
        }
        if let Some(value) = read(ENV_TOMBSTONE_ON_DELETE) {
            config.tombstone_on_delete = parse_flag(ENV_TOMBSTONE_ON_DELETE, &value)?;
        }
        if let Some(value) = read(ENV_SEED_SAMPLE_DATA) {
            config.seed_sample_data = parse_flag(ENV_SEED_SAMPLE_DATA, &value)?;
        }
        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        if let Some(dir) = read(ENV_LOG_DIR) {
            config.log_dir = Some(PathBuf::from(dir));
        }

        Ok(config)
    }

    /// Sets the index name after validating it as a backend identifier.
    pub fn with_index_name(mut self, name: impl Into<String>) -> ConfigResult<Self> {
        let name = name.into();
        if !is_valid_index_name(&name) {
            return Err(ConfigError::InvalidIndexName(name));
        }
        self.index_name = name;
        Ok(self)
    }

    pub fn with_index_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.index_path = Some(path.into());
        self
    }

    pub fn with_index_timeout(mut self, timeout: Duration) -> Self {
        self.index_timeout = timeout;
        self
    }

    pub fn with_tombstone_on_delete(mut self, enabled: bool) -> Self {
        self.tombstone_on_delete = enabled;
        self
    }

    pub fn with_sample_data(mut self, enabled: bool) -> Self {
        self.seed_sample_data = enabled;
        self
    }
}

fn parse_flag(key: &'static str, value: &str) -> ConfigResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            expected: "true|false",
        }),
    }
}
