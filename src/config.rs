//! ReplBridge Configuration
//!
//! This module provides configuration structures for the replication
//! bridge: connection parameters for both endpoints, pool limits, logging
//! and the optional extra-config mapping document.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::gate::MatchMode;
use crate::mapping::MappingDocument;

/// Pool size used whenever a configured limit is missing or unusable
pub const DEFAULT_POOL_SIZE: u32 = 10;

/// Main ReplBridge configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Maximum connections in the source pool
    #[serde(default)]
    pub max_pool_size_source: Option<PoolLimit>,

    /// Maximum connections in the target pool
    #[serde(default)]
    pub max_pool_size_target: Option<PoolLimit>,

    /// Text encoding used for the source connection
    #[serde(default = "default_encoding")]
    pub encoding: String,

    /// Target schema name
    #[serde(default)]
    pub schema: Option<String>,

    /// Tables excluded from replication
    #[serde(default)]
    pub exclude_tables: Vec<String>,

    /// Load the extra-config mapping document
    #[serde(default)]
    pub enable_extra_config: bool,

    /// Path of the extra-config mapping document
    #[serde(default = "default_extra_config")]
    pub extra_config: PathBuf,

    /// Directory holding all.log, errors-only.log and per-table logs
    #[serde(default = "default_logs_dir")]
    pub logs_dir: PathBuf,

    /// Source (MySQL) connection parameters
    pub source: SourceConfig,

    /// Target (PostgreSQL) connection parameters
    pub target: TargetConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Operator confirmation configuration
    #[serde(default)]
    pub gate: GateConfig,

    /// Directory relative paths are resolved against
    #[serde(skip)]
    base_dir: PathBuf,
}

/// Source database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// MySQL host
    pub host: String,

    /// MySQL port
    #[serde(default = "default_source_port")]
    pub port: u16,

    /// Database user
    pub user: String,

    /// Database password
    #[serde(default)]
    pub password: String,

    /// Database to replicate from
    pub database: String,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

/// Target database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// PostgreSQL host
    pub host: String,

    /// PostgreSQL port
    #[serde(default = "default_target_port")]
    pub port: u16,

    /// Database user
    pub user: String,

    /// Database password
    #[serde(default)]
    pub password: String,

    /// Database to replicate into
    pub database: String,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Operator confirmation configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GateConfig {
    /// How input lines are matched against 'Y' / 'n'
    #[serde(default)]
    pub match_mode: MatchMode,
}

/// A configured pool limit as written in the file.
///
/// Operators write these as numbers or strings; anything that is not a
/// positive integer falls back to [`DEFAULT_POOL_SIZE`]. That includes
/// fractional numbers such as `2.5` or `"2.5"`, which are not rounded, and
/// any other TOML value (booleans, arrays, tables).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PoolLimit {
    Integer(i64),
    Float(f64),
    Text(String),
    Other(toml::Value),
}

impl PoolLimit {
    fn as_integer(&self) -> Option<i64> {
        match self {
            PoolLimit::Integer(n) => Some(*n),
            PoolLimit::Float(f) => integral(*f),
            PoolLimit::Text(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(integral))
            }
            PoolLimit::Other(_) => None,
        }
    }

    /// Effective pool size for this setting
    pub fn effective(&self) -> u32 {
        match self.as_integer() {
            Some(n) if n > 0 => u32::try_from(n).unwrap_or(u32::MAX),
            _ => DEFAULT_POOL_SIZE,
        }
    }
}

fn integral(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// Effective pool size for an optional setting
pub fn effective_pool_size(limit: Option<&PoolLimit>) -> u32 {
    limit.map(PoolLimit::effective).unwrap_or(DEFAULT_POOL_SIZE)
}

// Default value functions
fn default_source_port() -> u16 {
    3306
}

fn default_target_port() -> u16 {
    5432
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_encoding() -> String {
    "utf8".to_string()
}

fn default_extra_config() -> PathBuf {
    PathBuf::from("extra_config.json")
}

fn default_logs_dir() -> PathBuf {
    PathBuf::from("logs_directory")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl SourceConfig {
    /// Connection timeout as Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl TargetConfig {
    /// Connection timeout as Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl BridgeConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: BridgeConfig =
            toml::from_str(&content).map_err(|e| Error::ConfigParse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: BridgeConfig = toml::from_str(content).map_err(|e| Error::ConfigParse {
            path: PathBuf::from("<inline>"),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.source.host.is_empty() {
            return Err(Error::Config("source.host cannot be empty".into()));
        }

        if self.source.user.is_empty() {
            return Err(Error::Config("source.user cannot be empty".into()));
        }

        if self.source.database.is_empty() {
            return Err(Error::Config("source.database cannot be empty".into()));
        }

        if self.target.host.is_empty() {
            return Err(Error::Config("target.host cannot be empty".into()));
        }

        if self.target.user.is_empty() {
            return Err(Error::Config("target.user cannot be empty".into()));
        }

        if self.target.database.is_empty() {
            return Err(Error::Config("target.database cannot be empty".into()));
        }

        Ok(())
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Get the logs directory path
    pub fn logs_dir(&self) -> PathBuf {
        self.resolve(&self.logs_dir)
    }

    /// Get the extra-config document path
    pub fn extra_config_path(&self) -> PathBuf {
        self.resolve(&self.extra_config)
    }

    /// Get the target schema, falling back to "public"
    pub fn schema(&self) -> &str {
        match self.schema.as_deref() {
            Some(s) if !s.is_empty() => s,
            _ => "public",
        }
    }

    /// Effective source pool size
    pub fn max_pool_size_source(&self) -> u32 {
        effective_pool_size(self.max_pool_size_source.as_ref())
    }

    /// Effective target pool size
    pub fn max_pool_size_target(&self) -> u32 {
        effective_pool_size(self.max_pool_size_target.as_ref())
    }

    /// Load the extra-config mapping document when enabled
    pub fn load_extra_config(&self) -> Result<Option<MappingDocument>> {
        if !self.enable_extra_config {
            return Ok(None);
        }

        let path = self.extra_config_path();
        let content = std::fs::read_to_string(&path).map_err(|source| Error::ConfigRead {
            path: path.clone(),
            source,
        })?;
        let document = serde_json::from_str(&content).map_err(|e| Error::ConfigParse {
            path,
            reason: e.to_string(),
        })?;
        Ok(Some(document))
    }
}
