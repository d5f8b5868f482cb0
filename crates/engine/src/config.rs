//! Store configuration via `sidx.toml`
//!
//! On first open a default `sidx.toml` is written next to the caller's
//! data. To change settings, edit the file and restart.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sidx_core::{Error, Result};
use tracing::info;

use crate::retry::RetryConfig;

/// Config file name
pub const CONFIG_FILE_NAME: &str = "sidx.toml";

/// Query defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Page size used by `search` when the caller does not pass one
    pub page_size: i64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self { page_size: 5 }
    }
}

/// Batch ingestion settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Worker threads running puts
    pub workers: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self { workers: 4 }
    }
}

/// Store configuration loaded from `sidx.toml`.
///
/// # Example
///
/// ```toml
/// [retry]
/// max_attempts = 10
///
/// [query]
/// page_size = 5
///
/// [ingest]
/// workers = 4
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SidxConfig {
    /// Conflict retry policy for `put`
    pub retry: RetryConfig,
    /// Query defaults
    pub query: QueryConfig,
    /// Ingestion pool
    pub ingest: IngestConfig,
}

impl SidxConfig {
    /// Reject values the store cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            return Err(Error::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(Error::Config(format!(
                "retry.base_delay_ms ({}) exceeds retry.max_delay_ms ({})",
                self.retry.base_delay_ms, self.retry.max_delay_ms
            )));
        }
        if self.query.page_size < 0 {
            return Err(Error::Config("query.page_size must not be negative".to_string()));
        }
        if self.ingest.workers == 0 {
            return Err(Error::Config("ingest.workers must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# sidx store configuration

[retry]
# Attempts per put before giving up on a contended key (first try counts)
max_attempts = 10
# Exponential backoff between attempts, in milliseconds
base_delay_ms = 0
max_delay_ms = 50

[query]
# Records per page for multi-valued lookups
page_size = 5

[ingest]
# Worker threads used for batch ingestion
workers = 4
"#
    }

    /// Read, parse and validate config from a file path.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: SidxConfig = toml::from_str(&content).map_err(|e| {
            Error::Config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                Error::Config(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
            info!(target: "sidx::config", path = %path.display(), "Wrote default config");
        }
        Ok(())
    }

    /// Load `sidx.toml` from `dir`, creating it with defaults first if needed.
    pub fn load_or_init(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        Self::write_default_if_missing(&path)?;
        Self::from_file(&path)
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            Error::Config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
