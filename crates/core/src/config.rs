// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock configuration
//!
//! ```toml
//! retry_limit = 10
//! shared_reads = true
//! default_timeout = "5s"
//! ```

use crate::naming::MAX_RETRY_COUNT;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors loading a lock configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),
    #[error("retry_limit must be at least 1")]
    ZeroRetryLimit,
}

/// Settings shared by every lock built from one client
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LockConfig {
    /// Attempts at registering a contention node before giving up
    pub retry_limit: u32,
    /// Whether readers share the lock with each other
    pub shared_reads: bool,
    /// Wait bound handed to every lock built from this config, used when a
    /// caller acquires without naming its own (`lock_default`)
    #[serde(with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub default_timeout: Option<Duration>,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            retry_limit: MAX_RETRY_COUNT,
            shared_reads: true,
            default_timeout: None,
        }
    }
}

impl LockConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retry_limit(mut self, limit: u32) -> Self {
        self.retry_limit = limit;
        self
    }

    pub fn with_shared_reads(mut self, shared: bool) -> Self {
        self.shared_reads = shared;
        self
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), ?config, "loaded lock config");
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry_limit == 0 {
            return Err(ConfigError::ZeroRetryLimit);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
