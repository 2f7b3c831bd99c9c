// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shutdown configuration
//!
//! Durations are written in humantime form (`"1s"`, `"500ms"`).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// How long to wait for active work to drain
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrainConfig {
    /// Sleep before the first idle check, letting routing changes propagate
    #[serde(with = "humantime_serde")]
    pub initial_delay: Duration,
    /// Pause between idle checks
    #[serde(with = "humantime_serde")]
    pub pause_interval: Duration,
    /// Checks allowed before shutting down anyway
    pub max_pauses: u32,
}

impl Default for DrainConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(1000),
            pause_interval: Duration::from_millis(500),
            max_pauses: 40,
        }
    }
}

impl DrainConfig {
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_pause_interval(mut self, interval: Duration) -> Self {
        self.pause_interval = interval;
        self
    }

    pub fn with_max_pauses(mut self, max_pauses: u32) -> Self {
        self.max_pauses = max_pauses;
        self
    }

    /// Upper bound on a single idle wait
    pub fn max_wait(&self) -> Duration {
        self.initial_delay + self.pause_interval * self.max_pauses.max(1)
    }
}

/// Top-level configuration for a process using the shutdown delay
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Delay before exit hooks are intercepted
    #[serde(with = "humantime_serde")]
    pub register_delay: Duration,
    pub drain: DrainConfig,
    /// Optional log file; logs go to stderr when unset
    pub log_path: Option<PathBuf>,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            register_delay: Duration::from_secs(2),
            drain: DrainConfig::default(),
            log_path: None,
        }
    }
}

impl ShutdownConfig {
    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        Self::from_toml(&content)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
