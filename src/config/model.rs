// src/config/model.rs

use serde::Deserialize;
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;

/// Top-level runtime config
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub logging:  LoggingConfig,
    pub storage:  StorageConfig,
    pub workload: WorkloadConfig,
    pub task:     TaskConfig,
}

impl Config {
    /// Database file location on the mounted volume.
    pub fn db_path(&self) -> PathBuf {
        self.storage.mount_point.join(&self.workload.db_file)
    }

    /// Resolve a relative mount point against `base` (the executable's
    /// directory), never against the process working directory.
    pub fn anchor_paths(&mut self, base: &Path) {
        if self.storage.mount_point.is_relative() {
            self.storage.mount_point = base.join(&self.storage.mount_point);
        }
    }
}

/// Mirror of the whole TOML file. Every table may be omitted.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub logging:  LoggingConfig,
    pub storage:  StorageConfig,
    pub workload: WorkloadStub,
    pub task:     TaskConfig,
}

/// Mirror of the `[logging]` table
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]            pub enable: bool,
    #[serde(default)]            pub file:   Option<String>,
    #[serde(default = "default_level")] pub level: String,
}
fn default_level() -> String { "INFO".into() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { enable: false, file: None, level: default_level() }
    }
}

/// Mirror of the `[storage]` table: how the volume is mounted and which
/// partitions exist.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub mount_point:            PathBuf,
    pub partition_label:        String,
    pub format_if_mount_failed: bool,
    pub dont_mount:             bool,
    pub partitions:             Vec<PartitionConfig>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            mount_point:            PathBuf::from("/storage"),
            partition_label:        "storage".into(),
            format_if_mount_failed: true,
            dont_mount:             false,
            partitions:             vec![PartitionConfig::default()],
        }
    }
}

/// One `[[storage.partitions]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct PartitionConfig {
    pub label:      String,
    pub size_bytes: u64,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self { label: "storage".into(), size_bytes: 1024 * 1024 }
    }
}

/// Raw `[workload]` table; durations are humantime strings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WorkloadStub {
    pub db_file:         String,
    pub fresh_start:     bool,
    pub trace:           bool,
    pub log_interval:    String,
    pub report_interval: String,
    pub max_iterations:  Option<u64>,
}

impl Default for WorkloadStub {
    fn default() -> Self {
        Self {
            db_file:         "test.db".into(),
            fresh_start:     false,
            trace:           true,
            log_interval:    "10s".into(),
            report_interval: "60s".into(),
            max_iterations:  None,
        }
    }
}

/// Fully-typed workload settings
#[derive(Debug, Clone)]
pub struct WorkloadConfig {
    pub db_file:         String,
    /// Remove the database file before opening it.
    pub fresh_start:     bool,
    /// Echo every statement and its duration at DEBUG.
    pub trace:           bool,
    pub log_interval:    Duration,
    pub report_interval: Duration,
    /// `None` runs the logging loop forever.
    pub max_iterations:  Option<u64>,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            db_file:         "test.db".into(),
            fresh_start:     false,
            trace:           true,
            log_interval:    Duration::from_secs(10),
            report_interval: Duration::from_secs(60),
            max_iterations:  None,
        }
    }
}

impl TryFrom<WorkloadStub> for WorkloadConfig {
    type Error = ConfigError;

    fn try_from(stub: WorkloadStub) -> Result<Self, Self::Error> {
        Ok(Self {
            log_interval:    parse_duration(&stub.log_interval)?,
            report_interval: parse_duration(&stub.report_interval)?,
            db_file:         stub.db_file,
            fresh_start:     stub.fresh_start,
            trace:           stub.trace,
            max_iterations:  stub.max_iterations,
        })
    }
}

fn parse_duration(raw: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(raw).map_err(|e| ConfigError::InvalidDuration(raw.into(), e))
}

/// Mirror of the `[task]` table
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    pub name:       String,
    pub stack_size: usize,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self { name: "sqlite demo".into(), stack_size: 256 * 1024 }
    }
}

/// All the ways config loading can go wrong
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid duration '{0}': {1}")]
    InvalidDuration(String, #[source] humantime::DurationError),

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ConfigError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        ConfigError::Io { path: path.to_path_buf(), source }
    }
}
