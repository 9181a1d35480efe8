// src/config/loader.rs

//! # Configuration Loader
//!
//! Reads `default.toml`, deserializes it into `ConfigFile`, and converts the
//! raw workload table into a runtime `Config`.

use crate::bootlog_log;
use crate::config::model::{Config, ConfigError, ConfigFile};
use log::Level;
use std::{fs, path::Path};

/// Parse configuration text. Missing tables fall back to their defaults.
pub fn parse(txt: &str) -> Result<Config, ConfigError> {
    let file: ConfigFile = toml::from_str(txt)?;
    Ok(Config {
        logging:  file.logging,
        storage:  file.storage,
        workload: file.workload.try_into()?,
        task:     file.task,
    })
}

/// Load and parse the configuration from `path`.
/// Logs at DEBUG before reading and INFO on success.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    bootlog_log!(Level::Debug, "config", "Reading config from {:?}", path);
    let txt = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
    let cfg = parse(&txt)?;
    bootlog_log!(Level::Info, "config", "Loaded config from {:?}", path);
    Ok(cfg)
}

/// Like [`load`], but a missing file yields the built-in defaults.
pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        bootlog_log!(Level::Warn, "config", "{:?} not found, using defaults", path);
        return Ok(Config::default());
    }
    load(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{path::PathBuf, time::Duration};

    #[test]
    fn empty_file_yields_defaults() {
        let cfg = parse("").unwrap();
        assert_eq!(cfg.storage.mount_point, PathBuf::from("/storage"));
        assert_eq!(cfg.storage.partition_label, "storage");
        assert!(cfg.storage.format_if_mount_failed);
        assert!(!cfg.storage.dont_mount);
        assert_eq!(cfg.workload.log_interval, Duration::from_secs(10));
        assert_eq!(cfg.workload.report_interval, Duration::from_secs(60));
        assert_eq!(cfg.workload.max_iterations, None);
        assert_eq!(cfg.task.name, "sqlite demo");
        assert_eq!(cfg.db_path(), PathBuf::from("/storage/test.db"));
    }

    #[test]
    fn tables_override_defaults() {
        let cfg = parse(
            r#"
            [storage]
            mount_point = "/data"
            partition_label = "flash"
            format_if_mount_failed = false

            [[storage.partitions]]
            label = "flash"
            size_bytes = 4096

            [workload]
            db_file = "boot.db"
            log_interval = "250ms"
            report_interval = "1m"
            max_iterations = 3
            "#,
        )
        .unwrap();

        assert_eq!(cfg.storage.partitions.len(), 1);
        assert_eq!(cfg.storage.partitions[0].size_bytes, 4096);
        assert!(!cfg.storage.format_if_mount_failed);
        assert_eq!(cfg.workload.log_interval, Duration::from_millis(250));
        assert_eq!(cfg.workload.report_interval, Duration::from_secs(60));
        assert_eq!(cfg.workload.max_iterations, Some(3));
        assert_eq!(cfg.db_path(), PathBuf::from("/data/boot.db"));
    }

    #[test]
    fn bad_duration_is_rejected() {
        let err = parse("[workload]\nlog_interval = \"soon\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDuration(ref raw, _) if raw == "soon"));
    }

    #[test]
    fn relative_mount_point_is_anchored_to_base() {
        let mut cfg = parse("[storage]\nmount_point = \"./storage\"\n").unwrap();
        cfg.anchor_paths(Path::new("/opt/bootlog"));
        assert_eq!(cfg.storage.mount_point, PathBuf::from("/opt/bootlog/./storage"));
        assert_eq!(cfg.db_path(), PathBuf::from("/opt/bootlog/./storage/test.db"));
        assert!(cfg.storage.mount_point.starts_with("/opt/bootlog"));
    }

    #[test]
    fn absolute_mount_point_is_kept() {
        let mut cfg = parse("[storage]\nmount_point = \"/data/flash\"\n").unwrap();
        cfg.anchor_paths(Path::new("/opt/bootlog"));
        assert_eq!(cfg.storage.mount_point, PathBuf::from("/data/flash"));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = load_or_default(Path::new("/definitely/not/here/default.toml")).unwrap();
        assert_eq!(cfg.workload.db_file, "test.db");
    }
}
