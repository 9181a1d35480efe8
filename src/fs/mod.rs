// src/fs/mod.rs
//! Flash-volume service: mounting, usage reporting and unmounting.

pub mod volume;

use crate::bootlog_log;
use crate::config::StorageConfig;
use log::Level;
use std::path::PathBuf;
use thiserror::Error;

pub use volume::{DirVolume, PartitionTable};

#[derive(Debug, Error)]
pub enum FsError {
    #[error("Failed to mount or format filesystem at {path:?}: {reason}")]
    MountFailed { path: PathBuf, reason: String },

    #[error("Failed to find FS partition '{0}'")]
    PartitionNotFound(String),

    #[error("partition '{0}' is {1}")]
    InvalidState(String, &'static str),

    #[error("Failed to initialize FS ({0})")]
    Io(#[from] std::io::Error),
}

/// Capacity figures for one partition, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeUsage {
    pub total: u64,
    pub used:  u64,
}

/// The filesystem collaborator. Implementations keep their own record of
/// which partitions are registered.
pub trait VolumeService {
    /// Register the partition named in `cfg` and, unless `dont_mount` is
    /// set, mount it at `cfg.mount_point`.
    fn mount(&self, cfg: &StorageConfig) -> Result<(), FsError>;

    fn unmount(&self, label: &str) -> Result<(), FsError>;

    fn info(&self, label: &str) -> Result<VolumeUsage, FsError>;
}

/// A registered partition. Dropping the guard unmounts it.
pub struct MountGuard<'a, V: VolumeService + ?Sized> {
    volume: &'a V,
    label:  String,
}

impl<'a, V: VolumeService + ?Sized> MountGuard<'a, V> {
    pub fn mount(volume: &'a V, cfg: &StorageConfig) -> Result<Self, FsError> {
        bootlog_log!(Level::Info, "fs", "Initializing FS");
        volume.mount(cfg)?;
        bootlog_log!(Level::Info, "fs", "Initializing FS is done!");
        Ok(Self { volume, label: cfg.partition_label.clone() })
    }

    /// Query and log the partition usage. Failure is only logged.
    pub fn report_usage(&self) -> Option<VolumeUsage> {
        match self.volume.info(&self.label) {
            Ok(usage) => {
                bootlog_log!(
                    Level::Info,
                    "fs",
                    "Partition size: total: {}, used: {}",
                    usage.total,
                    usage.used
                );
                Some(usage)
            }
            Err(e) => {
                bootlog_log!(
                    Level::Error,
                    "fs",
                    "[Error] Failed to get FS partition information ({})",
                    e
                );
                None
            }
        }
    }
}

impl<V: VolumeService + ?Sized> Drop for MountGuard<'_, V> {
    fn drop(&mut self) {
        match self.volume.unmount(&self.label) {
            Ok(()) => bootlog_log!(Level::Info, "fs", "FS unmounted"),
            Err(e) => bootlog_log!(Level::Error, "fs", "[Error] Failed to unmount FS ({})", e),
        }
    }
}
