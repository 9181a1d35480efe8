// src/fs/volume.rs

//! Directory-backed volumes.
//!
//! Each partition in the table is backed by a host directory that becomes
//! the mount point. A formatted volume carries a `.volume` marker naming its
//! partition; a directory without a matching marker is treated as an
//! unformatted or foreign filesystem and refuses to mount unless formatting
//! is allowed.

use super::{FsError, VolumeService, VolumeUsage};
use crate::bootlog_log;
use crate::config::{PartitionConfig, StorageConfig};
use log::Level;
use std::{
    collections::HashMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Mutex,
};

pub const VOLUME_MARKER: &str = ".volume";

/// Known partitions, keyed by label.
#[derive(Debug, Clone, Default)]
pub struct PartitionTable {
    partitions: HashMap<String, u64>,
}

impl PartitionTable {
    pub fn new(entries: &[PartitionConfig]) -> Self {
        let partitions = entries
            .iter()
            .map(|p| (p.label.clone(), p.size_bytes))
            .collect();
        Self { partitions }
    }

    /// Partition size in bytes, if the label exists.
    pub fn size_of(&self, label: &str) -> Option<u64> {
        self.partitions.get(label).copied()
    }
}

#[derive(Debug)]
struct Registration {
    base_path: PathBuf,
    mounted:   bool,
}

/// [`VolumeService`] over host directories.
#[derive(Debug)]
pub struct DirVolume {
    table:      PartitionTable,
    registered: Mutex<HashMap<String, Registration>>,
}

impl DirVolume {
    pub fn new(table: PartitionTable) -> Self {
        Self { table, registered: Mutex::new(HashMap::new()) }
    }

    pub fn from_config(cfg: &StorageConfig) -> Self {
        Self::new(PartitionTable::new(&cfg.partitions))
    }

    pub fn is_mounted(&self, label: &str) -> bool {
        self.registered
            .lock()
            .map(|r| r.get(label).is_some_and(|reg| reg.mounted))
            .unwrap_or(false)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Registration>>, FsError> {
        self.registered
            .lock()
            .map_err(|_| FsError::InvalidState("<all>".into(), "unavailable (lock poisoned)"))
    }
}

/// Check the marker at `mount_point`. `Some` carries the reason the volume
/// needs formatting; other read failures are passed through untouched.
fn check_marker(mount_point: &Path, label: &str) -> std::io::Result<Option<String>> {
    match fs::read_to_string(mount_point.join(VOLUME_MARKER)) {
        Ok(found) if found.trim() == label => Ok(None),
        Ok(found) => Ok(Some(format!("volume belongs to partition '{}'", found.trim()))),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Some("no filesystem found".into())),
        Err(e) => Err(e),
    }
}

/// Wipe `mount_point` and stamp a fresh marker for `label`.
fn format(mount_point: &Path, label: &str) -> std::io::Result<()> {
    match fs::remove_dir_all(mount_point) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    fs::create_dir_all(mount_point)?;
    fs::write(mount_point.join(VOLUME_MARKER), label)
}

/// Sum of regular file sizes below `dir`, marker excluded.
fn used_bytes(dir: &Path) -> std::io::Result<u64> {
    let mut total = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let meta = entry.metadata()?;
        if meta.is_dir() {
            total += used_bytes(&entry.path())?;
        } else if meta.is_file() && entry.file_name() != VOLUME_MARKER {
            total += meta.len();
        }
    }
    Ok(total)
}

impl VolumeService for DirVolume {
    fn mount(&self, cfg: &StorageConfig) -> Result<(), FsError> {
        let label = cfg.partition_label.as_str();
        if self.table.size_of(label).is_none() {
            return Err(FsError::PartitionNotFound(label.into()));
        }

        let mut registered = self.lock()?;
        if registered.contains_key(label) {
            return Err(FsError::InvalidState(label.into(), "already registered"));
        }

        let base_path = cfg.mount_point.clone();
        if cfg.dont_mount {
            bootlog_log!(Level::Debug, "fs", "Registered '{}' without mounting", label);
            registered.insert(label.into(), Registration { base_path, mounted: false });
            return Ok(());
        }

        if let Some(reason) = check_marker(&base_path, label)? {
            if !cfg.format_if_mount_failed {
                return Err(FsError::MountFailed { path: base_path, reason });
            }
            bootlog_log!(
                Level::Warn,
                "fs",
                "Mounting '{}' failed ({}), formatting {:?}",
                label,
                reason,
                base_path
            );
            format(&base_path, label).map_err(|e| FsError::MountFailed {
                path:   base_path.clone(),
                reason: format!("format failed: {e}"),
            })?;
        }

        bootlog_log!(Level::Debug, "fs", "Mounted '{}' at {:?}", label, base_path);
        registered.insert(label.into(), Registration { base_path, mounted: true });
        Ok(())
    }

    fn unmount(&self, label: &str) -> Result<(), FsError> {
        self.lock()?
            .remove(label)
            .map(|_| ())
            .ok_or_else(|| FsError::InvalidState(label.into(), "not registered"))
    }

    fn info(&self, label: &str) -> Result<VolumeUsage, FsError> {
        let total = self
            .table
            .size_of(label)
            .ok_or_else(|| FsError::PartitionNotFound(label.into()))?;
        let base_path = {
            let registered = self.lock()?;
            match registered.get(label) {
                Some(reg) if reg.mounted => reg.base_path.clone(),
                Some(_) => return Err(FsError::InvalidState(label.into(), "not mounted")),
                None => return Err(FsError::InvalidState(label.into(), "not registered")),
            }
        };
        Ok(VolumeUsage { total, used: used_bytes(&base_path)? })
    }
}
