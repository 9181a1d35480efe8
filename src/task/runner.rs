// src/task/runner.rs

//! Boot workload: mount, open, bump the boot counter, then log forever.
//!
//! Resources are released through scopes rather than a shared cleanup
//! label: the database is closed before the `MountGuard` drops, on every
//! exit path.

use super::{Clock, TaskError};
use crate::bootlog_log;
use crate::config::Config;
use crate::db::Database;
use crate::fs::{MountGuard, VolumeService};
use log::Level;
use std::{fs, io::ErrorKind, path::Path, time::Duration};

/// What a bounded run did. Only produced when `max_iterations` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub boot_count: i64,
    pub iterations: u64,
    /// How many periodic row-count reports fired.
    pub reports: u64,
    /// Row count printed by the most recent report.
    pub last_reported: Option<i64>,
}

/// Run the whole workload on the calling thread.
pub fn run<V, C>(config: &Config, volume: &V, clock: &C) -> Result<RunSummary, TaskError>
where
    V: VolumeService + ?Sized,
    C: Clock + ?Sized,
{
    let mount = MountGuard::mount(volume, &config.storage).inspect_err(|e| {
        bootlog_log!(Level::Error, "task", "[Error] {}", e);
    })?;
    mount.report_usage();

    let db_path = config.db_path();
    if config.workload.fresh_start {
        remove_old_database(&db_path)?;
    }

    let db = Database::open(&db_path, config.workload.trace).inspect_err(|_| {
        bootlog_log!(
            Level::Error,
            "task",
            "Failed to open {}. exiting task.",
            db_path.display()
        );
    })?;

    let outcome = boot_and_log(&db, config, clock);
    let closed = db.close();
    match (outcome, closed) {
        (Ok(summary), Ok(())) => Ok(summary),
        (Ok(_), Err(e)) => Err(e.into()),
        (Err(e), closed) => {
            if let Err(close_err) = closed {
                bootlog_log!(Level::Error, "task", "[Error] {}", close_err);
            }
            Err(e)
        }
    }
}

fn remove_old_database(path: &Path) -> Result<(), TaskError> {
    bootlog_log!(Level::Info, "task", "deleting old databases.");
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(TaskError::RemoveDatabase { path: path.to_path_buf(), source }),
    }
}

fn boot_and_log<C: Clock + ?Sized>(
    db: &Database,
    config: &Config,
    clock: &C,
) -> Result<RunSummary, TaskError> {
    db.ensure_schema().inspect_err(|_| {
        bootlog_log!(Level::Error, "task", "Failed to create table. exiting task.");
    })?;

    let mut summary = RunSummary {
        boot_count:    db.update_boot_count()?,
        iterations:    0,
        reports:       0,
        last_reported: None,
    };

    let workload = &config.workload;
    let mut last_report = Duration::ZERO;
    let mut counter: u64 = 0;

    loop {
        if workload.max_iterations.is_some_and(|max| summary.iterations >= max) {
            return Ok(summary);
        }

        bootlog_log!(Level::Info, "task", "------------------------------------------------");
        let stamp = i64::try_from(clock.now().as_micros()).unwrap_or(i64::MAX);
        db.append_log(stamp, counter)?;
        counter += 1;
        summary.iterations += 1;

        let now = clock.now();
        if now.saturating_sub(last_report) > workload.report_interval {
            last_report = now;
            let logs = db.log_count()?;
            bootlog_log!(Level::Info, "task", "++++++++++++++++++++++++++++++++++++++++++++++++");
            bootlog_log!(Level::Info, "task", "Number of recorded logs: {}", logs);
            bootlog_log!(Level::Info, "task", "++++++++++++++++++++++++++++++++++++++++++++++++");
            summary.reports += 1;
            summary.last_reported = Some(logs);
        }

        clock.delay(workload.log_interval);
    }
}
