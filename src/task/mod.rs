// src/task/mod.rs
//! The workload task: one dedicated, named thread running [`runner::run`].

pub mod clock;
pub mod runner;

use crate::bootlog_log;
use crate::config::Config;
use crate::db::DbError;
use crate::fs::{FsError, VolumeService};
use log::Level;
use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use thiserror::Error;

pub use clock::{Clock, ManualClock, SystemClock};
pub use runner::{run, RunSummary};

#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Fs(#[from] FsError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("Failed to delete old database {path:?}: {source}")]
    RemoveDatabase {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create task '{name}': {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Start the workload on its own thread. The thread owns `config`,
/// `volume` and `clock`; nothing is shared with the caller.
pub fn spawn_workload<V, C>(
    config: Config,
    volume: V,
    clock: C,
) -> Result<JoinHandle<Result<RunSummary, TaskError>>, TaskError>
where
    V: VolumeService + Send + 'static,
    C: Clock + Send + 'static,
{
    let name = config.task.name.clone();
    let handle = thread::Builder::new()
        .name(name.clone())
        .stack_size(config.task.stack_size)
        .spawn(move || {
            let outcome = run(&config, &volume, &clock);
            if let Err(e) = &outcome {
                bootlog_log!(Level::Error, "task", "[Error] task stopped: {}", e);
            }
            outcome
        })
        .map_err(|source| TaskError::Spawn { name: name.clone(), source })?;
    bootlog_log!(Level::Info, "task", "'{}' is created.", name);
    Ok(handle)
}
