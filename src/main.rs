// src/main.rs

//! Entry-point for the flash-volume SQLite workload.
//!
//! 1. Load `default.toml` next to the executable (defaults if absent);
//!    a relative mount point is taken relative to that directory too
//! 2. Set up structured logging
//! 3. Spawn the workload task and wait on it; it only returns on error or
//!    after `workload.max_iterations`

// ───── std / 3rd-party imports ──────────────────────────────────────────────
use anyhow::{anyhow, Context, Result};
use chrono::Local;
use fern::Dispatch;
use log::LevelFilter;
use std::{
    path::{Path, PathBuf},
    process, thread,
};

// ───── local imports ────────────────────────────────────────────────────────
use bootlog::config::{load_or_default, Config};
use bootlog::fs::DirVolume;
use bootlog::task::{spawn_workload, SystemClock};

// ───── helpers ──────────────────────────────────────────────────────────────

/// Directory that contains the running executable.
fn exe_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Cannot determine exe path")?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| anyhow!("Executable must live in some directory"))
}

/// Configure global logging as requested in `config.logging`.
fn setup_logging(exe_dir: &Path, config: &Config) -> Result<(), fern::InitError> {
    let level = match config.logging.level.to_uppercase().as_str() {
        "ERROR" => LevelFilter::Error,
        "WARN" => LevelFilter::Warn,
        "DEBUG" => LevelFilter::Debug,
        "TRACE" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    };

    let log_path = config
        .logging
        .enable
        .then(|| exe_dir.join(config.logging.file.as_deref().unwrap_or("bootlog.log")));

    let mut dispatch = Dispatch::new()
        .format(|out, msg, record| {
            out.finish(format_args!(
                "[{}][{:5}][{}][pid={}][tid={:?}] {}",
                Local::now().to_rfc3339(),
                record.level(),
                record.target(),
                process::id(),
                thread::current().id(),
                msg
            ))
        })
        .level(level)
        .chain(std::io::stdout());

    if let Some(path) = log_path {
        dispatch = dispatch.chain(fern::log_file(path)?);
    }

    dispatch.apply()?;
    Ok(())
}

fn main() -> Result<()> {
    // 1 ─ Context
    let exe_dir = exe_dir()?;
    let mut config = load_or_default(&exe_dir.join("default.toml"))?;
    config.anchor_paths(&exe_dir);

    // 2 ─ Logging
    setup_logging(&exe_dir, &config).context("Logging setup failed")?;
    log::info!("Boot workload initiated");

    // 3 ─ Task
    let volume = DirVolume::from_config(&config.storage);
    let handle = spawn_workload(config, volume, SystemClock::new())?;
    let summary = handle
        .join()
        .map_err(|_| anyhow!("workload task panicked"))??;

    log::info!(
        "Workload finished: boot {} after {} iteration(s)",
        summary.boot_count,
        summary.iterations
    );
    Ok(())
}
