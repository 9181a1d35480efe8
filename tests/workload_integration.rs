// tests/workload_integration.rs

use std::path::Path;
use rusqlite::Connection;
use tempfile::TempDir;

use bootlog::{
    config::{parse, Config},
    fs::{DirVolume, FsError, VolumeService},
    task::{run, spawn_workload, ManualClock, RunSummary, TaskError},
};

/// Config with the volume mounted under `root/storage` and a bounded loop.
fn make_config(root: &Path, iterations: u64) -> Config {
    let mut cfg = parse(
        r#"
        [storage]
        partition_label = "storage"
        format_if_mount_failed = true

        [[storage.partitions]]
        label = "storage"
        size_bytes = 1048576

        [workload]
        trace = false
        log_interval = "10s"
        report_interval = "60s"
        "#,
    )
    .expect("test config parses");
    cfg.storage.mount_point = root.join("storage");
    cfg.workload.max_iterations = Some(iterations);
    cfg
}

/// One simulated power cycle: fresh volume service and clock, same flash.
fn boot(cfg: &Config) -> Result<RunSummary, TaskError> {
    let handle = spawn_workload(cfg.clone(), DirVolume::from_config(&cfg.storage), ManualClock::new())
        .expect("task spawns");
    handle.join().expect("task does not panic")
}

fn read_i64(db: &Path, sql: &str) -> i64 {
    Connection::open(db)
        .unwrap()
        .query_row(sql, [], |r| r.get(0))
        .unwrap()
}

#[test]
fn boot_counter_tracks_power_cycles() {
    let root = TempDir::new().unwrap();
    let cfg = make_config(root.path(), 1);

    for n in 1..=3 {
        let summary = boot(&cfg).unwrap();
        assert_eq!(summary.boot_count, n);
    }

    let db = cfg.db_path();
    assert_eq!(read_i64(&db, "SELECT boot_cnt FROM info"), 3);
    assert_eq!(read_i64(&db, "SELECT count(*) FROM info"), 1);
}

#[test]
fn log_rows_accumulate_across_boots() {
    let root = TempDir::new().unwrap();
    boot(&make_config(root.path(), 4)).unwrap();
    boot(&make_config(root.path(), 5)).unwrap();

    let db = make_config(root.path(), 0).db_path();
    assert_eq!(read_i64(&db, "SELECT COUNT(*) FROM log"), 9);
    // counter restarts at 0 on each boot
    assert_eq!(read_i64(&db, "SELECT COUNT(*) FROM log WHERE log = 'counter = 0'"), 2);
    assert_eq!(read_i64(&db, "SELECT MAX(time) FROM log"), 40_000_000);
}

#[test]
fn fresh_start_discards_previous_database() {
    let root = TempDir::new().unwrap();
    let mut cfg = make_config(root.path(), 2);
    boot(&cfg).unwrap();
    boot(&cfg).unwrap();

    cfg.workload.fresh_start = true;
    let summary = boot(&cfg).unwrap();
    assert_eq!(summary.boot_count, 1);
    assert_eq!(read_i64(&cfg.db_path(), "SELECT COUNT(*) FROM log"), 2);
}

#[test]
fn missing_partition_creates_nothing() {
    let root = TempDir::new().unwrap();
    let mut cfg = make_config(root.path(), 1);
    cfg.storage.partition_label = "spiffs".into();

    let err = boot(&cfg).unwrap_err();
    assert!(matches!(err, TaskError::Fs(FsError::PartitionNotFound(ref l)) if l == "spiffs"));
    assert!(!cfg.db_path().exists());
}

#[test]
fn unformatted_volume_without_format_fails() {
    let root = TempDir::new().unwrap();
    let mut cfg = make_config(root.path(), 1);
    cfg.storage.format_if_mount_failed = false;

    let err = boot(&cfg).unwrap_err();
    assert!(matches!(err, TaskError::Fs(FsError::MountFailed { .. })));
    assert!(!cfg.db_path().exists());
}

#[test]
fn dont_mount_leaves_volume_unusable() {
    let root = TempDir::new().unwrap();
    let mut cfg = make_config(root.path(), 1);
    cfg.storage.dont_mount = true;

    assert!(matches!(boot(&cfg), Err(TaskError::Db(_))));
}

#[test]
fn volume_is_released_after_every_run() {
    let root = TempDir::new().unwrap();
    let cfg = make_config(root.path(), 2);
    let volume = DirVolume::from_config(&cfg.storage);
    let clock = ManualClock::new();

    run(&cfg, &volume, &clock).unwrap();
    assert!(!volume.is_mounted("storage"));

    let usage_before = {
        volume.mount(&cfg.storage).unwrap();
        let usage = volume.info("storage").unwrap();
        volume.unmount("storage").unwrap();
        usage
    };
    assert!(usage_before.used > 0, "database file should occupy space");

    // break the schema so the next run fails mid-way
    Connection::open(cfg.db_path())
        .unwrap()
        .execute_batch("DROP TABLE log; CREATE TABLE log (only_one INTEGER);")
        .unwrap();
    assert!(matches!(run(&cfg, &volume, &clock), Err(TaskError::Db(_))));
    assert!(!volume.is_mounted("storage"));
}
