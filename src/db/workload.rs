// src/db/workload.rs
//! Schema and statements for the boot counter and the append-only log.

use super::{Database, DbError};
use crate::bootlog_log;
use log::Level;
use rusqlite::params;

pub const CREATE_INFO: &str = "CREATE TABLE IF NOT EXISTS info (boot_cnt INTEGER);";
pub const CREATE_LOG: &str = "CREATE TABLE IF NOT EXISTS log (time INTEGER, log TEXT);";
pub const COUNT_INFO: &str = "SELECT count(*) FROM info;";
pub const INSERT_INFO: &str = "INSERT INTO info VALUES (0);";
pub const SELECT_BOOT_CNT: &str = "SELECT boot_cnt FROM info;";
pub const UPDATE_BOOT_CNT: &str = "UPDATE info SET boot_cnt = ?1;";
pub const INSERT_LOG: &str = "INSERT INTO log VALUES (?1, ?2);";
pub const COUNT_LOG: &str = "SELECT COUNT(*) FROM log;";

impl Database {
    /// Create `info` and `log` unless they already exist.
    pub fn ensure_schema(&self) -> Result<(), DbError> {
        self.execute(CREATE_INFO, [])?;
        self.execute(CREATE_LOG, [])?;
        Ok(())
    }

    /// Bump the persisted boot counter and return the new value.
    pub fn update_boot_count(&self) -> Result<i64, DbError> {
        let previous = if self.query_i64(COUNT_INFO, [])? == 0 {
            bootlog_log!(Level::Info, "db", "Insert `boot_cnt = 0` into table `info`.");
            self.execute(INSERT_INFO, [])?;
            0
        } else {
            bootlog_log!(Level::Info, "db", "Get last `boot_cnt` from table `info`.");
            self.query_i64(SELECT_BOOT_CNT, [])?
        };

        let boot_count = previous + 1;
        bootlog_log!(Level::Info, "db", "----------------------------------------");
        bootlog_log!(Level::Info, "db", "boot count = {}", boot_count);
        bootlog_log!(Level::Info, "db", "----------------------------------------");

        self.execute(UPDATE_BOOT_CNT, [boot_count])?;
        Ok(boot_count)
    }

    /// Current boot counter, `None` before the first boot was recorded.
    pub fn boot_count(&self) -> Result<Option<i64>, DbError> {
        self.query_opt_i64(SELECT_BOOT_CNT, [])
    }

    /// Append one `counter = N` row stamped with `time_us`.
    pub fn append_log(&self, time_us: i64, counter: u64) -> Result<(), DbError> {
        self.execute(INSERT_LOG, params![time_us, format!("counter = {counter}")])?;
        Ok(())
    }

    pub fn log_count(&self) -> Result<i64, DbError> {
        self.query_i64(COUNT_LOG, [])
    }
}
