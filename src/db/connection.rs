// src/db/connection.rs
//! Opening SQLite and running traced statements against it.

use super::DbError;
use crate::bootlog_log;
use log::Level;
use rusqlite::{Connection, OptionalExtension, Params};
use std::{
    path::{Path, PathBuf},
    time::Instant,
};

/// One open database file. Closing is explicit via [`Database::close`];
/// dropping the value closes the connection without reporting errors.
#[derive(Debug)]
pub struct Database {
    conn:  Connection,
    path:  PathBuf,
    trace: bool,
}

impl Database {
    /// Open or create the database at `path`.
    pub fn open(path: &Path, trace: bool) -> Result<Self, DbError> {
        if trace {
            bootlog_log!(Level::Debug, "db", "open {}", path.display());
        }
        let tic = Instant::now();
        let conn = Connection::open(path).map_err(|source| {
            bootlog_log!(Level::Error, "db", "[Error] Can't open database: {}", source);
            DbError::Open { path: path.to_path_buf(), source }
        })?;
        if trace {
            bootlog_log!(Level::Debug, "db", "Time taken: {} us", tic.elapsed().as_micros());
        }
        Ok(Self { conn, path: path.to_path_buf(), trace })
    }

    /// Run `f` against the connection, echoing `sql` and its duration when
    /// tracing is on. Errors are logged with an `[Error]` tag.
    fn traced<T>(
        &self,
        sql: &str,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T, DbError> {
        if self.trace {
            bootlog_log!(Level::Debug, "sqlite", "sqlite> {}", sql);
        }
        let tic = Instant::now();
        let res = f(&self.conn);
        if self.trace {
            bootlog_log!(Level::Debug, "db", "Time taken: {} us", tic.elapsed().as_micros());
        }
        res.map_err(|source| {
            bootlog_log!(Level::Error, "db", "[Error] {}", source);
            DbError::Sql { sql: sql.into(), source }
        })
    }

    /// Execute one statement, returning the number of changed rows.
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> Result<usize, DbError> {
        self.traced(sql, |conn| conn.execute(sql, params))
    }

    /// First column of the first row as an integer.
    pub fn query_i64<P: Params>(&self, sql: &str, params: P) -> Result<i64, DbError> {
        self.traced(sql, |conn| conn.query_row(sql, params, |row| row.get(0)))
    }

    /// Like [`Database::query_i64`] but `None` when there are no rows.
    pub fn query_opt_i64<P: Params>(&self, sql: &str, params: P) -> Result<Option<i64>, DbError> {
        self.traced(sql, |conn| {
            conn.query_row(sql, params, |row| row.get(0)).optional()
        })
    }

    pub fn close(self) -> Result<(), DbError> {
        let path = self.path;
        self.conn.close().map_err(|(_, e)| DbError::Close(e))?;
        bootlog_log!(Level::Debug, "db", "closed {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn open_in_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let err = Database::open(&dir.path().join("nope").join("test.db"), false).unwrap_err();
        assert!(matches!(err, DbError::Open { .. }));
    }

    #[test]
    fn sql_error_keeps_statement() {
        let dir = TempDir::new().unwrap();
        let db = Database::open(&dir.path().join("test.db"), true).unwrap();
        let err = db.execute("INSERT INTO missing VALUES (1)", []).unwrap_err();
        match err {
            DbError::Sql { sql, .. } => assert_eq!(sql, "INSERT INTO missing VALUES (1)"),
            other => panic!("unexpected error: {other}"),
        }
        db.close().unwrap();
    }

    #[test]
    fn query_opt_on_empty_table_is_none() {
        let dir = TempDir::new().unwrap();
        let db = Database::open(&dir.path().join("test.db"), false).unwrap();
        db.execute("CREATE TABLE t (v INTEGER)", []).unwrap();
        assert_eq!(db.query_opt_i64("SELECT v FROM t", []).unwrap(), None);
        db.execute("INSERT INTO t VALUES (?1)", [7]).unwrap();
        assert_eq!(db.query_opt_i64("SELECT v FROM t", []).unwrap(), Some(7));
    }
}
