// src/db/mod.rs
//! Public façade for DB helpers (re-exports plus the error type).

pub mod connection;
pub mod workload;

use std::path::PathBuf;
use thiserror::Error;

pub use connection::Database;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Can't open database {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("SQL failed `{sql}`: {source}")]
    Sql {
        sql: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Failed to close database: {0}")]
    Close(#[source] rusqlite::Error),
}
