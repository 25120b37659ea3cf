//! Error types for the persistence layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session file io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("session file is malformed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("{0} lock poisoned")]
    Poisoned(&'static str),
}
