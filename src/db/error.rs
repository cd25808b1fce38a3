use std::os::raw::c_int;

use rusqlite::ffi;
use thiserror::Error;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: i64 },

    /// A unique constraint rejected the write.
    #[error("{0}")]
    Conflict(String),

    /// A foreign key still points at the row being deleted.
    #[error("{0}")]
    InUse(String),

    /// The payload references a row that does not exist.
    #[error("{0}")]
    InvalidReference(String),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to prepare database directory: {0}")]
    Io(#[from] std::io::Error),
}

impl DbError {
    pub fn not_found(resource: &'static str, id: i64) -> Self {
        DbError::NotFound { resource, id }
    }
}

fn extended_code(e: &rusqlite::Error) -> Option<c_int> {
    match e {
        rusqlite::Error::SqliteFailure(err, _) => Some(err.extended_code),
        _ => None,
    }
}

/// Turn a unique-constraint failure into `Conflict`; anything else stays a database error.
pub(crate) fn unique_violation(e: rusqlite::Error, message: impl Into<String>) -> DbError {
    match extended_code(&e) {
        Some(ffi::SQLITE_CONSTRAINT_UNIQUE) | Some(ffi::SQLITE_CONSTRAINT_PRIMARYKEY) => {
            DbError::Conflict(message.into())
        }
        _ => DbError::Sqlite(e),
    }
}

/// Turn a foreign-key failure on delete into `InUse`.
pub(crate) fn still_referenced(e: rusqlite::Error, message: impl Into<String>) -> DbError {
    match extended_code(&e) {
        Some(ffi::SQLITE_CONSTRAINT_FOREIGNKEY) | Some(ffi::SQLITE_CONSTRAINT_TRIGGER) => {
            DbError::InUse(message.into())
        }
        _ => DbError::Sqlite(e),
    }
}
