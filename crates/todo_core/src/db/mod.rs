//! SQLite bootstrap for the full-text index backend.
//!
//! # Responsibility
//! - Open and configure SQLite connections that host search indexes.
//!
//! # Invariants
//! - Returned connections carry a busy timeout so index calls never block
//!   indefinitely on a locked database file.
//! - The authoritative todo collection never lives here.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod open;

pub use open::{open_index_db, open_index_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// Linked SQLite library was built without FTS5.
    Fts5Unavailable,
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Fts5Unavailable => write!(f, "sqlite build does not provide fts5"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Fts5Unavailable => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
