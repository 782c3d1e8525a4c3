//! Search index contract.
//!
//! # Responsibility
//! - Define the seam between the authoritative store and a text backend.
//! - Keep typed outcomes (`try_*`) next to the degrading public contract.
//!
//! # Invariants
//! - Provided methods (`ensure_index`, `index`, `remove`, `query`) never fail
//!   and never panic; backend errors are logged.
//! - Writes carrying a revision not newer than the last applied one for the
//!   same id are dropped, never applied.

use crate::db::DbError;
use crate::model::todo::{Todo, TodoId};
use log::{debug, error, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

/// Per-record ordering token handed out by the store for every index write.
pub type Revision = u64;

/// Result type for typed index operations.
pub type IndexResult<T> = Result<T, IndexError>;

/// Index-layer error for provisioning, writes and queries.
#[derive(Debug)]
pub enum IndexError {
    /// Index name cannot be used as a backend identifier.
    InvalidName(String),
    /// Backend was not available within the configured timeout.
    Timeout { waited: Duration },
    Backend(DbError),
    InvalidData(String),
    /// Query text could not be parsed by the backend.
    InvalidQuery { query: String, message: String },
}

impl Display for IndexError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName(name) => write!(f, "invalid index name `{name}`"),
            Self::Timeout { waited } => {
                write!(f, "index backend busy after {}ms", waited.as_millis())
            }
            Self::Backend(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid index data: {message}"),
            Self::InvalidQuery { query, message } => {
                write!(f, "invalid full-text query `{query}`: {message}")
            }
        }
    }
}

impl Error for IndexError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Backend(err) => Some(err),
            Self::InvalidName(_)
            | Self::Timeout { .. }
            | Self::InvalidData(_)
            | Self::InvalidQuery { .. } => None,
        }
    }
}

impl From<DbError> for IndexError {
    fn from(value: DbError) -> Self {
        Self::Backend(value)
    }
}

impl From<rusqlite::Error> for IndexError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Backend(DbError::Sqlite(value))
    }
}

/// Outcome of one accepted index write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexWrite {
    Applied,
    /// A newer revision for the same id was already applied.
    Superseded,
}

/// Free-text index backend mirrored from the authoritative store.
pub trait SearchIndex: Send + Sync {
    /// Name of the index this adapter reads and writes.
    fn index_name(&self) -> &str;

    /// Creates the named index when absent. Returns `true` when created.
    fn try_ensure_index(&self, name: &str) -> IndexResult<bool>;

    /// Upserts the record's current fields under its id.
    fn try_index(&self, todo: &Todo, revision: Revision) -> IndexResult<IndexWrite>;

    /// Deletes the entry for `id`.
    fn try_remove(&self, id: TodoId, revision: Revision) -> IndexResult<IndexWrite>;

    /// Returns candidate snapshots matching `text`, best match first.
    fn try_query(&self, text: &str) -> IndexResult<Vec<Todo>>;

    /// Highest revision already applied by this index, `0` when none.
    ///
    /// Persistent backends outlive the store that wrote them; a new store
    /// issues revisions above this value.
    fn try_last_revision(&self) -> IndexResult<Revision> {
        Ok(0)
    }

    /// Provisions the named index; failures are logged, not retried.
    fn ensure_index(&self, name: &str) {
        match self.try_ensure_index(name) {
            Ok(true) => debug!("event=index_ensure module=search status=created index={name}"),
            Ok(false) => debug!("event=index_ensure module=search status=exists index={name}"),
            Err(err) => error!(
                "event=index_ensure module=search status=error index={} error={}",
                name, err
            ),
        }
    }

    /// Write-through push of one record. Failures are swallowed.
    fn index(&self, todo: &Todo, revision: Revision) {
        match self.try_index(todo, revision) {
            Ok(IndexWrite::Applied) => {}
            Ok(IndexWrite::Superseded) => debug!(
                "event=index_write module=search status=superseded index={} id={:?} revision={}",
                self.index_name(),
                todo.id,
                revision
            ),
            Err(err) => error!(
                "event=index_write module=search status=error index={} id={:?} revision={} error={}",
                self.index_name(),
                todo.id,
                revision,
                err
            ),
        }
    }

    /// Removes the entry for `id`. Failures are swallowed.
    fn remove(&self, id: TodoId, revision: Revision) {
        if let Err(err) = self.try_remove(id, revision) {
            error!(
                "event=index_remove module=search status=error index={} id={} revision={} error={}",
                self.index_name(),
                id,
                revision,
                err
            );
        }
    }

    /// Last applied revision, or `0` when the backend cannot be read.
    fn last_revision(&self) -> Revision {
        match self.try_last_revision() {
            Ok(revision) => revision,
            Err(err) => {
                warn!(
                    "event=index_revision module=search status=error index={} error={}",
                    self.index_name(),
                    err
                );
                0
            }
        }
    }

    /// Free-text query that degrades to no hits on any backend failure.
    fn query(&self, text: &str) -> Vec<Todo> {
        match self.try_query(text) {
            Ok(hits) => hits,
            Err(err) => {
                warn!(
                    "event=index_query module=search status=error index={} error={}",
                    self.index_name(),
                    err
                );
                Vec::new()
            }
        }
    }
}

impl<T: SearchIndex + ?Sized> SearchIndex for Arc<T> {
    fn index_name(&self) -> &str {
        (**self).index_name()
    }

    fn try_ensure_index(&self, name: &str) -> IndexResult<bool> {
        (**self).try_ensure_index(name)
    }

    fn try_index(&self, todo: &Todo, revision: Revision) -> IndexResult<IndexWrite> {
        (**self).try_index(todo, revision)
    }

    fn try_remove(&self, id: TodoId, revision: Revision) -> IndexResult<IndexWrite> {
        (**self).try_remove(id, revision)
    }

    fn try_query(&self, text: &str) -> IndexResult<Vec<Todo>> {
        (**self).try_query(text)
    }

    fn try_last_revision(&self) -> IndexResult<Revision> {
        (**self).try_last_revision()
    }
}
