//! Connection bootstrap utilities for the index backend.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure the busy timeout and verify FTS5 support.
//!
//! # Invariants
//! - Returned connections have `busy_timeout` set to the requested value.
//! - Returned connections are able to create FTS5 tables.

use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// Opens a SQLite database file to host search indexes.
///
/// # Side effects
/// - Creates the file when it does not exist.
/// - Emits `index_db_open` logging events with duration and status.
pub fn open_index_db(path: impl AsRef<Path>, busy_timeout: Duration) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=index_db_open module=db status=start mode=file");

    let conn = match Connection::open(path) {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=index_db_open module=db status=error mode=file duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    finish_open(conn, busy_timeout, "file", started_at)
}

/// Opens a private in-memory SQLite database to host search indexes.
///
/// The index disappears with the connection; used by tests and by
/// deployments without an index path.
pub fn open_index_db_in_memory(busy_timeout: Duration) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=index_db_open module=db status=start mode=memory");

    let conn = match Connection::open_in_memory() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=index_db_open module=db status=error mode=memory duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    finish_open(conn, busy_timeout, "memory", started_at)
}

fn finish_open(
    conn: Connection,
    busy_timeout: Duration,
    mode: &str,
    started_at: Instant,
) -> DbResult<Connection> {
    match bootstrap_connection(&conn, busy_timeout) {
        Ok(()) => {
            info!(
                "event=index_db_open module=db status=ok mode={} duration_ms={}",
                mode,
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=index_db_open module=db status=error mode={} duration_ms={} error_code=db_bootstrap_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn bootstrap_connection(conn: &Connection, busy_timeout: Duration) -> DbResult<()> {
    conn.busy_timeout(busy_timeout)?;
    let fts5_enabled: i64 =
        conn.query_row("SELECT sqlite_compileoption_used('ENABLE_FTS5');", [], |row| {
            row.get(0)
        })?;
    if fts5_enabled == 0 {
        return Err(DbError::Fts5Unavailable);
    }
    Ok(())
}
