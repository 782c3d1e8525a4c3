//! SQLite FTS5-backed search index.
//!
//! # Responsibility
//! - Provision one FTS5 table per index name plus its revision ledger.
//! - Upsert todo snapshots keyed by todo id and answer keyword queries.
//!
//! # Invariants
//! - FTS rowid equals the todo id, so one id maps to at most one entry.
//! - A revision is applied only when newer than the ledger entry for its id;
//!   check and write happen in one transaction under the connection mutex.
//! - The ledger survives reopening a file-backed index; `try_last_revision`
//!   exposes its maximum so a new store keeps issuing newer revisions.
//! - Every call waits at most `timeout` for the connection.
//! - Result ordering is deterministic by bm25 rank, then id.

use crate::config::TodoConfig;
use crate::db::{open_index_db, open_index_db_in_memory, DbError, DbResult};
use crate::model::todo::{Todo, TodoId};
use crate::search::index::{IndexError, IndexResult, IndexWrite, Revision, SearchIndex};
use log::info;
use parking_lot::{Mutex, MutexGuard};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::time::Duration;

/// Search index stored in SQLite FTS5 tables.
pub struct SqliteSearchIndex {
    name: String,
    conn: Mutex<Connection>,
    timeout: Duration,
    max_hits: u32,
}

impl SqliteSearchIndex {
    /// Wraps an open connection and provisions the named index.
    ///
    /// Provisioning failures are logged; later calls then fail and degrade
    /// individually.
    pub fn new(
        conn: Connection,
        name: impl Into<String>,
        timeout: Duration,
        max_hits: u32,
    ) -> Self {
        let index = Self {
            name: name.into(),
            conn: Mutex::new(conn),
            timeout,
            max_hits,
        };
        index.ensure_index(&index.name);
        index
    }

    /// Opens the backend described by `config` (file or memory).
    pub fn from_config(config: &TodoConfig) -> DbResult<Self> {
        let conn = match &config.index_path {
            Some(path) => open_index_db(path, config.index_timeout)?,
            None => open_index_db_in_memory(config.index_timeout)?,
        };
        info!(
            "event=index_open module=search status=ok index={} persistent={}",
            config.index_name,
            config.index_path.is_some()
        );
        Ok(Self::new(
            conn,
            config.index_name.clone(),
            config.index_timeout,
            config.max_hits,
        ))
    }

    /// Number of entries currently held by the index, stale ones included.
    pub fn entry_count(&self) -> IndexResult<u64> {
        let conn = self.lock()?;
        let count: i64 =
            conn.query_row(&format!("SELECT COUNT(*) FROM {};", self.name), [], |row| {
                row.get(0)
            })?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    fn lock(&self) -> IndexResult<MutexGuard<'_, Connection>> {
        self.conn
            .try_lock_for(self.timeout)
            .ok_or(IndexError::Timeout {
                waited: self.timeout,
            })
    }
}

impl SearchIndex for SqliteSearchIndex {
    fn index_name(&self) -> &str {
        &self.name
    }

    fn try_ensure_index(&self, name: &str) -> IndexResult<bool> {
        if !is_valid_index_name(name) {
            return Err(IndexError::InvalidName(name.to_string()));
        }

        let mut conn = self.lock()?;
        let present: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN (?1, ?2);",
            params![name, format!("{name}_revisions")],
            |row| row.get(0),
        )?;
        if present == 2 {
            return Ok(false);
        }

        let tx = conn.transaction()?;
        tx.execute_batch(&format!(
            "CREATE VIRTUAL TABLE IF NOT EXISTS {name} USING fts5(
                title,
                body,
                done UNINDEXED,
                tokenize = 'porter unicode61'
             );
             CREATE TABLE IF NOT EXISTS {name}_revisions (
                todo_id INTEGER PRIMARY KEY,
                revision INTEGER NOT NULL
             );"
        ))?;
        tx.commit()?;
        info!("event=index_create module=search status=ok index={name}");
        Ok(true)
    }

    fn try_index(&self, todo: &Todo, revision: Revision) -> IndexResult<IndexWrite> {
        let id = todo
            .id
            .ok_or_else(|| IndexError::InvalidData("todo without id".to_string()))?;

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        if !advance_revision(&tx, &self.name, id, revision)? {
            return Ok(IndexWrite::Superseded);
        }
        tx.execute(&format!("DELETE FROM {} WHERE rowid = ?1;", self.name), [id])?;
        tx.execute(
            &format!(
                "INSERT INTO {} (rowid, title, body, done) VALUES (?1, ?2, ?3, ?4);",
                self.name
            ),
            params![id, todo.title.as_str(), todo.body.as_str(), bool_to_int(todo.done)],
        )?;
        tx.commit()?;
        Ok(IndexWrite::Applied)
    }

    fn try_remove(&self, id: TodoId, revision: Revision) -> IndexResult<IndexWrite> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        if !advance_revision(&tx, &self.name, id, revision)? {
            return Ok(IndexWrite::Superseded);
        }
        tx.execute(&format!("DELETE FROM {} WHERE rowid = ?1;", self.name), [id])?;
        tx.commit()?;
        Ok(IndexWrite::Applied)
    }

    fn try_query(&self, text: &str) -> IndexResult<Vec<Todo>> {
        let Some(match_expr) = build_match_expression(text) else {
            return Ok(Vec::new());
        };
        if self.max_hits == 0 {
            return Ok(Vec::new());
        }

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT rowid AS id, title, body, done
             FROM {name}
             WHERE {name} MATCH ?1
             ORDER BY bm25({name}), rowid ASC
             LIMIT ?2;",
            name = self.name
        ))?;
        let mut rows = stmt
            .query(params![match_expr, i64::from(self.max_hits)])
            .map_err(|err| map_query_error(err, &match_expr))?;
        let mut hits = Vec::new();

        while let Some(row) = rows
            .next()
            .map_err(|err| map_query_error(err, &match_expr))?
        {
            hits.push(parse_hit(row)?);
        }

        Ok(hits)
    }

    fn try_last_revision(&self) -> IndexResult<Revision> {
        let conn = self.lock()?;
        let last: i64 = conn.query_row(
            &format!("SELECT COALESCE(MAX(revision), 0) FROM {}_revisions;", self.name),
            [],
            |row| row.get(0),
        )?;
        Revision::try_from(last)
            .map_err(|_| IndexError::InvalidData(format!("negative revision {last}")))
    }
}

/// Returns whether `name` is usable as an unquoted SQLite identifier.
pub fn is_valid_index_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

fn advance_revision(
    tx: &Transaction<'_>,
    name: &str,
    id: TodoId,
    revision: Revision,
) -> IndexResult<bool> {
    let revision = i64::try_from(revision)
        .map_err(|_| IndexError::InvalidData(format!("revision {revision} out of range")))?;
    let applied: Option<i64> = tx
        .query_row(
            &format!("SELECT revision FROM {name}_revisions WHERE todo_id = ?1;"),
            [id],
            |row| row.get(0),
        )
        .optional()?;
    if applied.is_some_and(|applied| applied >= revision) {
        return Ok(false);
    }

    tx.execute(
        &format!(
            "INSERT INTO {name}_revisions (todo_id, revision) VALUES (?1, ?2)
             ON CONFLICT(todo_id) DO UPDATE SET revision = excluded.revision;"
        ),
        params![id, revision],
    )?;
    Ok(true)
}

fn parse_hit(row: &Row<'_>) -> IndexResult<Todo> {
    let done = match row.get::<_, i64>("done")? {
        0 => false,
        1 => true,
        other => {
            return Err(IndexError::InvalidData(format!(
                "invalid done value `{other}`"
            )));
        }
    };

    Ok(Todo {
        id: Some(row.get("id")?),
        title: row.get("title")?,
        body: row.get("body")?,
        done,
    })
}

fn build_match_expression(text: &str) -> Option<String> {
    let terms = text
        .split_whitespace()
        .map(escape_fts_term)
        .collect::<Vec<_>>();

    if terms.is_empty() {
        return None;
    }

    Some(terms.join(" AND "))
}

fn escape_fts_term(raw: &str) -> String {
    let escaped = raw.replace('"', "\"\"");
    format!("\"{escaped}\"")
}

fn map_query_error(err: rusqlite::Error, query: &str) -> IndexError {
    if is_match_syntax_error(&err) {
        return IndexError::InvalidQuery {
            query: query.to_string(),
            message: err.to_string(),
        };
    }

    IndexError::Backend(DbError::Sqlite(err))
}

fn is_match_syntax_error(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(_, Some(message)) => {
            let msg = message.to_lowercase();
            (msg.contains("fts5") && msg.contains("syntax"))
                || msg.contains("malformed match expression")
                || msg.contains("unterminated")
        }
        _ => false,
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::{build_match_expression, is_valid_index_name};

    #[test]
    fn match_expression_quotes_and_joins_terms() {
        assert_eq!(
            build_match_expression("do  dishes").as_deref(),
            Some("\"do\" AND \"dishes\"")
        );
        assert_eq!(
            build_match_expression("say \"hi\"").as_deref(),
            Some("\"say\" AND \"\"\"hi\"\"\"")
        );
    }

    #[test]
    fn blank_text_has_no_match_expression() {
        assert_eq!(build_match_expression(" \t "), None);
    }

    #[test]
    fn index_names_are_plain_identifiers() {
        assert!(is_valid_index_name("todos"));
        assert!(is_valid_index_name("_todo_v2"));
        assert!(!is_valid_index_name(""));
        assert!(!is_valid_index_name("2todos"));
        assert!(!is_valid_index_name("todos; DROP TABLE x"));
    }
}
