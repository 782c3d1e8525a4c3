//! Authoritative todo store with write-through search indexing.
//!
//! # Responsibility
//! - Own the canonical, insertion-ordered todo collection.
//! - Push every accepted mutation to the search index.
//! - Reconcile index hits against canonical state before returning them.
//!
//! # Invariants
//! - At most one todo per id; lookups go through the id map.
//! - `done` only moves from `false` to `true`.
//! - No index I/O happens while the canonical lock is held.
//! - Revisions are issued under the write lock, so index writes for one id
//!   carry strictly increasing revisions in mutation order, starting above
//!   the index's last applied revision.
//! - `search` never returns a todo that `get` cannot find.

use crate::config::TodoConfig;
use crate::model::todo::{sample_todos, Todo, TodoId};
use crate::search::index::{Revision, SearchIndex};
use log::{debug, info, warn};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Validation and conflict errors of store operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// Incoming record carries no id.
    MissingId,
    /// Id is zero or negative.
    InvalidId(TodoId),
    AlreadyExists(TodoId),
    NotFound(TodoId),
    AlreadyDone(TodoId),
    /// Update tried to move a done todo back to not-done.
    ReopenRejected(TodoId),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingId => write!(f, "todo id is missing"),
            Self::InvalidId(id) => write!(f, "todo id must be positive, got {id}"),
            Self::AlreadyExists(id) => write!(f, "todo already exists: {id}"),
            Self::NotFound(id) => write!(f, "todo not found: {id}"),
            Self::AlreadyDone(id) => write!(f, "todo already done: {id}"),
            Self::ReopenRejected(id) => write!(f, "done todo cannot be reopened: {id}"),
        }
    }
}

impl Error for StoreError {}

impl StoreError {
    /// Stable short code used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingId => "missing_id",
            Self::InvalidId(_) => "invalid_id",
            Self::AlreadyExists(_) => "already_exists",
            Self::NotFound(_) => "not_found",
            Self::AlreadyDone(_) => "already_done",
            Self::ReopenRejected(_) => "reopen_rejected",
        }
    }
}

#[derive(Default)]
struct Canonical {
    /// Insertion sequence -> record; iteration order is insertion order.
    entries: BTreeMap<u64, Todo>,
    /// Identity map backing O(1) lookups.
    positions: HashMap<TodoId, u64>,
    next_seq: u64,
    last_revision: Revision,
}

impl Canonical {
    fn lookup(&self, id: TodoId) -> Option<&Todo> {
        self.positions
            .get(&id)
            .and_then(|seq| self.entries.get(seq))
    }

    fn lookup_mut(&mut self, id: TodoId) -> Option<&mut Todo> {
        let seq = *self.positions.get(&id)?;
        self.entries.get_mut(&seq)
    }

    fn issue_revision(&mut self) -> Revision {
        self.last_revision += 1;
        self.last_revision
    }
}

/// Canonical todo collection driving a [`SearchIndex`].
///
/// Shared between threads through `Arc<TodoStore<_>>`; all operations take
/// `&self`.
pub struct TodoStore<I: SearchIndex> {
    state: RwLock<Canonical>,
    index: I,
    tombstone_on_delete: bool,
}

impl<I: SearchIndex> TodoStore<I> {
    /// Creates an empty store writing through to `index`.
    ///
    /// Revisions continue above whatever `index` already applied, so writes
    /// to a reopened persistent index are never dropped as superseded.
    pub fn new(index: I) -> Self {
        let last_revision = index.last_revision();
        debug!(
            "event=store_open module=store status=ok index={} last_revision={}",
            index.index_name(),
            last_revision
        );
        Self {
            state: RwLock::new(Canonical {
                last_revision,
                ..Canonical::default()
            }),
            index,
            tombstone_on_delete: false,
        }
    }

    /// Enables or disables index removal on delete.
    pub fn with_tombstone_on_delete(mut self, enabled: bool) -> Self {
        self.tombstone_on_delete = enabled;
        self
    }

    /// Creates a store configured by `config`, seeding sample data when
    /// requested.
    pub fn bootstrap(config: &TodoConfig, index: I) -> Self {
        let store = Self::new(index).with_tombstone_on_delete(config.tombstone_on_delete);
        if config.seed_sample_data {
            for todo in sample_todos() {
                if let Err(err) = store.create(todo) {
                    warn!(
                        "event=store_seed module=store status=error error_code={} error={}",
                        err.code(),
                        err
                    );
                }
            }
        }
        info!(
            "event=store_bootstrap module=store status=ok index={} todos={} tombstone_on_delete={}",
            store.index.index_name(),
            store.len(),
            store.tombstone_on_delete
        );
        store
    }

    /// Index this store writes through to.
    pub fn search_index(&self) -> &I {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().entries.is_empty()
    }

    /// Returns a snapshot of all todos in insertion order.
    pub fn list(&self) -> Vec<Todo> {
        self.state.read().entries.values().cloned().collect()
    }

    /// Returns the todo with `id`, or `None` for unknown or non-positive ids.
    pub fn get(&self, id: TodoId) -> Option<Todo> {
        if id < 1 {
            return None;
        }
        self.state.read().lookup(id).cloned()
    }

    /// Adds a new todo at the end of the collection.
    ///
    /// # Errors
    /// - `MissingId` / `InvalidId` when the record has no usable id.
    /// - `AlreadyExists` when a todo with the same identity is present; the
    ///   collection is left untouched.
    pub fn create(&self, todo: Todo) -> StoreResult<()> {
        let id = validate_id(todo.id).inspect_err(|err| log_rejected("create", err))?;

        let revision = {
            let mut state = self.state.write();
            if state.positions.contains_key(&id) {
                let err = StoreError::AlreadyExists(id);
                log_rejected("create", &err);
                return Err(err);
            }
            let seq = state.next_seq;
            state.next_seq += 1;
            state.positions.insert(id, seq);
            state.entries.insert(seq, todo.clone());
            state.issue_revision()
        };

        self.index.index(&todo, revision);
        debug!("event=todo_create module=store status=ok id={id} revision={revision}");
        Ok(())
    }

    /// Replaces the fields of an existing todo, keeping its position.
    ///
    /// # Errors
    /// - `MissingId` / `InvalidId` when the record has no usable id.
    /// - `NotFound` when no todo shares the record's identity.
    /// - `ReopenRejected` when the stored todo is done and the record is not.
    pub fn update(&self, todo: Todo) -> StoreResult<()> {
        let id = validate_id(todo.id).inspect_err(|err| log_rejected("update", err))?;

        let revision = {
            let mut state = self.state.write();
            let Some(existing) = state.lookup_mut(id) else {
                let err = StoreError::NotFound(id);
                log_rejected("update", &err);
                return Err(err);
            };
            if existing.done && !todo.done {
                let err = StoreError::ReopenRejected(id);
                log_rejected("update", &err);
                return Err(err);
            }
            *existing = todo.clone();
            state.issue_revision()
        };

        self.index.index(&todo, revision);
        debug!("event=todo_update module=store status=ok id={id} revision={revision}");
        Ok(())
    }

    /// Marks a not-done todo as done.
    ///
    /// Completing twice is an error, not an idempotent success.
    pub fn complete(&self, id: TodoId) -> StoreResult<()> {
        let (snapshot, revision) = {
            let mut state = self.state.write();
            let todo =
                lookup_target(&mut state, id).inspect_err(|err| log_rejected("complete", err))?;
            if todo.done {
                let err = StoreError::AlreadyDone(id);
                log_rejected("complete", &err);
                return Err(err);
            }
            todo.done = true;
            let snapshot = todo.clone();
            (snapshot, state.issue_revision())
        };

        self.index.index(&snapshot, revision);
        debug!("event=todo_complete module=store status=ok id={id} revision={revision}");
        Ok(())
    }

    /// Removes a todo from the canonical collection.
    ///
    /// The index entry is only removed when tombstoning is enabled; otherwise
    /// it stays behind and is filtered out by [`TodoStore::search`].
    pub fn delete(&self, id: TodoId) -> StoreResult<()> {
        let revision = {
            let mut state = self.state.write();
            lookup_target(&mut state, id).inspect_err(|err| log_rejected("delete", err))?;
            if let Some(seq) = state.positions.remove(&id) {
                state.entries.remove(&seq);
            }
            state.issue_revision()
        };

        if self.tombstone_on_delete {
            self.index.remove(id, revision);
        }
        debug!(
            "event=todo_delete module=store status=ok id={id} revision={revision} tombstone={}",
            self.tombstone_on_delete
        );
        Ok(())
    }

    /// Free-text search reconciled against canonical state.
    ///
    /// Index hits are re-resolved by id; hits for todos no longer present are
    /// dropped, duplicates collapse onto the first occurrence, and index order
    /// is kept. Returned values are canonical records, not index snapshots.
    pub fn search(&self, text: &str) -> Vec<Todo> {
        let hits = self.index.query(text);
        if hits.is_empty() {
            return Vec::new();
        }

        let candidates = hits.len();
        let state = self.state.read();
        let mut seen = HashSet::new();
        let mut results = Vec::new();
        let mut stale = 0_usize;

        for hit in hits {
            let Some(id) = hit.id else {
                stale += 1;
                continue;
            };
            if !seen.insert(id) {
                continue;
            }
            match state.lookup(id) {
                Some(todo) => results.push(todo.clone()),
                None => stale += 1,
            }
        }

        debug!(
            "event=todo_search module=store status=ok candidates={} returned={} stale={}",
            candidates,
            results.len(),
            stale
        );
        results
    }
}

fn validate_id(id: Option<TodoId>) -> StoreResult<TodoId> {
    match id {
        None => Err(StoreError::MissingId),
        Some(id) if id < 1 => Err(StoreError::InvalidId(id)),
        Some(id) => Ok(id),
    }
}

fn lookup_target(state: &mut Canonical, id: TodoId) -> StoreResult<&mut Todo> {
    if id < 1 {
        return Err(StoreError::InvalidId(id));
    }
    state.lookup_mut(id).ok_or(StoreError::NotFound(id))
}

fn log_rejected(operation: &str, err: &StoreError) {
    debug!(
        "event=todo_{} module=store status=rejected error_code={}",
        operation,
        err.code()
    );
}
