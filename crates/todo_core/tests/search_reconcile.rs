use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use todo_core::db::DbError;
use todo_core::{
    IndexError, IndexResult, IndexWrite, Revision, SearchIndex, SqliteSearchIndex, Todo,
    TodoConfig, TodoId, TodoStore,
};

/// Index double whose query results are scripted by the test.
#[derive(Default)]
struct ScriptedIndex {
    hits: Mutex<Vec<Todo>>,
    writes: Mutex<Vec<(TodoId, Revision)>>,
    removals: Mutex<Vec<TodoId>>,
    failing: AtomicBool,
}

impl ScriptedIndex {
    fn script_hits(&self, hits: Vec<Todo>) {
        *self.hits.lock() = hits;
    }

    fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> IndexResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(IndexError::Backend(DbError::Fts5Unavailable));
        }
        Ok(())
    }
}

impl SearchIndex for ScriptedIndex {
    fn index_name(&self) -> &str {
        "scripted"
    }

    fn try_ensure_index(&self, _name: &str) -> IndexResult<bool> {
        self.check()?;
        Ok(false)
    }

    fn try_index(&self, todo: &Todo, revision: Revision) -> IndexResult<IndexWrite> {
        self.check()?;
        if let Some(id) = todo.id {
            self.writes.lock().push((id, revision));
        }
        Ok(IndexWrite::Applied)
    }

    fn try_remove(&self, id: TodoId, _revision: Revision) -> IndexResult<IndexWrite> {
        self.check()?;
        self.removals.lock().push(id);
        Ok(IndexWrite::Applied)
    }

    fn try_query(&self, _text: &str) -> IndexResult<Vec<Todo>> {
        self.check()?;
        Ok(self.hits.lock().clone())
    }
}

fn sqlite_store(config: TodoConfig) -> TodoStore<SqliteSearchIndex> {
    let config = config.with_sample_data(true);
    let index = SqliteSearchIndex::from_config(&config).unwrap();
    TodoStore::bootstrap(&config, index)
}

fn titles(todos: &[Todo]) -> Vec<&str> {
    todos.iter().map(|todo| todo.title.as_str()).collect()
}

#[test]
fn search_finds_dishes_in_bootstrap_set() {
    let store = sqlite_store(TodoConfig::default());

    let results = store.search("dishes");

    assert_eq!(titles(&results), vec!["Do the dishes"]);
}

#[test]
fn search_reflects_updated_content() {
    let store = sqlite_store(TodoConfig::default());

    store
        .update(Todo::with_id(2, "Walk the dog", "around the block"))
        .unwrap();

    assert!(store.search("dishes").is_empty());
    assert_eq!(titles(&store.search("dog")), vec!["Walk the dog"]);
}

#[test]
fn search_hides_deleted_todo_still_present_in_index() {
    let store = sqlite_store(TodoConfig::default());

    store.delete(2).unwrap();

    // The index keeps the stale entry; reconciliation drops it.
    assert_eq!(store.search_index().query("dishes").len(), 1);
    assert!(store.search("dishes").is_empty());
}

#[test]
fn tombstoning_removes_index_entry_on_delete() {
    let store = sqlite_store(TodoConfig::default().with_tombstone_on_delete(true));

    store.delete(2).unwrap();

    assert!(store.search_index().query("dishes").is_empty());
    assert!(store.search("dishes").is_empty());
    assert_eq!(store.search_index().entry_count().unwrap(), 2);
}

#[test]
fn search_returns_canonical_values_not_index_snapshots() {
    let index = Arc::new(ScriptedIndex::default());
    let store = TodoStore::new(Arc::clone(&index));
    store.create(Todo::with_id(1, "current title", "")).unwrap();

    index.script_hits(vec![Todo::with_id(1, "stale title", "")]);

    let results = store.search("anything");
    assert_eq!(titles(&results), vec!["current title"]);
}

#[test]
fn search_keeps_index_order_and_drops_duplicates_and_ghosts() {
    let index = Arc::new(ScriptedIndex::default());
    let store = TodoStore::new(Arc::clone(&index));
    for id in 1..=3 {
        store
            .create(Todo::with_id(id, format!("todo {id}"), ""))
            .unwrap();
    }

    let mut without_id = Todo::with_id(1, "no id", "");
    without_id.id = None;
    index.script_hits(vec![
        Todo::with_id(3, "", ""),
        Todo::with_id(9, "deleted long ago", ""),
        Todo::with_id(1, "", ""),
        Todo::with_id(3, "", ""),
        without_id,
    ]);

    let results = store.search("todo");
    let ids: Vec<_> = results.iter().map(|todo| todo.id).collect();
    assert_eq!(ids, vec![Some(3), Some(1)]);
}

#[test]
fn search_never_returns_todos_that_get_cannot_find() {
    let store = sqlite_store(TodoConfig::default());
    store
        .create(Todo::with_id(4, "Dishes for the party", "rent dishes"))
        .unwrap();
    store
        .update(Todo::with_id(1, "Dry the dishes", "towel"))
        .unwrap();
    store.delete(2).unwrap();
    store
        .create(Todo::with_id(5, "Return party dishes", ""))
        .unwrap();
    store.delete(4).unwrap();

    let results = store.search("dishes");

    assert!(!results.is_empty());
    for todo in &results {
        let id = todo.id.unwrap();
        assert!(store.get(id).is_some(), "search returned deleted todo {id}");
    }
    let ids: Vec<_> = results.iter().map(|todo| todo.id).collect();
    assert!(ids.contains(&Some(1)));
    assert!(ids.contains(&Some(5)));
}

#[test]
fn failing_index_never_fails_store_operations() {
    let index = Arc::new(ScriptedIndex::default());
    let store = TodoStore::new(Arc::clone(&index)).with_tombstone_on_delete(true);
    index.fail(true);

    store.create(Todo::with_id(1, "offline", "")).unwrap();
    store.update(Todo::with_id(1, "still offline", "")).unwrap();
    store.complete(1).unwrap();
    assert!(store.search("offline").is_empty());
    store.delete(1).unwrap();

    assert!(store.get(1).is_none());
    assert!(index.writes.lock().is_empty());
}

#[test]
fn every_mutation_is_pushed_with_increasing_revisions() {
    let index = Arc::new(ScriptedIndex::default());
    let store = TodoStore::new(Arc::clone(&index)).with_tombstone_on_delete(true);

    store.create(Todo::with_id(1, "a", "")).unwrap();
    store.update(Todo::with_id(1, "b", "")).unwrap();
    store.complete(1).unwrap();
    store.delete(1).unwrap();

    let writes = index.writes.lock().clone();
    assert_eq!(writes, vec![(1, 1), (1, 2), (1, 3)]);
    assert_eq!(index.removals.lock().clone(), vec![1]);
}

#[test]
fn delete_without_tombstoning_leaves_index_alone() {
    let index = Arc::new(ScriptedIndex::default());
    let store = TodoStore::new(Arc::clone(&index));

    store.create(Todo::with_id(1, "a", "")).unwrap();
    store.delete(1).unwrap();

    assert!(index.removals.lock().is_empty());
}

#[test]
fn rejected_mutations_are_not_pushed() {
    let index = Arc::new(ScriptedIndex::default());
    let store = TodoStore::new(Arc::clone(&index));
    store.create(Todo::with_id(1, "a", "")).unwrap();

    assert!(store.create(Todo::with_id(1, "dup", "")).is_err());
    assert!(store.update(Todo::with_id(2, "missing", "")).is_err());
    store.complete(1).unwrap();
    assert!(store.complete(1).is_err());

    assert_eq!(index.writes.lock().len(), 2);
}

#[test]
fn reopened_file_index_tracks_a_new_store() {
    let dir = tempfile::tempdir().unwrap();
    let config = TodoConfig::default().with_index_path(dir.path().join("index.sqlite3"));

    {
        let first = sqlite_store(config.clone());
        first
            .update(Todo::with_id(2, "Walk the dog", "around the block"))
            .unwrap();
        assert_eq!(titles(&first.search("dog")), vec!["Walk the dog"]);
    }

    let second = sqlite_store(config);
    assert_eq!(second.get(2).unwrap().title, "Do the dishes");
    assert_eq!(titles(&second.search("dishes")), vec!["Do the dishes"]);
    assert!(second.search("dog").is_empty());

    second
        .update(Todo::with_id(2, "Buy milk", "two liters"))
        .unwrap();
    assert_eq!(titles(&second.search("milk")), vec!["Buy milk"]);
    assert!(second.search("dishes").is_empty());
}
