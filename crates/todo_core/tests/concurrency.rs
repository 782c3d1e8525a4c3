use std::sync::Arc;
use std::thread;
use todo_core::{SearchIndex, SqliteSearchIndex, Todo, TodoConfig, TodoStore};

fn shared_store(config: TodoConfig) -> Arc<TodoStore<SqliteSearchIndex>> {
    let index = SqliteSearchIndex::from_config(&config).unwrap();
    Arc::new(TodoStore::bootstrap(&config, index))
}

#[test]
fn concurrent_creates_with_same_id_admit_exactly_one() {
    let store = shared_store(TodoConfig::default());

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                store
                    .create(Todo::with_id(1, format!("worker {worker}"), ""))
                    .is_ok()
            })
        })
        .collect();

    let successes = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .filter(|created| *created)
        .count();

    assert_eq!(successes, 1);
    assert_eq!(store.len(), 1);
}

#[test]
fn concurrent_updates_leave_index_agreeing_with_store() {
    let store = shared_store(TodoConfig::default());
    store
        .create(Todo::with_id(1, "counter initial", ""))
        .unwrap();

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for round in 0..25 {
                    let title = format!("counter w{worker}r{round}");
                    store.update(Todo::with_id(1, title, "")).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let canonical = store.get(1).unwrap();
    let indexed = store.search_index().query("counter");
    assert_eq!(indexed.len(), 1);
    assert_eq!(indexed[0].title, canonical.title);
}

#[test]
fn concurrent_complete_succeeds_once() {
    let store = shared_store(TodoConfig::default().with_sample_data(true));

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || store.complete(2).is_ok())
        })
        .collect();

    let successes = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .filter(|completed| *completed)
        .count();

    assert_eq!(successes, 1);
    assert!(store.get(2).unwrap().done);
}

#[test]
fn searches_during_deletes_only_return_present_todos() {
    let store = shared_store(TodoConfig::default());
    for id in 1..=40 {
        store
            .create(Todo::with_id(id, format!("shared chore {id}"), ""))
            .unwrap();
    }

    let deleter = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for id in (1..=40).step_by(2) {
                store.delete(id).unwrap();
            }
        })
    };
    let searcher = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for _ in 0..20 {
                for todo in store.search("chore") {
                    assert!(todo.id.is_some_and(|id| id > 0));
                }
            }
        })
    };
    deleter.join().unwrap();
    searcher.join().unwrap();

    let results = store.search("chore");
    assert_eq!(results.len(), 20);
    for todo in &results {
        assert!(store.get(todo.id.unwrap()).is_some());
    }
}
