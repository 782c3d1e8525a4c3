//! Todo domain model.
//!
//! # Responsibility
//! - Define the canonical todo record shared by store, index and boundary.
//! - Define the identity rule used for contains/update/delete semantics.
//!
//! # Invariants
//! - `id` is assigned by the creator and never rewritten by core.
//! - Two todos are equal iff their ids are equal; an absent id equals nothing.
//! - `done` defaults to `false`.

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Stable external identifier of a todo.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type TodoId = i64;

/// Canonical todo record.
///
/// Field values are plain data; identity is carried by `id` alone, see
/// [`same_identity`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Todo {
    /// Creator-assigned identity. `None` only for records arriving from a
    /// boundary without an id; the store rejects those on write paths.
    pub id: Option<TodoId>,
    pub title: String,
    pub body: String,
    /// Completion flag. Missing in JSON input means not done.
    #[serde(default)]
    pub done: bool,
}

impl Todo {
    /// Creates a todo with every field supplied by the caller.
    pub fn new(id: TodoId, title: impl Into<String>, body: impl Into<String>, done: bool) -> Self {
        Self {
            id: Some(id),
            title: title.into(),
            body: body.into(),
            done,
        }
    }

    /// Creates a not-done todo with a caller-provided id.
    pub fn with_id(id: TodoId, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(id, title, body, false)
    }

    /// Returns whether `other` is the same logical todo.
    pub fn same_identity(&self, other: &Todo) -> bool {
        same_identity(self, other)
    }
}

/// Identity predicate: `a.id == b.id`.
///
/// An absent id never equals another id (absent or not); the only exception
/// is a record compared with itself by reference.
pub fn same_identity(a: &Todo, b: &Todo) -> bool {
    if std::ptr::eq(a, b) {
        return true;
    }
    match (a.id, b.id) {
        (Some(left), Some(right)) => left == right,
        _ => false,
    }
}

impl PartialEq for Todo {
    fn eq(&self, other: &Self) -> bool {
        same_identity(self, other)
    }
}

impl Hash for Todo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Bootstrap records used by demos, the CLI probe and scenario tests.
pub fn sample_todos() -> Vec<Todo> {
    vec![
        Todo::with_id(
            1,
            "Clean out the fridge",
            "Clean the shelves and throw away garbage",
        ),
        Todo::with_id(
            2,
            "Do the dishes",
            "Wash each of the dishes with soap and water",
        ),
        Todo::new(
            3,
            "Build a REST API for a hypothetical Todo app",
            "Write code as needed",
            true,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::{same_identity, sample_todos, Todo};

    #[test]
    fn identity_ignores_non_key_fields() {
        let stored = Todo::with_id(7, "water plants", "balcony");
        let incoming = Todo::new(7, "something else", "", true);

        assert!(same_identity(&stored, &incoming));
        assert_eq!(stored, incoming);
    }

    #[test]
    fn absent_ids_never_match_except_by_reference() {
        let mut left = Todo::with_id(1, "a", "b");
        left.id = None;
        let right = left.clone();

        assert!(!same_identity(&left, &right));
        assert!(same_identity(&left, &left));
    }

    #[test]
    fn sample_set_has_one_done_todo() {
        let todos = sample_todos();
        assert_eq!(todos.len(), 3);
        assert_eq!(todos.iter().filter(|todo| todo.done).count(), 1);
        assert_eq!(todos[2].id, Some(3));
    }
}
