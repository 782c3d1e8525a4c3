//! Todo use-case service.
//!
//! # Responsibility
//! - Expose the boundary operation set consumed by transport layers.
//! - Map store outcomes onto the uniform `{ok, message}` envelope.
//!
//! # Invariants
//! - Boundary calls never panic and never return store error types.
//! - Messages are stable strings; error detail stays in the logs.

use crate::model::todo::{Todo, TodoId};
use crate::search::index::SearchIndex;
use crate::store::todo_store::{StoreResult, TodoStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const MSG_CREATE_OK: &str = "Create successful";
pub const MSG_CREATE_ERR: &str = "Error on create";
pub const MSG_UPDATE_OK: &str = "Update successful";
pub const MSG_UPDATE_ERR: &str = "Error on update";
pub const MSG_COMPLETE_OK: &str = "Todo marked completed";
pub const MSG_COMPLETE_ERR: &str = "Couldn't mark todo complete";
pub const MSG_DELETE_OK: &str = "Delete successful";
pub const MSG_DELETE_ERR: &str = "Error on delete";

/// Result envelope for mutating boundary calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpResult {
    pub ok: bool,
    pub message: String,
}

impl OpResult {
    fn from_store<T>(result: &StoreResult<T>, ok_message: &str, err_message: &str) -> Self {
        match result {
            Ok(_) => Self {
                ok: true,
                message: ok_message.to_string(),
            },
            Err(_) => Self {
                ok: false,
                message: err_message.to_string(),
            },
        }
    }
}

/// Search request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

/// Boundary service over a shared [`TodoStore`].
pub struct TodoService<I: SearchIndex> {
    store: Arc<TodoStore<I>>,
}

impl<I: SearchIndex> Clone for TodoService<I> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<I: SearchIndex> TodoService<I> {
    pub fn new(store: Arc<TodoStore<I>>) -> Self {
        Self { store }
    }

    /// Underlying store handle.
    pub fn store(&self) -> &Arc<TodoStore<I>> {
        &self.store
    }

    pub fn list(&self) -> Vec<Todo> {
        self.store.list()
    }

    /// Returns `None` for not-found.
    pub fn get(&self, id: TodoId) -> Option<Todo> {
        self.store.get(id)
    }

    pub fn create(&self, todo: Todo) -> OpResult {
        OpResult::from_store(&self.store.create(todo), MSG_CREATE_OK, MSG_CREATE_ERR)
    }

    pub fn update(&self, todo: Todo) -> OpResult {
        OpResult::from_store(&self.store.update(todo), MSG_UPDATE_OK, MSG_UPDATE_ERR)
    }

    pub fn complete(&self, id: TodoId) -> OpResult {
        OpResult::from_store(&self.store.complete(id), MSG_COMPLETE_OK, MSG_COMPLETE_ERR)
    }

    pub fn delete(&self, id: TodoId) -> OpResult {
        OpResult::from_store(&self.store.delete(id), MSG_DELETE_OK, MSG_DELETE_ERR)
    }

    /// Reconciled search; an ordered set without duplicate ids.
    pub fn search(&self, request: &SearchRequest) -> Vec<Todo> {
        self.store.search(&request.query)
    }
}

#[cfg(test)]
mod tests {
    use super::{OpResult, MSG_CREATE_ERR, MSG_CREATE_OK};
    use crate::store::todo_store::{StoreError, StoreResult};

    #[test]
    fn envelope_maps_store_outcomes() {
        let ok: StoreResult<()> = Ok(());
        let err: StoreResult<()> = Err(StoreError::AlreadyExists(1));

        let created = OpResult::from_store(&ok, MSG_CREATE_OK, MSG_CREATE_ERR);
        assert!(created.ok);
        assert_eq!(created.message, "Create successful");

        let rejected = OpResult::from_store(&err, MSG_CREATE_OK, MSG_CREATE_ERR);
        assert!(!rejected.ok);
        assert_eq!(rejected.message, "Error on create");
    }
}
