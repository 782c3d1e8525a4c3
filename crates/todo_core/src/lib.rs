//! Core domain logic for the todo service.
//! This crate owns the canonical todo collection and keeps a full-text
//! index coherent with it.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod search;
pub mod service;
pub mod store;

pub use config::{ConfigError, TodoConfig};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::todo::{same_identity, sample_todos, Todo, TodoId};
pub use search::fts::SqliteSearchIndex;
pub use search::index::{IndexError, IndexResult, IndexWrite, Revision, SearchIndex};
pub use service::todo_service::{OpResult, SearchRequest, TodoService};
pub use store::todo_store::{StoreError, StoreResult, TodoStore};

