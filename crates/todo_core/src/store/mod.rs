//! Authoritative store layer.
//!
//! # Responsibility
//! - Hold the canonical todo collection and its consistency rules.
//! - Drive write-through indexing and read-time reconciliation.
//!
//! # Invariants
//! - Store APIs return semantic errors (`NotFound`, `AlreadyDone`, ...);
//!   index failures never surface here.

pub mod todo_store;
