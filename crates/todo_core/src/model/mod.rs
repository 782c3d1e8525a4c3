//! Domain model for todo records.
//!
//! # Responsibility
//! - Define the single entity handled by core.
//!
//! # Invariants
//! - Every todo is identified by a creator-assigned `TodoId`.
//! - Identity, not field equality, decides whether two records are the same.

pub mod todo;
