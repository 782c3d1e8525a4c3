//! Full-text search index adapter.
//!
//! # Responsibility
//! - Mirror todo content into a free-text index (write-through).
//! - Answer free-text queries with best-effort, possibly stale snapshots.
//!
//! # Invariants
//! - Index failures never reach store callers; they are logged and absorbed.
//! - Index results are candidates only; the store reconciles them.

pub mod fts;
pub mod index;
