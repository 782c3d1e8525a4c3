//! Core use-case services.
//!
//! # Responsibility
//! - Wrap store calls into the boundary contract used by transport layers.
//! - Keep HTTP/CLI layers decoupled from store error types.

pub mod todo_service;
