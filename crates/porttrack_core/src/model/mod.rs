//! Domain model for tracked shipping containers.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Own field-level validation and the partial-update merge rule.
//!
//! # Invariants
//! - A persisted container always has a positive id and non-empty
//!   `code`/`status`.
//! - Status values are not restricted to the known set.

pub mod container;
