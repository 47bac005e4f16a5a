//! Storage port for containers and its implementations.
//!
//! # Responsibility
//! - Define the persistence contract consumed by the lifecycle service.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Writes re-validate records before mutating storage.
//! - Missing rows on save/delete surface as `RepoError::NotFound`.

pub mod container_repo;
