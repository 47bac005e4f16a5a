//! Core domain logic for port container tracking.
//! This crate is the single source of truth for container invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::container::{
    Container, ContainerDraft, ContainerId, ContainerPatch, ContainerStatus,
    ContainerValidationError, NewContainer,
};
pub use repo::container_repo::{
    ContainerRepository, InMemoryContainerRepository, RepoError, RepoResult,
    SqliteContainerRepository,
};
pub use service::container_service::{ContainerService, ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
