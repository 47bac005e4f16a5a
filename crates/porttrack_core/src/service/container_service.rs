//! Container lifecycle service.
//!
//! # Responsibility
//! - Validate create input and apply partial updates.
//! - Turn missing ids into a distinguishable `NotFound` failure.
//!
//! # Invariants
//! - The service holds no state besides its repository and never logs.
//! - Update and delete check existence before writing. The check and the
//!   write are not atomic; concurrent writers to one id are last-write-wins.
//! - Every failure is one of `Validation`, `NotFound` or `Persistence`.

use crate::model::container::{
    Container, ContainerId, ContainerPatch, ContainerValidationError, NewContainer,
};
use crate::repo::container_repo::{ContainerRepository, RepoError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failure kinds surfaced by lifecycle operations.
#[derive(Debug)]
pub enum ServiceError {
    /// A required field is missing or a value breaks record invariants.
    Validation(ContainerValidationError),
    /// The referenced container does not exist.
    NotFound(ContainerId),
    /// Storage failed underneath an otherwise valid operation.
    Persistence(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "invalid container: {err}"),
            Self::NotFound(id) => write!(f, "container with id {id} not found"),
            Self::Persistence(err) => write!(f, "container storage failed: {err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound(_) => None,
            Self::Persistence(err) => Some(err),
        }
    }
}

impl From<ContainerValidationError> for ServiceError {
    fn from(value: ContainerValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Persistence(other),
        }
    }
}

/// Use-case service for the container lifecycle.
pub struct ContainerService<R: ContainerRepository> {
    repo: R,
}

impl<R: ContainerRepository> ContainerService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Validates required fields and persists a new container.
    ///
    /// # Errors
    /// - `Validation` when `code` or `status` is missing or blank.
    /// - `Persistence` when the insert fails.
    pub fn create(&self, input: NewContainer) -> ServiceResult<Container> {
        let draft = input.into_draft()?;
        Ok(self.repo.insert_container(&draft)?)
    }

    /// Looks up one container; absence is `Ok(None)`.
    pub fn get(&self, id: ContainerId) -> ServiceResult<Option<Container>> {
        self.repo.find_container(id).map_err(ServiceError::Persistence)
    }

    /// Lists every stored container in storage order.
    pub fn list_all(&self) -> ServiceResult<Vec<Container>> {
        self.repo.list_containers().map_err(ServiceError::Persistence)
    }

    /// Merges `patch` into the stored container and saves the result.
    ///
    /// An empty patch still re-saves the unchanged record.
    ///
    /// # Errors
    /// - `NotFound` when `id` has no record, whatever the patch holds.
    /// - `Validation` when a present patch value is blank.
    /// - `Persistence` when saving the merged record fails.
    pub fn update(&self, id: ContainerId, patch: &ContainerPatch) -> ServiceResult<Container> {
        let stored = self.require(id)?;
        let merged = stored.merge(patch)?;
        Ok(self.repo.save_container(&merged)?)
    }

    /// Deletes an existing container.
    ///
    /// # Errors
    /// - `NotFound` when `id` has no record; storage is left untouched.
    /// - `Persistence` when the delete fails.
    pub fn delete(&self, id: ContainerId) -> ServiceResult<()> {
        let stored = self.require(id)?;
        Ok(self.repo.delete_container(stored.id)?)
    }

    fn require(&self, id: ContainerId) -> ServiceResult<Container> {
        self.get(id)?.ok_or(ServiceError::NotFound(id))
    }
}
