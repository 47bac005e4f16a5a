//! Container domain model.
//!
//! # Responsibility
//! - Define the persisted `Container` record and its create/patch inputs.
//! - Validate required fields and merge sparse patches into stored records.
//!
//! # Invariants
//! - `id` is assigned by storage and never changes afterwards.
//! - `code` and `status` are never empty (after trimming) on a valid record.
//! - `status` may hold any non-empty string; `ContainerStatus` is advisory.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-assigned container identifier.
pub type ContainerId = i64;

/// Known port-processing stages.
///
/// Stored statuses are plain strings; this enum only classifies them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContainerStatus {
    Unloading,
    CustomsClearance,
    Deconsolidation,
    ReadyForPickup,
    PickedUp,
}

impl ContainerStatus {
    /// All known statuses in port-processing order.
    pub const ALL: [ContainerStatus; 5] = [
        ContainerStatus::Unloading,
        ContainerStatus::CustomsClearance,
        ContainerStatus::Deconsolidation,
        ContainerStatus::ReadyForPickup,
        ContainerStatus::PickedUp,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unloading => "UNLOADING",
            Self::CustomsClearance => "CUSTOMS_CLEARANCE",
            Self::Deconsolidation => "DECONSOLIDATION",
            Self::ReadyForPickup => "READY_FOR_PICKUP",
            Self::PickedUp => "PICKED_UP",
        }
    }

    /// Parses the exact wire spelling; no case folding.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
    }
}

impl Display for ContainerStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation failures for container fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerValidationError {
    MissingCode,
    MissingStatus,
    EmptyCode,
    EmptyStatus,
    NonPositiveId(ContainerId),
}

impl Display for ContainerValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingCode => write!(f, "container code is required"),
            Self::MissingStatus => write!(f, "container status is required"),
            Self::EmptyCode => write!(f, "container code cannot be empty"),
            Self::EmptyStatus => write!(f, "container status cannot be empty"),
            Self::NonPositiveId(id) => write!(f, "container id must be positive, got {id}"),
        }
    }
}

impl Error for ContainerValidationError {}

/// Persisted container record.
///
/// Deserialization goes through `Container::new`, so a decoded record always
/// satisfies `validate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ContainerRecord")]
pub struct Container {
    pub id: ContainerId,
    /// Physical container identifier, e.g. `MSCU1234567`.
    pub code: String,
    /// Processing status; usually one of `ContainerStatus`.
    pub status: String,
}

#[derive(Deserialize)]
struct ContainerRecord {
    id: ContainerId,
    code: String,
    status: String,
}

impl TryFrom<ContainerRecord> for Container {
    type Error = ContainerValidationError;

    fn try_from(record: ContainerRecord) -> Result<Self, Self::Error> {
        Container::new(record.id, record.code, record.status)
    }
}

impl Container {
    /// Builds a validated record for an already-assigned id.
    pub fn new(
        id: ContainerId,
        code: impl Into<String>,
        status: impl Into<String>,
    ) -> Result<Self, ContainerValidationError> {
        let container = Self {
            id,
            code: code.into(),
            status: status.into(),
        };
        container.validate()?;
        Ok(container)
    }

    /// Validates record invariants.
    ///
    /// # Errors
    /// - `NonPositiveId` when `id <= 0`.
    /// - `EmptyCode` / `EmptyStatus` for blank fields.
    pub fn validate(&self) -> Result<(), ContainerValidationError> {
        if self.id <= 0 {
            return Err(ContainerValidationError::NonPositiveId(self.id));
        }
        check_code(&self.code)?;
        check_status(&self.status)
    }

    /// Applies a sparse patch and returns the merged record.
    ///
    /// Fields absent from `patch` keep their stored value. `self` is left
    /// untouched, so a failed merge never leaves a half-applied record.
    ///
    /// # Errors
    /// - `EmptyCode` / `EmptyStatus` when a present patch value is blank.
    pub fn merge(&self, patch: &ContainerPatch) -> Result<Container, ContainerValidationError> {
        let mut merged = self.clone();
        if let Some(code) = &patch.code {
            check_code(code)?;
            merged.code = code.clone();
        }
        if let Some(status) = &patch.status {
            check_status(status)?;
            merged.status = status.clone();
        }
        Ok(merged)
    }

    /// Returns the known status this record carries, if any.
    pub fn known_status(&self) -> Option<ContainerStatus> {
        ContainerStatus::parse(&self.status)
    }
}

/// Validated container that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerDraft {
    pub code: String,
    pub status: String,
}

impl ContainerDraft {
    pub fn new(
        code: impl Into<String>,
        status: impl Into<String>,
    ) -> Result<Self, ContainerValidationError> {
        let draft = Self {
            code: code.into(),
            status: status.into(),
        };
        draft.validate()?;
        Ok(draft)
    }

    pub fn validate(&self) -> Result<(), ContainerValidationError> {
        check_code(&self.code)?;
        check_status(&self.status)
    }

    /// Attaches a storage-assigned id.
    pub fn into_container(self, id: ContainerId) -> Result<Container, ContainerValidationError> {
        Container::new(id, self.code, self.status)
    }
}

/// Create request as received from callers; fields may be missing.
///
/// Unknown fields (including a client-supplied `id`) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContainer {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl NewContainer {
    pub fn new(code: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            status: Some(status.into()),
        }
    }

    /// Checks required fields and converts into a draft.
    ///
    /// `code` is checked before `status`.
    pub fn into_draft(self) -> Result<ContainerDraft, ContainerValidationError> {
        let code = self.code.ok_or(ContainerValidationError::MissingCode)?;
        check_code(&code)?;
        let status = self.status.ok_or(ContainerValidationError::MissingStatus)?;
        ContainerDraft::new(code, status)
    }
}

/// Sparse update; `None` means "keep the stored value".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerPatch {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl ContainerPatch {
    pub fn code(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            status: None,
        }
    }

    pub fn status(status: impl Into<String>) -> Self {
        Self {
            code: None,
            status: Some(status.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_none() && self.status.is_none()
    }
}

fn check_code(code: &str) -> Result<(), ContainerValidationError> {
    if code.trim().is_empty() {
        return Err(ContainerValidationError::EmptyCode);
    }
    Ok(())
}

fn check_status(status: &str) -> Result<(), ContainerValidationError> {
    if status.trim().is_empty() {
        return Err(ContainerValidationError::EmptyStatus);
    }
    Ok(())
}
