//! Container repository contract with SQLite and in-memory implementations.
//!
//! # Responsibility
//! - Provide insert/save/find/list/delete over the `container` table.
//! - Assign identifiers on insert.
//!
//! # Invariants
//! - Write paths call `validate()` before any mutation.
//! - Read paths reject invalid persisted rows instead of masking them.
//! - Both implementations list containers in ascending id order.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::container::{Container, ContainerDraft, ContainerId, ContainerValidationError};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard, PoisonError};

const CONTAINER_TABLE: &str = "container";
const REQUIRED_COLUMNS: &[&str] = &["id", "code", "status"];
const CONTAINER_SELECT_SQL: &str = "SELECT id, code, status FROM container";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for container persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ContainerValidationError),
    Db(DbError),
    NotFound(ContainerId),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "container not found: {id}"),
            Self::InvalidData(message) => {
                write!(f, "invalid persisted container data: {message}")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} is behind required {expected_version}; open it through db::open_db"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ContainerValidationError> for RepoError {
    fn from(value: ContainerValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage port for container records.
pub trait ContainerRepository {
    /// Persists a new container and returns it with its assigned id.
    fn insert_container(&self, draft: &ContainerDraft) -> RepoResult<Container>;
    /// Overwrites an existing container; `NotFound` when the id has no row.
    fn save_container(&self, container: &Container) -> RepoResult<Container>;
    fn find_container(&self, id: ContainerId) -> RepoResult<Option<Container>>;
    fn list_containers(&self) -> RepoResult<Vec<Container>>;
    /// Removes a container; `NotFound` when the id has no row.
    fn delete_container(&self, id: ContainerId) -> RepoResult<()>;
}

impl<T: ContainerRepository + ?Sized> ContainerRepository for &T {
    fn insert_container(&self, draft: &ContainerDraft) -> RepoResult<Container> {
        (**self).insert_container(draft)
    }

    fn save_container(&self, container: &Container) -> RepoResult<Container> {
        (**self).save_container(container)
    }

    fn find_container(&self, id: ContainerId) -> RepoResult<Option<Container>> {
        (**self).find_container(id)
    }

    fn list_containers(&self) -> RepoResult<Vec<Container>> {
        (**self).list_containers()
    }

    fn delete_container(&self, id: ContainerId) -> RepoResult<()> {
        (**self).delete_container(id)
    }
}

/// SQLite-backed container repository.
pub struct SqliteContainerRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteContainerRepository<'conn> {
    /// Wraps a connection after checking it carries the container schema.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` for a malformed schema.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let expected_version = latest_version();
        let actual_version = current_user_version(conn)?;
        if actual_version < expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }

        ensure_schema(conn)?;
        Ok(Self { conn })
    }
}

impl ContainerRepository for SqliteContainerRepository<'_> {
    fn insert_container(&self, draft: &ContainerDraft) -> RepoResult<Container> {
        draft.validate()?;

        self.conn.execute(
            "INSERT INTO container (code, status) VALUES (?1, ?2);",
            params![draft.code.as_str(), draft.status.as_str()],
        )?;

        let id = self.conn.last_insert_rowid();
        Ok(draft.clone().into_container(id)?)
    }

    fn save_container(&self, container: &Container) -> RepoResult<Container> {
        container.validate()?;

        let changed = self.conn.execute(
            "UPDATE container SET code = ?1, status = ?2 WHERE id = ?3;",
            params![
                container.code.as_str(),
                container.status.as_str(),
                container.id
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(container.id));
        }

        Ok(container.clone())
    }

    fn find_container(&self, id: ContainerId) -> RepoResult<Option<Container>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CONTAINER_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_container_row(row)?)),
            None => Ok(None),
        }
    }

    fn list_containers(&self) -> RepoResult<Vec<Container>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CONTAINER_SELECT_SQL} ORDER BY id ASC;"))?;

        let mut rows = stmt.query([])?;
        let mut containers = Vec::new();
        while let Some(row) = rows.next()? {
            containers.push(parse_container_row(row)?);
        }

        Ok(containers)
    }

    fn delete_container(&self, id: ContainerId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM container WHERE id = ?1;", [id])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }
}

fn ensure_schema(conn: &Connection) -> RepoResult<()> {
    let table: Option<String> = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1;",
            [CONTAINER_TABLE],
            |row| row.get(0),
        )
        .optional()?;
    if table.is_none() {
        return Err(RepoError::MissingRequiredTable(CONTAINER_TABLE));
    }

    let mut stmt = conn.prepare(&format!("PRAGMA table_info({CONTAINER_TABLE});"))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>("name"))?
        .collect::<Result<Vec<_>, _>>()?;

    for &column in REQUIRED_COLUMNS {
        if !columns.iter().any(|name| name == column) {
            return Err(RepoError::MissingRequiredColumn {
                table: CONTAINER_TABLE,
                column,
            });
        }
    }

    Ok(())
}

fn parse_container_row(row: &Row<'_>) -> RepoResult<Container> {
    let id: ContainerId = row.get("id")?;
    let code: Option<String> = row.get("code")?;
    let status: Option<String> = row.get("status")?;

    let code = code.ok_or_else(|| {
        RepoError::InvalidData(format!("null code for id {id} in container.code"))
    })?;
    let status = status.ok_or_else(|| {
        RepoError::InvalidData(format!("null status for id {id} in container.status"))
    })?;

    Container::new(id, code, status)
        .map_err(|err| RepoError::InvalidData(format!("container {id}: {err}")))
}

/// Process-local container store, mainly for tests and embedding.
///
/// Ids start at 1 and are never reused, matching SQLite `AUTOINCREMENT`.
#[derive(Debug)]
pub struct InMemoryContainerRepository {
    inner: Mutex<InMemoryState>,
}

#[derive(Debug)]
struct InMemoryState {
    next_id: ContainerId,
    rows: BTreeMap<ContainerId, Container>,
}

impl Default for InMemoryContainerRepository {
    fn default() -> Self {
        Self {
            inner: Mutex::new(InMemoryState {
                next_id: 1,
                rows: BTreeMap::new(),
            }),
        }
    }
}

impl InMemoryContainerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored containers.
    pub fn len(&self) -> usize {
        self.state().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().rows.is_empty()
    }

    fn state(&self) -> MutexGuard<'_, InMemoryState> {
        // Rows are replaced whole; a poisoned guard still holds valid data.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ContainerRepository for InMemoryContainerRepository {
    fn insert_container(&self, draft: &ContainerDraft) -> RepoResult<Container> {
        draft.validate()?;

        let mut state = self.state();
        let container = draft.clone().into_container(state.next_id)?;
        state.next_id += 1;
        state.rows.insert(container.id, container.clone());
        Ok(container)
    }

    fn save_container(&self, container: &Container) -> RepoResult<Container> {
        container.validate()?;

        let mut state = self.state();
        match state.rows.get_mut(&container.id) {
            Some(stored) => {
                *stored = container.clone();
                Ok(container.clone())
            }
            None => Err(RepoError::NotFound(container.id)),
        }
    }

    fn find_container(&self, id: ContainerId) -> RepoResult<Option<Container>> {
        Ok(self.state().rows.get(&id).cloned())
    }

    fn list_containers(&self) -> RepoResult<Vec<Container>> {
        Ok(self.state().rows.values().cloned().collect())
    }

    fn delete_container(&self, id: ContainerId) -> RepoResult<()> {
        match self.state().rows.remove(&id) {
            Some(_) => Ok(()),
            None => Err(RepoError::NotFound(id)),
        }
    }
}
