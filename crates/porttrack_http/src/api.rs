//! Routes, handlers and failure mapping for the container API.
//!
//! Status mapping:
//! - `Validation`, malformed JSON and non-numeric ids -> 400
//! - `NotFound` -> 404
//! - `Persistence` and internal faults -> 500
//!
//! 5xx bodies carry a generic message; the underlying error is only logged.

use crate::ApiState;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use log::{debug, error, info, warn};
use porttrack_core::db::open_db;
use porttrack_core::{
    Container, ContainerId, ContainerPatch, ContainerService, NewContainer, ServiceError,
    ServiceResult, SqliteContainerRepository,
};
use serde::Serialize;

/// Mount point for all container routes.
pub const BASE_PATH: &str = "/container";

const STORAGE_FAILURE_MESSAGE: &str = "container storage is unavailable";

/// Builds the application router.
pub fn app(state: ApiState) -> Router {
    let containers = Router::new()
        .route("/api/v1/create", post(create_container))
        .route("/api/v1/detail/:id", get(container_detail))
        .route("/api/v1/containers", get(list_containers))
        .route("/api/v1/update/:id", put(update_container))
        .route("/api/v1/delete/:id", delete(delete_container));

    Router::new()
        .nest(BASE_PATH, containers)
        .route("/healthz", get(|| async { "ok" }))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorPayload,
}

#[derive(Debug, Serialize)]
struct ErrorPayload {
    code: &'static str,
    message: String,
}

/// Failure response carrying status, stable code and message.
///
/// `detail` is what gets logged; `message` is what the client sees. They
/// differ only for server errors.
#[derive(Debug, Clone)]
pub struct ApiFailure {
    status: StatusCode,
    code: &'static str,
    message: String,
    detail: String,
}

impl ApiFailure {
    fn client(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            status,
            code,
            detail: message.clone(),
            message,
        }
    }

    fn server(code: &'static str, detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code,
            message: STORAGE_FAILURE_MESSAGE.to_string(),
            detail: detail.into(),
        }
    }

    fn invalid_json(rejection: &JsonRejection) -> Self {
        Self::client(StatusCode::BAD_REQUEST, "invalid_json", rejection.body_text())
    }

    fn invalid_id(rejection: &PathRejection) -> Self {
        Self::client(StatusCode::BAD_REQUEST, "invalid_id", rejection.body_text())
    }

    fn internal(detail: impl Into<String>) -> Self {
        Self::server("internal", detail)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    /// Client-facing message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Emits the outcome event for `event` and passes the failure through.
    fn logged(self, event: &str, id: Option<ContainerId>) -> Self {
        let id = id.map_or_else(|| "-".to_string(), |id| id.to_string());
        if self.status.is_server_error() {
            error!(
                "event={event} module=http status=error http_status={} error_code={} id={id} error={}",
                self.status.as_u16(),
                self.code,
                self.detail
            );
        } else {
            warn!(
                "event={event} module=http status=rejected http_status={} error_code={} id={id} error={}",
                self.status.as_u16(),
                self.code,
                self.detail
            );
        }
        self
    }
}

impl From<ServiceError> for ApiFailure {
    fn from(value: ServiceError) -> Self {
        let message = value.to_string();
        match value {
            ServiceError::Validation(_) => {
                Self::client(StatusCode::BAD_REQUEST, "validation_failed", message)
            }
            ServiceError::NotFound(_) => {
                Self::client(StatusCode::NOT_FOUND, "not_found", message)
            }
            ServiceError::Persistence(_) => Self::server("persistence_failed", message),
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorPayload {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

async fn create_container(
    State(state): State<ApiState>,
    payload: Result<Json<NewContainer>, JsonRejection>,
) -> Result<(StatusCode, Json<Container>), ApiFailure> {
    const EVENT: &str = "container_create";

    let Json(input) =
        payload.map_err(|rejection| ApiFailure::invalid_json(&rejection).logged(EVENT, None))?;
    let created = with_container_service(&state, move |service| service.create(input))
        .await
        .map_err(|failure| failure.logged(EVENT, None))?;

    info!(
        "event={EVENT} module=http status=ok id={} status_value={}",
        created.id, created.status
    );
    note_unknown_status(EVENT, &created);
    Ok((StatusCode::CREATED, Json(created)))
}

async fn container_detail(
    State(state): State<ApiState>,
    path: Result<Path<ContainerId>, PathRejection>,
) -> Result<Json<Container>, ApiFailure> {
    const EVENT: &str = "container_detail";

    let id = path_id(path, EVENT)?;

    let found = with_container_service(&state, move |service| service.get(id))
        .await
        .map_err(|failure| failure.logged(EVENT, Some(id)))?;

    found
        .map(Json)
        .ok_or_else(|| ApiFailure::from(ServiceError::NotFound(id)).logged(EVENT, Some(id)))
}

async fn list_containers(
    State(state): State<ApiState>,
) -> Result<Json<Vec<Container>>, ApiFailure> {
    const EVENT: &str = "container_list";

    let containers = with_container_service(&state, |service| service.list_all())
        .await
        .map_err(|failure| failure.logged(EVENT, None))?;

    debug!(
        "event={EVENT} module=http status=ok count={}",
        containers.len()
    );
    Ok(Json(containers))
}

async fn update_container(
    State(state): State<ApiState>,
    path: Result<Path<ContainerId>, PathRejection>,
    payload: Result<Json<ContainerPatch>, JsonRejection>,
) -> Result<Json<Container>, ApiFailure> {
    const EVENT: &str = "container_update";

    let id = path_id(path, EVENT)?;

    let Json(patch) =
        payload.map_err(|rejection| ApiFailure::invalid_json(&rejection).logged(EVENT, Some(id)))?;
    let updated = with_container_service(&state, move |service| service.update(id, &patch))
        .await
        .map_err(|failure| failure.logged(EVENT, Some(id)))?;

    info!(
        "event={EVENT} module=http status=ok id={} status_value={}",
        updated.id, updated.status
    );
    note_unknown_status(EVENT, &updated);
    Ok(Json(updated))
}

async fn delete_container(
    State(state): State<ApiState>,
    path: Result<Path<ContainerId>, PathRejection>,
) -> Result<StatusCode, ApiFailure> {
    const EVENT: &str = "container_delete";

    let id = path_id(path, EVENT)?;

    with_container_service(&state, move |service| service.delete(id))
        .await
        .map_err(|failure| failure.logged(EVENT, Some(id)))?;

    info!("event={EVENT} module=http status=ok id={id}");
    Ok(StatusCode::NO_CONTENT)
}

/// Runs one service call against a fresh connection on the blocking pool.
async fn with_container_service<T, F>(state: &ApiState, f: F) -> Result<T, ApiFailure>
where
    T: Send + 'static,
    F: FnOnce(&ContainerService<SqliteContainerRepository<'_>>) -> ServiceResult<T>
        + Send
        + 'static,
{
    let db_path = state.db_path().to_path_buf();
    let outcome = tokio::task::spawn_blocking(move || -> Result<T, ApiFailure> {
        let conn = open_db(&db_path)
            .map_err(|err| ApiFailure::internal(format!("database open failed: {err}")))?;
        let repo = SqliteContainerRepository::try_new(&conn)
            .map_err(|err| ApiFailure::internal(format!("repository init failed: {err}")))?;
        let service = ContainerService::new(repo);
        f(&service).map_err(ApiFailure::from)
    })
    .await;

    match outcome {
        Ok(result) => result,
        Err(err) => Err(ApiFailure::internal(format!("blocking task failed: {err}"))),
    }
}

fn path_id(
    path: Result<Path<ContainerId>, PathRejection>,
    event: &str,
) -> Result<ContainerId, ApiFailure> {
    path.map(|Path(id)| id)
        .map_err(|rejection| ApiFailure::invalid_id(&rejection).logged(event, None))
}

fn note_unknown_status(event: &str, container: &Container) {
    if container.known_status().is_none() {
        debug!(
            "event={event} module=http status=ok id={} status_known=false status_value={}",
            container.id, container.status
        );
    }
}
