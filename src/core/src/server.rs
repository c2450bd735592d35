use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use linebook_protocol::{
    ErrorBody, LineRecord, PhoneCheck, PhoneInput, PoolResponse, PoolValue, ProtocolError, Role,
    SubmitResponse, ViewQuery, ViewResponse,
};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::error::LineBookError;
use crate::lines::view::today_local;
use crate::lines::{is_valid_phone_number, normalize_phone_input, LineBook, ViewRequest};

/// Shared state accessible by handlers.
#[derive(Clone)]
pub(crate) struct AppState {
    pub config: ServerConfig,
    pub book: Arc<Mutex<LineBook>>,
}

impl AppState {
    fn book(&self) -> Result<MutexGuard<'_, LineBook>, ApiError> {
        self.book
            .lock()
            .map_err(|e| ApiError::Internal(format!("lock: {e}")))
    }
}

/// Build the axum router exposing the line book's commands.
///
/// The book is the single resident store; requests are serialized through
/// its mutex.
pub fn build_router(config: ServerConfig, book: LineBook) -> Router {
    let state = AppState {
        config,
        book: Arc::new(Mutex::new(book)),
    };

    Router::new()
        .route("/health", get(health))
        .route("/lines", get(list_lines).post(submit_line))
        .route("/lines/{id}", get(get_line).delete(delete_line))
        .route("/lines/{id}/toggle", post(toggle_line))
        .route("/lines/{id}/duplicate", get(duplicate_line))
        .route("/pools/{role}", get(get_pool).post(add_pool_entry))
        .route("/pools/{role}/{value}", delete(delete_pool_entry))
        .route("/phone/normalize", post(normalize_phone))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug)]
pub(crate) enum ApiError {
    BadRequest(String),
    NotFound(String),
    Invalid(String),
    Internal(String),
}

impl From<ProtocolError> for ApiError {
    fn from(err: ProtocolError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<LineBookError> for ApiError {
    fn from(err: LineBookError) -> Self {
        match err {
            LineBookError::InvalidPhoneNumber { .. } => Self::Invalid(err.to_string()),
            LineBookError::Storage(_) | LineBookError::Config(_) => Self::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            Self::NotFound(m) => (StatusCode::NOT_FOUND, m),
            Self::Invalid(m) => (StatusCode::UNPROCESSABLE_ENTITY, m),
            Self::Internal(m) => {
                tracing::error!(error = %m, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, m)
            }
        };
        (status, Json(ErrorBody::new(message))).into_response()
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn list_lines(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> Result<Json<ViewResponse>, ApiError> {
    let request = ViewRequest {
        search: query.search.clone(),
        filter: query.filter_spec()?,
        sort: query.sort_spec(state.config.default_sort)?,
    };
    let book = state.book()?;
    Ok(Json(ViewResponse {
        lines: book.view(&request, today_local()),
        choices: book.filter_choices(),
    }))
}

async fn submit_line(
    State(state): State<AppState>,
    Json(form): Json<LineRecord>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let id = state.book()?.submit(form)?;
    Ok(Json(SubmitResponse { id }))
}

async fn get_line(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LineRecord>, ApiError> {
    let mut book = state.book()?;
    let line = book
        .get(&id)
        .cloned()
        .ok_or_else(|| ApiError::NotFound(format!("unknown line: {id}")))?;
    book.seed_for_edit(&line)?;
    Ok(Json(line))
}

async fn delete_line(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.book()?.delete(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn toggle_line(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.book()?.toggle_flag(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn duplicate_line(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LineRecord>, ApiError> {
    let mut book = state.book()?;
    let seed = book
        .duplicate(&id)
        .ok_or_else(|| ApiError::NotFound(format!("unknown line: {id}")))?;
    book.seed_for_edit(&seed)?;
    Ok(Json(seed))
}

async fn get_pool(
    State(state): State<AppState>,
    Path(role): Path<String>,
) -> Result<Json<PoolResponse>, ApiError> {
    let role: Role = role.parse()?;
    let book = state.book()?;
    Ok(Json(pool_response(&book, role)))
}

async fn add_pool_entry(
    State(state): State<AppState>,
    Path(role): Path<String>,
    Json(body): Json<PoolValue>,
) -> Result<Json<PoolResponse>, ApiError> {
    let role: Role = role.parse()?;
    let mut book = state.book()?;
    book.ensure_pool_membership(role, &body.value)?;
    Ok(Json(pool_response(&book, role)))
}

async fn delete_pool_entry(
    State(state): State<AppState>,
    Path((role, value)): Path<(String, String)>,
) -> Result<Json<PoolResponse>, ApiError> {
    let role: Role = role.parse()?;
    let mut book = state.book()?;
    book.delete_from_pool(role, &value)?;
    Ok(Json(pool_response(&book, role)))
}

async fn normalize_phone(Json(body): Json<PhoneInput>) -> Json<PhoneCheck> {
    let formatted = normalize_phone_input(&body.input);
    let valid = is_valid_phone_number(&formatted);
    Json(PhoneCheck { formatted, valid })
}

fn pool_response(book: &LineBook, role: Role) -> PoolResponse {
    PoolResponse {
        role: role.as_str().to_string(),
        label: role.label().to_string(),
        options: book.pool_options(role),
    }
}
