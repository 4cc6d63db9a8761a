//! # API REST
//!
//! REST API implementation for Be Well.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - Session-id transport via the `x-session-id` header
//! - OpenAPI/Swagger documentation
//! - Serving stored photos at their public URLs
//!
//! Screen logic lives in `bewell-core`; every screen-level failure comes back as a notice on a
//! `200` response. Only transport problems (missing or unknown session, missing photo) use
//! non-2xx statuses.

#![warn(rust_2018_idioms)]

use api_shared::auth::{session_id_from_header, SESSION_HEADER};
use api_shared::{
    AcknowledgeView, Action, ActionReq, CaseDetailsView, CaseSummary, ChildOption,
    CreateSessionRes, EndSessionRes, HealthRes, HealthService, HomeView, LoginView, Notice,
    NoticeLevel, PhotoUpload, ScreenRes, ScreenView, SymptomEntryView,
};
use axum::{
    extract::{Path as AxumPath, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
};
use bewell_core::session::SharedSession;
use bewell_core::{LocalBackend, Router as ScreenRouter, SessionError, SessionId, SessionStore};
use bewell_files::{FilesError, FilesService};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

type ApiError = (StatusCode, &'static str);

/// Application state for the REST API server
///
/// Holds the screen router, the live sessions and the blob store used to serve photos.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<ScreenRouter>,
    pub sessions: Arc<SessionStore>,
    pub files: Arc<FilesService>,
}

impl AppState {
    pub fn new(backend: &LocalBackend) -> Self {
        Self {
            router: Arc::new(ScreenRouter::new(backend.services())),
            sessions: Arc::new(SessionStore::new()),
            files: backend.files.clone(),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        create_session,
        end_session,
        current_screen,
        perform_action,
        photo,
    ),
    components(schemas(
        HealthRes,
        CreateSessionRes,
        EndSessionRes,
        Action,
        ActionReq,
        PhotoUpload,
        Notice,
        NoticeLevel,
        LoginView,
        CaseSummary,
        HomeView,
        ChildOption,
        SymptomEntryView,
        CaseDetailsView,
        AcknowledgeView,
        ScreenView,
        ScreenRes,
    ))
)]
pub struct ApiDoc;

/// Builds the HTTP application.
pub fn app(state: AppState) -> axum::Router {
    axum::Router::new()
        .route("/health", get(health))
        .route("/sessions", post(create_session).delete(end_session))
        .route("/screen", get(current_screen))
        .route("/screen/actions", post(perform_action))
        .route("/photos/*path", get(photo))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn session_id(headers: &HeaderMap) -> Result<SessionId, ApiError> {
    let raw = headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok());
    let raw = session_id_from_header(raw).map_err(|e| {
        tracing::debug!("rejected session header: {}", e);
        (StatusCode::UNAUTHORIZED, "Missing or malformed session id")
    })?;
    SessionId::parse(&raw).map_err(|_| (StatusCode::UNAUTHORIZED, "Unknown session"))
}

fn session_error(e: SessionError) -> ApiError {
    match e {
        SessionError::UnknownSession => (StatusCode::UNAUTHORIZED, "Unknown session"),
        SessionError::LockPoisoned => {
            tracing::error!("Session store error: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        }
    }
}

/// Runs one action with the session locked for the whole render pass.
fn run_action(state: &AppState, shared: &SharedSession, req: ActionReq) -> Result<ScreenRes, ApiError> {
    let mut session = shared.lock().map_err(|_| {
        tracing::error!("Session lock poisoned");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
    })?;
    Ok(state.router.handle(&mut session, req))
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/sessions",
    responses(
        (status = 200, description = "New session on the login screen", body = CreateSessionRes),
        (status = 500, description = "Internal server error")
    )
)]
#[axum::debug_handler]
async fn create_session(
    State(state): State<AppState>,
) -> Result<Json<CreateSessionRes>, ApiError> {
    let id = state.sessions.create().map_err(session_error)?;
    Ok(Json(CreateSessionRes {
        session_id: id.to_string(),
    }))
}

#[utoipa::path(
    delete,
    path = "/sessions",
    params(("x-session-id" = String, Header, description = "Session id from POST /sessions")),
    responses(
        (status = 200, description = "Session signed out and dropped", body = EndSessionRes),
        (status = 401, description = "Missing or unknown session")
    )
)]
#[axum::debug_handler]
async fn end_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<EndSessionRes>, ApiError> {
    let id = session_id(&headers)?;
    let shared = state.sessions.remove(&id).map_err(session_error)?;

    match shared.lock() {
        Ok(mut session) => state.router.end_session(&mut session),
        Err(_) => tracing::warn!("dropping session {} with a poisoned lock", id),
    }

    Ok(Json(EndSessionRes { ended: true }))
}

#[utoipa::path(
    get,
    path = "/screen",
    params(("x-session-id" = String, Header, description = "Session id from POST /sessions")),
    responses(
        (status = 200, description = "Current screen", body = ScreenRes),
        (status = 401, description = "Missing or unknown session")
    )
)]
#[axum::debug_handler]
async fn current_screen(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ScreenRes>, ApiError> {
    let id = session_id(&headers)?;
    let shared = state.sessions.get(&id).map_err(session_error)?;
    let req = ActionReq {
        on_screen: None,
        action: Action::Render,
    };
    run_action(&state, &shared, req).map(Json)
}

#[utoipa::path(
    post,
    path = "/screen/actions",
    params(("x-session-id" = String, Header, description = "Session id from POST /sessions")),
    request_body = ActionReq,
    responses(
        (status = 200, description = "Screen after the action", body = ScreenRes),
        (status = 401, description = "Missing or unknown session")
    )
)]
#[axum::debug_handler]
async fn perform_action(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ActionReq>,
) -> Result<Json<ScreenRes>, ApiError> {
    let id = session_id(&headers)?;
    let shared = state.sessions.get(&id).map_err(session_error)?;
    run_action(&state, &shared, req).map(Json)
}

#[utoipa::path(
    get,
    path = "/photos/{path}",
    params(("path" = String, Path, description = "Stored photo path")),
    responses(
        (status = 200, description = "Photo bytes"),
        (status = 404, description = "No photo at that path")
    )
)]
#[axum::debug_handler]
async fn photo(
    State(state): State<AppState>,
    AxumPath(path): AxumPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    match state.files.read(&path) {
        Ok(stored) => Ok(([(header::CONTENT_TYPE, stored.media_type)], stored.bytes)),
        Err(FilesError::NotFound(_)) | Err(FilesError::InvalidPath(_)) => {
            Err((StatusCode::NOT_FOUND, "Photo not found"))
        }
        Err(e) => {
            tracing::error!("Read photo error: {:?}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Internal error"))
        }
    }
}
