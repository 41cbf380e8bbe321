use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use cinedex_core::error::ApiError;
use cinedex_core::types::{JobStatus, LibraryKind, ScanMode};
use cinedex_db::repo::libraries::{self, LibraryRow};
use cinedex_scanner::ScanJob;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::library_scan::enqueue_library_scan;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_router() -> Router<AppState> {
    Router::new()
        // Libraries
        .route("/libraries", post(create_library).get(list_libraries))
        .route("/libraries/{id}", get(get_library).patch(update_library))
        .route("/libraries/{id}/scan", post(scan_library))
        .route("/libraries/{id}/rescan", post(rescan_library))
        // Scan jobs
        .route("/scans", get(list_scans))
        .route("/scans/{job_id}", get(get_scan))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    sqlx::query("SELECT 1")
        .execute(&state.db)
        .await
        .map_err(|e| ApiError::Internal(format!("database check failed: {e}")))?;

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
    }))
}

// ---------------------------------------------------------------------------
// Libraries
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct CreateLibraryRequest {
    name: Option<String>,
    kind: Option<String>,
    path: Option<String>,
}

fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("{field} is required")))
}

async fn create_library(
    State(state): State<AppState>,
    Json(body): Json<CreateLibraryRequest>,
) -> Result<(StatusCode, Json<LibraryRow>), AppError> {
    let name = required(body.name, "name")?;
    let kind = required(body.kind, "kind")?;
    let path = required(body.path, "path")?;

    let kind = LibraryKind::parse(&kind).ok_or_else(|| {
        ApiError::BadRequest("kind must be one of 'movies', 'series', 'anime', 'other'".into())
    })?;
    if !std::path::Path::new(&path).is_dir() {
        return Err(ApiError::BadRequest(format!("path {path} is not a directory")).into());
    }

    let lib = libraries::create_library(&state.db, &name, kind, &path).await?;
    tracing::info!(library_id = %lib.id, kind = %kind, path = %lib.path, "library created");

    Ok((StatusCode::CREATED, Json(lib)))
}

async fn list_libraries(State(state): State<AppState>) -> Result<Json<Vec<LibraryRow>>, AppError> {
    Ok(Json(libraries::list_libraries(&state.db).await?))
}

async fn load_library(state: &AppState, id: &str) -> Result<LibraryRow, AppError> {
    libraries::get_library(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("library not found".into()).into())
}

async fn get_library(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LibraryRow>, AppError> {
    Ok(Json(load_library(&state, &id).await?))
}

#[derive(Deserialize)]
struct UpdateLibraryRequest {
    name: Option<String>,
}

async fn update_library(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateLibraryRequest>,
) -> Result<Json<LibraryRow>, AppError> {
    let name = required(body.name, "name")?;

    if !libraries::update_library(&state.db, &id, &name).await? {
        return Err(ApiError::NotFound("library not found".into()).into());
    }

    Ok(Json(load_library(&state, &id).await?))
}

// ---------------------------------------------------------------------------
// Scans
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ScanAccepted {
    job_id: String,
    status: JobStatus,
}

async fn start_scan(
    state: &AppState,
    id: &str,
    mode: ScanMode,
) -> Result<(StatusCode, Json<ScanAccepted>), AppError> {
    let lib = load_library(state, id).await?;
    let job = enqueue_library_scan(state, lib, mode).await;

    Ok((
        StatusCode::ACCEPTED,
        Json(ScanAccepted {
            job_id: job.id,
            status: job.status,
        }),
    ))
}

async fn scan_library(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<ScanAccepted>), AppError> {
    start_scan(&state, &id, ScanMode::Incremental).await
}

async fn rescan_library(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<ScanAccepted>), AppError> {
    start_scan(&state, &id, ScanMode::Rescan).await
}

async fn list_scans(State(state): State<AppState>) -> Json<Vec<ScanJob>> {
    Json(state.jobs.list().await)
}

async fn get_scan(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<ScanJob>, AppError> {
    let job = state
        .jobs
        .get(&job_id)
        .await
        .ok_or_else(|| ApiError::NotFound("scan job not found".into()))?;

    Ok(Json(job))
}
