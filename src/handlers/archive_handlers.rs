//! HTTP handlers for triggering archival runs and recoveries.
//!
//! Thin invokers only: they supply a scope and report the run summary;
//! every pipeline concern lives in the services.

use crate::{
    errors::AppError,
    handlers::AppState,
    services::pipeline::{RunScope, RunSummary},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Request body for `POST /archive/runs`.
#[derive(Debug, Deserialize)]
pub struct ArchiveRunRequest {
    /// Archive the entire corpus (traversal is skipped).
    #[serde(default)]
    pub all: bool,

    /// Root container ids to expand and archive. Ignored when `all` is set.
    #[serde(default)]
    pub roots: Vec<i64>,
}

/// `POST /archive/runs` — run one archival batch and report the summary.
pub async fn start_archive_run(
    State(state): State<AppState>,
    Json(req): Json<ArchiveRunRequest>,
) -> Result<Json<RunSummary>, AppError> {
    let scope = if req.all {
        RunScope::All
    } else if !req.roots.is_empty() {
        RunScope::Roots(req.roots)
    } else {
        return Err(AppError::new(
            StatusCode::BAD_REQUEST,
            "request must set `all` or provide `roots`",
        ));
    };

    let cancel = CancellationToken::new();
    let summary = state.pipeline.run(scope, &cancel).await?;
    Ok(Json(summary))
}

#[derive(Debug, Serialize)]
pub struct RecoverResponse {
    pub asset_id: i64,
}

/// `POST /containers/{id}/recover` — reconstruct a local copy of an archived
/// container's original asset.
pub async fn recover_container(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<RecoverResponse>, AppError> {
    let asset_id = state.recovery.recover(id).await?;
    Ok(Json(RecoverResponse { asset_id }))
}
