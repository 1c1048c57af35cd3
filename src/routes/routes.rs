//! Defines routes for the admin trigger surface.
//!
//! ## Structure
//! - `POST /archive/runs`             — run one archival batch (body selects
//!   the entire corpus or a set of root containers)
//! - `POST /containers/{id}/recover`  — reconstruct a local copy of an
//!   archived container's original asset
//! - `GET  /healthz` / `GET /readyz`  — probes

use crate::handlers::{
    AppState,
    archive_handlers::{recover_container, start_archive_run},
    health_handlers::{healthz, readyz},
};
use axum::{
    Router,
    routing::{get, post},
};

/// Build and return the router for the admin API.
///
/// The router carries shared state (`AppState`) to all handlers.
pub fn routes() -> Router<AppState> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // trigger endpoints
        .route("/archive/runs", post(start_archive_run))
        .route("/containers/{id}/recover", post(recover_container))
}
