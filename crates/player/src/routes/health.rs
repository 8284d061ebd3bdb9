use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;
use crate::sync::MenuStatus;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok` when a menu is showing without advisories.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    pub menu: MenuStatus,
}

/// GET /health -- returns service and menu data health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let menu = state.sync.current().status();
    let status = match &menu {
        MenuStatus::Ready { advisory: None } => "ok",
        _ => "degraded",
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        menu,
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
