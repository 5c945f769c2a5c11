use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use super::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    model_loaded: bool,
    scaler_loaded: bool,
    timestamp: chrono::DateTime<chrono::Utc>,
}

/// GET /health - Service and model status
///
/// Always 200; a missing model is reported rather than failing the probe.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let artifacts = state.engine.artifacts();
    Json(HealthResponse {
        status: "healthy",
        model_loaded: artifacts.is_some(),
        scaler_loaded: artifacts.is_some_and(|a| a.scaler().is_some()),
        timestamp: chrono::Utc::now(),
    })
}

/// GET /health/live - Liveness probe
pub async fn liveness_check() -> impl IntoResponse {
    StatusCode::OK
}
