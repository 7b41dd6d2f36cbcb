use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
}

/// Liveness check; touches no dependencies.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}
