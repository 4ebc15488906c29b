use axum::http::StatusCode;

/// GET /health - Liveness probe
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "healthy")
}
