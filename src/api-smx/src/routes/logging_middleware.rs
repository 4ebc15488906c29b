use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// Middleware that logs each route access with its result
pub async fn log_route_access(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    let duration_ms = start.elapsed().as_millis();
    let status = response.status().as_u16();

    match status {
        400..=499 => tracing::warn!(method = %method, path = %path, status = %status, duration_ms = %duration_ms),
        500..=599 => tracing::error!(method = %method, path = %path, status = %status, duration_ms = %duration_ms),
        _ => tracing::info!(method = %method, path = %path, status = %status, duration_ms = %duration_ms),
    }

    response
}
