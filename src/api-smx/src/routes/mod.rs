use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use core_smx::{HttpFetcher, Traverser};

pub mod health;
pub mod logging_middleware;
pub mod parse_sitemap;

/// Traversal engine shared by every request handler.
pub type SharedTraverser = Arc<Traverser<HttpFetcher>>;

//
// Router
//

pub fn router() -> Router<SharedTraverser> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/parse_sitemap", post(parse_sitemap::post_parse_sitemap))
        // Paths used by earlier front ends
        .route("/parse_sitemap", post(parse_sitemap::post_parse_sitemap))
        .route("/fetch_sitemap", post(parse_sitemap::post_parse_sitemap))
        .route("/crawl", post(parse_sitemap::post_parse_sitemap))
        // Custom route access logging
        .layer(middleware::from_fn(logging_middleware::log_route_access))
        // Tracing middleware
        .layer(TraceLayer::new_for_http())
}
