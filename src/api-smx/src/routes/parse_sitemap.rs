use axum::{
    extract::{Json, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

use core_smx::TraversalRequest;

use crate::models::{ParseSitemapError, ParseSitemapResponse};
use crate::routes::SharedTraverser;

/// POST /api/parse_sitemap - Resolve a sitemap index into filtered URLs
///
/// Nested sitemaps that fail are reported under `skipped`; only a bad request body
/// or a failure on the entry sitemap itself is an error response.
pub async fn post_parse_sitemap(
    State(traverser): State<SharedTraverser>,
    payload: Result<Json<TraversalRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ParseSitemapError> {
    let Json(payload) = payload?;
    let validated = payload.validate()?;
    tracing::debug!("Parsing sitemap {} for {:?}", validated.entry, payload);

    let result = traverser
        .traverse(validated.entry.as_str(), &validated.criteria)
        .await
        .inspect_err(|e| tracing::error!("Sitemap {} failed: {}", validated.entry, e))?;

    Ok((StatusCode::OK, Json(ParseSitemapResponse::from(result))))
}
