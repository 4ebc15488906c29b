use std::collections::BTreeMap;

use axum::{Json, extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use core_smx::{InputError, SkippedNode, TraversalResult};

/// Response payload for POST /api/parse_sitemap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseSitemapResponse {
    /// Declared URL count of every sitemap that was resolved
    pub sitemaps: BTreeMap<String, usize>,
    /// URLs that passed the filters, per sitemap
    pub urls: BTreeMap<String, Vec<String>>,
    /// lastmod the parent index declared for a sitemap
    pub lastmod: BTreeMap<String, NaiveDate>,
    pub skipped: Vec<SkippedNode>,
    /// False when the server's run budget cut the traversal short
    pub complete: bool,
}

impl From<TraversalResult> for ParseSitemapResponse {
    fn from(result: TraversalResult) -> Self {
        Self {
            sitemaps: result.metadata,
            urls: result.urls,
            lastmod: result.lastmod,
            skipped: result.skipped,
            complete: result.complete,
        }
    }
}

// API Error Types

/// Error for POST /api/parse_sitemap endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "error", content = "details")]
pub enum ParseSitemapError {
    /// Request body failed validation
    #[serde(rename = "invalid_input")]
    #[error("{0}")]
    InvalidInput(String),
    /// The entry sitemap could not be fetched
    #[serde(rename = "fetch_failed")]
    #[error("{0}")]
    FetchFailed(String),
    /// The entry sitemap is not a sitemap document
    #[serde(rename = "parse_failed")]
    #[error("{0}")]
    ParseFailed(String),
    #[serde(rename = "unknown")]
    #[error("{0}")]
    Unknown(String),
}

impl IntoResponse for ParseSitemapError {
    fn into_response(self) -> axum::response::Response {
        let status = match self {
            ParseSitemapError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ParseSitemapError::ParseFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ParseSitemapError::FetchFailed(_) | ParseSitemapError::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

impl From<InputError> for ParseSitemapError {
    fn from(e: InputError) -> Self {
        ParseSitemapError::InvalidInput(e.to_string())
    }
}

/// A body that is not JSON, not sent as JSON, or has mistyped fields is bad input.
impl From<JsonRejection> for ParseSitemapError {
    fn from(e: JsonRejection) -> Self {
        ParseSitemapError::InvalidInput(e.body_text())
    }
}

impl From<core_smx::Error> for ParseSitemapError {
    fn from(e: core_smx::Error) -> Self {
        match e {
            core_smx::Error::Input(e) => e.into(),
            core_smx::Error::FatalFetch(_) => ParseSitemapError::FetchFailed(e.to_string()),
            core_smx::Error::FatalParse { .. } => ParseSitemapError::ParseFailed(e.to_string()),
            core_smx::Error::Client(_) => ParseSitemapError::Unknown(e.to_string()),
        }
    }
}
