//! Validation of user-supplied traversal requests (CLI arguments or a JSON body).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::InputError;
use crate::filter::{ContentFilter, FilterCriteria};

/// Raw request fields, exactly as a caller supplied them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraversalRequest {
    pub sitemap_url: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub content_filter: Option<String>,
    /// Host nested sitemaps must belong to; defaults to the sitemap URL's host
    pub domain: Option<String>,
}

/// A request that is safe to hand to the traversal engine.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    pub entry: Url,
    pub criteria: FilterCriteria,
}

impl TraversalRequest {
    /// Checks the URL, both dates (`YYYY-MM-DD`, start not after end) and the optional domain,
    /// and compiles the content filter.
    ///
    /// # Errors
    ///
    /// Returns the first problem found, in field order.
    pub fn validate(&self) -> Result<ValidatedRequest, InputError> {
        let raw_url = self
            .sitemap_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(InputError::MissingUrl)?;
        let entry = is_valid_sitemap_url(raw_url)?;

        let start = parse_date("start_date", self.start_date.as_deref())?;
        let end = parse_date("end_date", self.end_date.as_deref())?;
        if start > end {
            return Err(InputError::StartAfterEnd { start, end });
        }

        let content = ContentFilter::new(self.content_filter.as_deref().unwrap_or_default()).map_err(|e| {
            InputError::InvalidContentFilter(e.to_string())
        })?;

        let mut criteria = FilterCriteria::new(start, end).with_content(content);
        if let Some(domain) = self.domain.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            criteria = criteria.with_domain(&parse_domain(domain)?);
        }

        Ok(ValidatedRequest { entry, criteria })
    }
}

/// Validates that the input is an absolute http(s) URL with a host.
pub fn is_valid_sitemap_url(url: &str) -> Result<Url, InputError> {
    let parsed = Url::parse(url).map_err(|e| InputError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(InputError::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }
    if parsed.host_str().is_none() {
        return Err(InputError::InvalidUrl {
            url: url.to_string(),
            reason: "URL has no host".to_string(),
        });
    }
    Ok(parsed)
}

/// Validates a bare host name such as `blog.example.com`.
pub fn parse_domain(domain: &str) -> Result<String, InputError> {
    let invalid = |reason: String| InputError::InvalidDomain {
        domain: domain.to_string(),
        reason,
    };
    if domain.contains(['/', ':', ' ']) {
        return Err(invalid("expected a host name, without scheme, port or path".to_string()));
    }
    let host = url::Host::parse(domain).map_err(|e| invalid(e.to_string()))?;
    Ok(host.to_string())
}

/// Parses a strict `YYYY-MM-DD` date.
pub fn parse_date(field: &'static str, value: Option<&str>) -> Result<NaiveDate, InputError> {
    let value = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(InputError::MissingDate(field))?;
    let invalid = || InputError::InvalidDate {
        field,
        value: value.to_string(),
    };
    if value.len() != 10 {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| invalid())
}
