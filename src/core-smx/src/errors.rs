//! Error types for sitemap discovery.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors that escape a traversal: bad input, or a failure on the entry point itself.
///
/// Failures on nested sitemaps never surface here; they are absorbed into
/// [`crate::TraversalResult::skipped`].
#[derive(Debug, Error)]
pub enum Error {
    /// Request was rejected before any fetch was issued
    #[error("Invalid input: {0}")]
    Input(#[from] InputError),

    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    /// The entry point sitemap could not be fetched
    #[error("Failed to fetch the main XML sitemap: {0}")]
    FatalFetch(FetchError),

    /// The entry point sitemap was fetched but is not a sitemap document
    #[error("Failed to parse XML for {url}: {source}")]
    FatalParse {
        url: String,
        #[source]
        source: ParseError,
    },
}

/// Validation failures for a traversal request, raised before traversal begins.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Missing required parameter: sitemap_url")]
    MissingUrl,

    #[error("Invalid sitemap URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Missing required parameter: {0}")]
    MissingDate(&'static str),

    #[error("Invalid date format for {field} ('{value}'). Please use YYYY-MM-DD.")]
    InvalidDate { field: &'static str, value: String },

    #[error("Start date ({start}) cannot be later than end date ({end})!")]
    StartAfterEnd { start: NaiveDate, end: NaiveDate },

    #[error("Invalid content filter: {0}")]
    InvalidContentFilter(String),

    #[error("Invalid domain '{domain}': {reason}")]
    InvalidDomain { domain: String, reason: String },
}

/// A single GET that did not produce a usable body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Error fetching {url}: {cause}")]
pub struct FetchError {
    pub url: String,
    pub cause: FetchCause,
}

impl FetchError {
    pub fn new(url: impl Into<String>, cause: FetchCause) -> Self {
        Self { url: url.into(), cause }
    }

    /// True when the same request might succeed later: timeouts, connection failures,
    /// 5xx and 429 responses. Only used for reporting; nothing is retried.
    pub fn is_transient(&self) -> bool {
        match &self.cause {
            FetchCause::Timeout | FetchCause::Connect(_) => true,
            FetchCause::Status(code) => *code == 429 || (500..=599).contains(code),
            FetchCause::Body(_) | FetchCause::Other(_) => false,
        }
    }
}

/// Why a fetch failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchCause {
    /// Server answered with a non-2xx status
    #[error("HTTP status {0}")]
    Status(u16),

    /// No complete response within the request timeout
    #[error("request timed out")]
    Timeout,

    /// Could not connect to the host
    #[error("connection failed: {0}")]
    Connect(String),

    /// Response started but the body could not be read
    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for FetchCause {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_connect() {
            Self::Connect(error.to_string())
        } else if error.is_body() || error.is_decode() {
            Self::Body(error.to_string())
        } else if let Some(status) = error.status() {
            Self::Status(status.as_u16())
        } else {
            Self::Other(error.to_string())
        }
    }
}

/// The fetched bytes are not a well-formed XML document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Sitemaps must be UTF-8; this also catches compressed payloads
    #[error("document is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("XML parsing error at byte {position}: {message}")]
    Malformed { position: u64, message: String },

    /// Tags still open when the document ended
    #[error("unclosed element <{0}> at end of document")]
    Unclosed(String),

    /// Nothing but text, comments or declarations
    #[error("document has no root element")]
    NoRootElement,
}

/// Type alias for Result with the crate's top-level Error.
pub type Result<T> = std::result::Result<T, Error>;
