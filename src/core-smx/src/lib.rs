//! # Sitemap discovery core
//!
//! Resolves a sitemap index into the URLs its leaf sitemaps publish, filtered by a
//! `lastmod` date range and an optional content word.
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use core_smx::{ContentFilter, FilterCriteria, TraversalOptions, Traverser};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let criteria = FilterCriteria::new(
//!         NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//!         NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
//!     )
//!     .with_content(ContentFilter::new("post")?);
//!
//!     let traverser = Traverser::http(TraversalOptions::builder().concurrency(8).build())?;
//!     let result = traverser.traverse("https://example.com/sitemap_index.xml", &criteria).await?;
//!     println!("{}", serde_json::to_string_pretty(&result)?);
//!     Ok(())
//! }
//! ```

pub mod aggregate;
pub mod common;
pub mod config;
pub mod errors;
pub mod fetch;
pub mod filter;
pub mod input;
pub mod parse;
pub mod traverse;

pub use aggregate::{Aggregator, SkippedNode, TraversalResult};
pub use common::durations::{get_request_timeout, get_run_budget};
pub use common::hostname::{HostPortError, get_api_base_url};
pub use common::logging::setup_logging;
pub use common::max_concurrency::get_max_concurrency;
pub use config::{TraversalOptions, TraversalOptionsBuilder};
pub use errors::{Error, FetchCause, FetchError, InputError, ParseError, Result};
pub use fetch::{Fetcher, HttpFetcher};
pub use filter::{ContentFilter, DomainScope, FilterCriteria, UNDATED_ENTRIES_PASS};
pub use input::{TraversalRequest, ValidatedRequest, is_valid_sitemap_url, parse_date, parse_domain};
pub use parse::{NodeKind, SitemapEntry, SitemapNode, parse_lastmod, parse_sitemap};
pub use traverse::{Traverser, VisitedSet, traverse};

pub use tokio_util::sync::CancellationToken;
