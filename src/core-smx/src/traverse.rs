//! Walking a sitemap index down to its leaf urlsets.
//!
//! The walk is a work queue: a frontier of pending sitemap locations, drained by at most
//! `concurrency` in-flight fetches. Workers only fetch and parse. The coordinator loop owns
//! the [`VisitedSet`] and the [`Aggregator`] and applies each finished node serially, so
//! check-and-claim of a location is atomic and no location is fetched twice.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use chrono::NaiveDate;
use futures::stream::{FuturesUnordered, StreamExt};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::aggregate::{Aggregator, TraversalResult};
use crate::config::TraversalOptions;
use crate::errors::{Error, FetchError, InputError, ParseError, Result};
use crate::fetch::{Fetcher, HttpFetcher};
use crate::filter::{DomainScope, FilterCriteria};
use crate::parse::{NodeKind, SitemapNode, parse_sitemap};

/// Locations claimed during one run.
#[derive(Debug, Default)]
pub struct VisitedSet {
    seen: HashSet<String>,
}

impl VisitedSet {
    /// True if `loc` was not seen before; it is now claimed by the caller.
    pub fn claim(&mut self, loc: &str) -> bool {
        self.seen.insert(loc.to_string())
    }

    pub fn contains(&self, loc: &str) -> bool {
        self.seen.contains(loc)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Why a claimed node contributed nothing.
#[derive(Debug, Error)]
enum NodeFailure {
    #[error("{0}")]
    Fetch(#[from] FetchError),
    #[error("{0}")]
    Parse(#[from] ParseError),
}

/// A claimed location waiting to be fetched.
#[derive(Debug, Clone)]
struct Pending {
    loc: String,
    /// lastmod declared by the parent index
    lastmod: Option<NaiveDate>,
    depth: usize,
}

/// Mutable state of one run, owned by the coordinator.
struct Walk<'a> {
    criteria: &'a FilterCriteria,
    scope: DomainScope,
    max_depth: Option<usize>,
    visited: VisitedSet,
    frontier: VecDeque<Pending>,
    aggregator: Aggregator,
}

impl Walk<'_> {
    fn apply(&mut self, pending: Pending, outcome: std::result::Result<SitemapNode, NodeFailure>) {
        match outcome {
            Ok(node) => self.resolve(&pending, node, false),
            Err(failure) => {
                let transient = matches!(&failure, NodeFailure::Fetch(e) if e.is_transient());
                tracing::warn!("[SKIP] {} (transient: {}): {}", pending.loc, transient, failure);
                self.aggregator.record_skip(&pending.loc, failure.to_string());
            }
        }
    }

    /// Folds a parsed node into the result and queues the nested sitemaps that pass the filter.
    /// The entry point is only recorded when it is itself a urlset.
    fn resolve(&mut self, pending: &Pending, node: SitemapNode, is_root: bool) {
        match node.kind {
            NodeKind::Index => {
                if !is_root {
                    self.aggregator.record_index(&pending.loc, pending.lastmod);
                }
                let depth = pending.depth + 1;
                let mut queued = 0usize;
                for child in node.entries {
                    if !self.criteria.passes_sitemap_ref(&child, &self.scope) {
                        tracing::trace!("Filtered out nested sitemap {}", child.loc);
                        continue;
                    }
                    if self.max_depth.is_some_and(|max| depth > max) {
                        tracing::debug!("Not following {}: deeper than max depth", child.loc);
                        continue;
                    }
                    let loc = canonical_loc(&child.loc);
                    if !self.visited.claim(&loc) {
                        tracing::trace!("Already visited {}", loc);
                        continue;
                    }
                    self.frontier.push_back(Pending {
                        loc,
                        lastmod: child.lastmod,
                        depth,
                    });
                    queued += 1;
                }
                tracing::debug!(
                    "Sitemap index {} lists {} sitemaps, {} queued",
                    pending.loc,
                    node.declared,
                    queued
                );
            }
            NodeKind::Urlset => {
                let urls: Vec<String> = node
                    .entries
                    .into_iter()
                    .filter(|entry| self.criteria.passes_leaf(entry))
                    .map(|entry| entry.loc)
                    .collect();
                tracing::debug!("Found {} of {} URLs in sitemap {}", urls.len(), node.declared, pending.loc);
                self.aggregator
                    .record_urlset(&pending.loc, pending.lastmod, node.declared, urls);
            }
            NodeKind::Unknown => {
                tracing::debug!("{} has neither <sitemap> nor <url> entries", pending.loc);
                if !is_root {
                    self.aggregator.record_index(&pending.loc, pending.lastmod);
                }
            }
        }
    }

    fn finish(self, complete: bool) -> TraversalResult {
        self.aggregator.finish(complete)
    }
}

/// Normalized spelling of a location, so `https://EXAMPLE.com` and `https://example.com/`
/// claim the same visited entry. Unparseable locations are kept as written.
fn canonical_loc(loc: &str) -> String {
    Url::parse(loc).map(String::from).unwrap_or_else(|_| loc.to_string())
}

async fn fetch_node<F: Fetcher + ?Sized>(fetcher: &F, loc: &str) -> std::result::Result<SitemapNode, NodeFailure> {
    let bytes = fetcher.fetch(loc).await?;
    Ok(parse_sitemap(&bytes)?)
}

async fn fetch_pending<F: Fetcher + ?Sized>(
    fetcher: &F,
    pending: Pending,
) -> (Pending, std::result::Result<SitemapNode, NodeFailure>) {
    let outcome = fetch_node(fetcher, &pending.loc).await;
    (pending, outcome)
}

/// Resolves once the run budget elapses; never without a budget.
async fn budget_elapsed(budget: Option<Duration>) {
    match budget {
        Some(budget) => tokio::time::sleep(budget).await,
        None => std::future::pending::<()>().await,
    }
}

/// Traversal engine: resolves a sitemap index into per-sitemap filtered URL lists.
#[derive(Debug)]
pub struct Traverser<F> {
    fetcher: F,
    options: TraversalOptions,
}

impl Traverser<HttpFetcher> {
    /// Traverser fetching over HTTP with the timeout and user agent from `options`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn http(options: TraversalOptions) -> Result<Self> {
        let fetcher = HttpFetcher::new(&options)?;
        Ok(Self::new(fetcher, options))
    }
}

impl<F: Fetcher> Traverser<F> {
    pub fn new(fetcher: F, options: TraversalOptions) -> Self {
        Self { fetcher, options }
    }

    pub fn options(&self) -> &TraversalOptions {
        &self.options
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Runs a traversal to completion (or until the configured run budget elapses).
    ///
    /// # Errors
    ///
    /// Fails only when `entry` is not a usable URL, or when the entry point itself cannot be
    /// fetched or parsed. Failures on nested sitemaps are recorded in
    /// [`TraversalResult::skipped`].
    pub async fn traverse(&self, entry: &str, criteria: &FilterCriteria) -> Result<TraversalResult> {
        self.traverse_until(entry, criteria, CancellationToken::new()).await
    }

    /// Same as [`Traverser::traverse`], but stops issuing fetches once `cancel` fires and
    /// returns what was aggregated so far with `complete == false`.
    ///
    /// # Errors
    ///
    /// See [`Traverser::traverse`].
    pub async fn traverse_until(
        &self,
        entry: &str,
        criteria: &FilterCriteria,
        cancel: CancellationToken,
    ) -> Result<TraversalResult> {
        let entry_url = Url::parse(entry).map_err(|e| InputError::InvalidUrl {
            url: entry.to_string(),
            reason: e.to_string(),
        })?;
        let entry = entry_url.as_str();
        let scope = match &criteria.domain {
            Some(domain) => DomainScope::new(domain),
            None => DomainScope::from_url(&entry_url).ok_or_else(|| InputError::InvalidUrl {
                url: entry.to_string(),
                reason: "URL has no host".to_string(),
            })?,
        };

        tracing::info!(
            "Traversing {} for {}..={} (content filter: {:?}, domain: {})",
            entry,
            criteria.start,
            criteria.end,
            criteria.content.as_ref().map(|c| c.as_str()),
            scope.host()
        );

        let mut walk = Walk {
            criteria,
            scope,
            max_depth: self.options.max_depth,
            visited: VisitedSet::default(),
            frontier: VecDeque::new(),
            aggregator: Aggregator::new(),
        };
        walk.visited.claim(entry);

        let budget = budget_elapsed(self.options.run_budget);
        tokio::pin!(budget);

        let root = Pending {
            loc: entry.to_string(),
            lastmod: None,
            depth: 0,
        };
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            _ = &mut budget => None,
            outcome = fetch_node(&self.fetcher, entry) => Some(outcome),
        };
        let node = match outcome {
            None => {
                tracing::warn!("Traversal of {} stopped before the entry point was fetched", entry);
                return Ok(walk.finish(false));
            }
            Some(Ok(node)) => node,
            Some(Err(NodeFailure::Fetch(e))) => return Err(Error::FatalFetch(e)),
            Some(Err(NodeFailure::Parse(e))) => {
                return Err(Error::FatalParse {
                    url: entry.to_string(),
                    source: e,
                });
            }
        };
        walk.resolve(&root, node, true);

        let mut complete = true;
        let mut in_flight = FuturesUnordered::new();
        loop {
            while in_flight.len() < self.options.concurrency {
                let Some(next) = walk.frontier.pop_front() else {
                    break;
                };
                in_flight.push(fetch_pending(&self.fetcher, next));
            }
            if in_flight.is_empty() {
                break;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::warn!("Traversal of {} cancelled; returning partial result", entry);
                    complete = false;
                    break;
                }
                _ = &mut budget => {
                    tracing::warn!("Traversal of {} ran out of time; returning partial result", entry);
                    complete = false;
                    break;
                }
                Some((pending, outcome)) = in_flight.next() => walk.apply(pending, outcome),
            }
        }

        let visited = walk.visited.len();
        let result = walk.finish(complete);
        tracing::info!(
            "Traversal of {} done: {} sitemaps visited, {} recorded, {} URLs kept, {} skipped",
            entry,
            visited,
            result.metadata.len(),
            result.url_count(),
            result.skipped.len()
        );
        Ok(result)
    }
}

/// Traverses `entry` over HTTP with the given options.
///
/// # Errors
///
/// See [`Traverser::traverse`].
///
/// # Examples
///
/// ```no_run
/// # use core_smx::{FilterCriteria, TraversalOptions, traverse};
/// # use chrono::NaiveDate;
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let criteria = FilterCriteria::new(
///     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
/// );
/// let result = traverse("https://example.com/sitemap_index.xml", &criteria, TraversalOptions::default()).await?;
/// for (sitemap, urls) in &result.urls {
///     println!("{sitemap}: {} of {}", urls.len(), result.metadata[sitemap]);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn traverse(entry: &str, criteria: &FilterCriteria, options: TraversalOptions) -> Result<TraversalResult> {
    Traverser::http(options)?.traverse(entry, criteria).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visited_set_claims_once() {
        let mut visited = VisitedSet::default();
        assert!(visited.is_empty());
        assert!(visited.claim("https://example.com/a.xml"));
        assert!(!visited.claim("https://example.com/a.xml"));
        assert!(visited.contains("https://example.com/a.xml"));
        assert_eq!(visited.len(), 1);
    }

    #[test]
    fn test_canonical_loc() {
        assert_eq!(canonical_loc("https://EXAMPLE.com"), "https://example.com/");
        assert_eq!(canonical_loc("https://example.com:443/a.xml"), "https://example.com/a.xml");
        assert_eq!(canonical_loc("not a url"), "not a url");
    }
}
