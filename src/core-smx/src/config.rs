//! Configuration options for sitemap traversal.

use std::time::Duration;

use crate::common::durations::{get_request_timeout, get_run_budget};
use crate::common::max_concurrency::get_max_concurrency;

/// Default number of sitemap fetches allowed in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Default timeout for a single sitemap GET.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration options for the traversal engine.
#[derive(Debug, Clone)]
pub struct TraversalOptions {
    /// Maximum number of concurrent sitemap fetches (default: 5)
    pub concurrency: usize,
    /// Timeout applied to every individual fetch (default: 10s)
    pub request_timeout: Duration,
    /// Wall-clock budget for the whole run; when it elapses the partial result is returned
    pub run_budget: Option<Duration>,
    /// Nested sitemaps deeper than this are not fetched. The entry point is depth 0.
    pub max_depth: Option<usize>,
    /// User-Agent header sent with every fetch
    pub user_agent: String,
}

impl Default for TraversalOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            run_budget: None,
            max_depth: None,
            user_agent: default_user_agent(),
        }
    }
}

impl TraversalOptions {
    /// Creates a new builder for TraversalOptions.
    pub fn builder() -> TraversalOptionsBuilder {
        TraversalOptionsBuilder::default()
    }

    /// Options from SMX_MAX_CONCURRENCY, SMX_REQUEST_TIMEOUT_SECS and SMX_RUN_BUDGET_SECS.
    /// Panics if any of them is set to an invalid value.
    pub fn from_env() -> Self {
        Self::builder()
            .concurrency(get_max_concurrency(None))
            .request_timeout(get_request_timeout())
            .maybe_run_budget(get_run_budget())
            .build()
    }
}

fn default_user_agent() -> String {
    format!("smx/{}", env!("CARGO_PKG_VERSION"))
}

/// Builder for TraversalOptions.
#[derive(Debug, Clone, Default)]
pub struct TraversalOptionsBuilder {
    concurrency: Option<usize>,
    request_timeout: Option<Duration>,
    run_budget: Option<Duration>,
    max_depth: Option<usize>,
    user_agent: Option<String>,
}

impl TraversalOptionsBuilder {
    /// Sets the concurrency level (number of simultaneous fetches). Zero is raised to one.
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = Some(concurrency.max(1));
        self
    }

    /// Sets the per-request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Sets the whole-run time budget.
    pub fn run_budget(mut self, budget: Duration) -> Self {
        self.run_budget = Some(budget);
        self
    }

    /// Same as `run_budget`, but leaves the budget unset on `None`.
    pub fn maybe_run_budget(mut self, budget: Option<Duration>) -> Self {
        self.run_budget = budget.or(self.run_budget);
        self
    }

    /// Limits how deep nested sitemap indexes are followed.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Sets the User-Agent header.
    pub fn user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = Some(user_agent);
        self
    }

    /// Builds the TraversalOptions.
    pub fn build(self) -> TraversalOptions {
        TraversalOptions {
            concurrency: self.concurrency.unwrap_or(DEFAULT_CONCURRENCY),
            request_timeout: self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT),
            run_budget: self.run_budget,
            max_depth: self.max_depth,
            user_agent: self.user_agent.unwrap_or_else(default_user_agent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let options = TraversalOptions::builder().build();
        assert_eq!(options.concurrency, DEFAULT_CONCURRENCY);
        assert_eq!(options.request_timeout, Duration::from_secs(10));
        assert_eq!(options.run_budget, None);
        assert_eq!(options.max_depth, None);
        assert!(options.user_agent.starts_with("smx/"));
    }

    #[test]
    fn test_builder_overrides() {
        let options = TraversalOptions::builder()
            .concurrency(0)
            .request_timeout(Duration::from_millis(250))
            .maybe_run_budget(Some(Duration::from_secs(30)))
            .maybe_run_budget(None)
            .max_depth(2)
            .user_agent("tester".to_string())
            .build();
        assert_eq!(options.concurrency, 1);
        assert_eq!(options.request_timeout, Duration::from_millis(250));
        assert_eq!(options.run_budget, Some(Duration::from_secs(30)));
        assert_eq!(options.max_depth, Some(2));
        assert_eq!(options.user_agent, "tester");
    }
}
