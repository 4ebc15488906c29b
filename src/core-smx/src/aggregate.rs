//! Folding resolved sitemap nodes into the two result mappings.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A node that was claimed but produced nothing because its fetch or parse failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedNode {
    pub url: String,
    pub reason: String,
}

/// Output of one traversal.
///
/// `metadata` and `urls` always have the same keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalResult {
    /// Sitemap URL -> number of `<url>` entries it declares (0 for indexes)
    pub metadata: BTreeMap<String, usize>,
    /// Sitemap URL -> declared leaf URLs that passed the filter, in document order
    pub urls: BTreeMap<String, Vec<String>>,
    /// Sitemap URL -> lastmod its parent index declared for it
    pub lastmod: BTreeMap<String, NaiveDate>,
    pub skipped: Vec<SkippedNode>,
    /// False when the run was cancelled or ran out of time before every node was visited
    pub complete: bool,
}

impl TraversalResult {
    /// Total number of filtered leaf URLs across all sitemaps.
    pub fn url_count(&self) -> usize {
        self.urls.values().map(Vec::len).sum()
    }
}

/// Single owner of the result mappings for a run. Every location is written at most once.
#[derive(Debug, Default)]
pub struct Aggregator {
    result: TraversalResult,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an index (or unrecognized) node: declared count 0, no URLs.
    pub fn record_index(&mut self, loc: &str, lastmod: Option<NaiveDate>) {
        self.record(loc, lastmod, 0, Vec::new());
    }

    /// Records a urlset node with its declared count and filtered URLs.
    pub fn record_urlset(&mut self, loc: &str, lastmod: Option<NaiveDate>, declared: usize, urls: Vec<String>) {
        debug_assert!(urls.len() <= declared, "{loc}: more URLs kept than declared");
        self.record(loc, lastmod, declared, urls);
    }

    pub fn record_skip(&mut self, loc: &str, reason: String) {
        self.result.skipped.push(SkippedNode {
            url: loc.to_string(),
            reason,
        });
    }

    fn record(&mut self, loc: &str, lastmod: Option<NaiveDate>, declared: usize, urls: Vec<String>) {
        match self.result.metadata.entry(loc.to_string()) {
            Entry::Occupied(_) => {
                tracing::warn!("Ignoring second result for {}; first write wins", loc);
            }
            Entry::Vacant(slot) => {
                slot.insert(declared);
                self.result.urls.insert(loc.to_string(), urls);
                if let Some(date) = lastmod {
                    self.result.lastmod.insert(loc.to_string(), date);
                }
            }
        }
    }

    pub fn finish(mut self, complete: bool) -> TraversalResult {
        self.result.complete = complete;
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_stay_co_indexed() {
        let mut aggregator = Aggregator::new();
        aggregator.record_index("https://example.com/nested_index.xml", None);
        aggregator.record_urlset(
            "https://example.com/sitemap-post-1.xml",
            NaiveDate::from_ymd_opt(2024, 1, 15),
            3,
            vec!["https://example.com/a".to_string()],
        );
        aggregator.record_skip("https://example.com/broken.xml", "HTTP status 500".to_string());

        let result = aggregator.finish(true);
        assert!(result.complete);
        assert_eq!(
            result.metadata.keys().collect::<Vec<_>>(),
            result.urls.keys().collect::<Vec<_>>()
        );
        assert_eq!(result.metadata["https://example.com/nested_index.xml"], 0);
        assert!(result.urls["https://example.com/nested_index.xml"].is_empty());
        assert_eq!(result.metadata["https://example.com/sitemap-post-1.xml"], 3);
        assert_eq!(result.url_count(), 1);
        assert_eq!(result.lastmod.len(), 1);
        assert_eq!(result.skipped[0].url, "https://example.com/broken.xml");
        assert!(!result.metadata.contains_key("https://example.com/broken.xml"));
    }

    #[test]
    fn test_first_write_wins() {
        let mut aggregator = Aggregator::new();
        aggregator.record_urlset("https://example.com/s.xml", None, 2, vec!["https://example.com/a".to_string()]);
        aggregator.record_index("https://example.com/s.xml", None);

        let result = aggregator.finish(false);
        assert!(!result.complete);
        assert_eq!(result.metadata["https://example.com/s.xml"], 2);
        assert_eq!(result.urls["https://example.com/s.xml"].len(), 1);
    }
}
