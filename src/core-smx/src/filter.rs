//! Predicates deciding which sitemap entries survive a traversal.

use chrono::NaiveDate;
use regex::Regex;
use url::Url;

use crate::parse::SitemapEntry;

/// Entries without a `<lastmod>` are never excluded by the date range.
pub const UNDATED_ENTRIES_PASS: bool = true;

/// Case-insensitive whole-word match against a location, e.g. `post` matches
/// `/sitemap-post-1.xml` but not `/sitemap-posts.xml` or `/sitemap_post.xml`.
#[derive(Debug, Clone)]
pub struct ContentFilter {
    raw: String,
    pattern: Regex,
}

impl ContentFilter {
    /// Returns `Ok(None)` for an empty or whitespace-only filter, which means "no filter".
    ///
    /// # Errors
    ///
    /// Returns an error if the compiled pattern exceeds the regex size limit.
    pub fn new(filter: &str) -> Result<Option<Self>, regex::Error> {
        let raw = filter.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        let pattern = Regex::new(&format!(r"(?i)(?:^|\W){}(?:\W|$)", regex::escape(raw)))?;
        Ok(Some(Self {
            raw: raw.to_string(),
            pattern,
        }))
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, loc: &str) -> bool {
        self.pattern.is_match(loc)
    }
}

/// Host every nested sitemap must live on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainScope {
    host: String,
}

impl DomainScope {
    pub fn new(host: &str) -> Self {
        Self {
            host: host.to_ascii_lowercase(),
        }
    }

    /// Scope derived from the entry point's host. `None` for host-less URLs.
    pub fn from_url(url: &Url) -> Option<Self> {
        url.host_str().map(Self::new)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// False for locations that do not parse as absolute URLs.
    pub fn contains(&self, loc: &str) -> bool {
        Url::parse(loc)
            .ok()
            .and_then(|url| url.host_str().map(|host| host.eq_ignore_ascii_case(&self.host)))
            .unwrap_or(false)
    }
}

/// Immutable filter input for one traversal.
#[derive(Debug, Clone)]
pub struct FilterCriteria {
    /// First day included, inclusive
    pub start: NaiveDate,
    /// Last day included, inclusive
    pub end: NaiveDate,
    pub content: Option<ContentFilter>,
    /// Overrides the entry point's host as the domain scope
    pub domain: Option<String>,
}

impl FilterCriteria {
    /// Criteria with a date range and no content filter. Callers guarantee `start <= end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            content: None,
            domain: None,
        }
    }

    pub fn with_content(mut self, content: Option<ContentFilter>) -> Self {
        self.content = content;
        self
    }

    pub fn with_domain(mut self, domain: &str) -> Self {
        self.domain = Some(domain.to_string());
        self
    }

    /// Date rule: undated entries pass, dated ones pass iff `start <= lastmod <= end`.
    pub fn within_dates(&self, lastmod: Option<NaiveDate>) -> bool {
        match lastmod {
            None => UNDATED_ENTRIES_PASS,
            Some(date) => self.start <= date && date <= self.end,
        }
    }

    /// Content rule: passes when no filter is set.
    pub fn matches_content(&self, loc: &str) -> bool {
        self.content.as_ref().is_none_or(|filter| filter.matches(loc))
    }

    /// Nested sitemap reference: date, domain and content rules.
    pub fn passes_sitemap_ref(&self, entry: &SitemapEntry, scope: &DomainScope) -> bool {
        self.within_dates(entry.lastmod) && scope.contains(&entry.loc) && self.matches_content(&entry.loc)
    }

    /// Leaf URL: date and content rules. Leaves are not checked against the domain scope.
    pub fn passes_leaf(&self, entry: &SitemapEntry) -> bool {
        self.within_dates(entry.lastmod) && self.matches_content(&entry.loc)
    }
}
