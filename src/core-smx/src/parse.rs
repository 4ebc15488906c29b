//! Sitemap XML parsing.
//!
//! Handles both documents of the sitemap protocol:
//! ```xml
//! <sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <sitemap>
//!     <loc>https://example.com/sitemap-post-1.xml</loc>
//!     <lastmod>2024-01-15T08:30:00+00:00</lastmod>
//!   </sitemap>
//! </sitemapindex>
//! ```
//! and
//! ```xml
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://example.com/page</loc>
//!     <lastmod>2024-01-01</lastmod>
//!   </url>
//! </urlset>
//! ```
//! Elements are matched on their local name, so the namespace (or a prefix) is optional.

use chrono::NaiveDate;
use quick_xml::Reader;
use quick_xml::events::Event;

use crate::errors::ParseError;

/// What a parsed document turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Lists nested sitemaps
    Index,
    /// Lists leaf URLs
    Urlset,
    /// Well-formed XML with neither `<sitemap>` nor `<url>` elements
    Unknown,
}

/// A `(loc, lastmod)` pair read from a `<sitemap>` or `<url>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: Option<NaiveDate>,
}

/// One fetched-and-parsed sitemap document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapNode {
    pub kind: NodeKind,
    /// Number of entry elements of `kind` in the document, including the ones
    /// dropped for a missing `<loc>` or a malformed `<lastmod>`.
    pub declared: usize,
    /// Entries that survived extraction, in document order.
    pub entries: Vec<SitemapEntry>,
}

impl SitemapNode {
    pub fn empty() -> Self {
        Self {
            kind: NodeKind::Unknown,
            declared: 0,
            entries: Vec::new(),
        }
    }
}

/// Parses a `<lastmod>` value, keeping only the calendar date.
///
/// Anything after a time separator (`T` or a space) is discarded, so
/// `2024-01-15T23:59:59-08:00` and `2024-01-15` are the same date.
pub fn parse_lastmod(text: &str) -> Option<NaiveDate> {
    let date_part = text.trim().split(['T', 't', ' ']).next()?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryTag {
    Sitemap,
    Url,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Loc,
    Lastmod,
}

/// Entry element currently being read.
struct OpenEntry {
    tag: EntryTag,
    /// Element stack depth of the entry element itself.
    depth: usize,
    loc: Option<String>,
    lastmod: Option<String>,
}

impl OpenEntry {
    /// Drops entries without a location or with an unreadable lastmod.
    fn finish(self) -> Option<SitemapEntry> {
        let loc = self.loc.map(|l| l.trim().to_string()).filter(|l| !l.is_empty());
        let Some(loc) = loc else {
            tracing::trace!("Dropping {:?} entry without <loc>", self.tag);
            return None;
        };
        let lastmod = match self.lastmod {
            None => None,
            Some(text) => match parse_lastmod(&text) {
                Some(date) => Some(date),
                None => {
                    tracing::trace!("Dropping {} with unparseable lastmod '{}'", loc, text);
                    return None;
                }
            },
        };
        Some(SitemapEntry { loc, lastmod })
    }
}

/// Parses raw bytes into a [`SitemapNode`].
///
/// # Errors
///
/// Returns an error if the bytes are not UTF-8, are not well-formed XML, or contain no element at all.
/// Individual malformed entries are dropped without failing the document.
pub fn parse_sitemap(bytes: &[u8]) -> Result<SitemapNode, ParseError> {
    let xml = std::str::from_utf8(bytes)?;
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<String> = Vec::new();
    let mut saw_root = false;
    let mut open: Option<OpenEntry> = None;
    let mut field: Option<(Field, String)> = None;

    let mut sitemap_count = 0usize;
    let mut url_count = 0usize;
    let mut sitemaps = Vec::new();
    let mut urls = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                saw_root = true;
                let name = e.local_name();
                let name = name.as_ref();
                let entry_depth = open.as_ref().map(|entry| entry.depth);
                match (name, entry_depth) {
                    (b"sitemap" | b"url", None) => {
                        let tag = if name == b"sitemap" {
                            sitemap_count += 1;
                            EntryTag::Sitemap
                        } else {
                            url_count += 1;
                            EntryTag::Url
                        };
                        open = Some(OpenEntry {
                            tag,
                            depth: stack.len() + 1,
                            loc: None,
                            lastmod: None,
                        });
                    }
                    // only direct children count, so <image:loc> and friends are ignored
                    (b"loc" | b"lastmod", Some(depth)) if stack.len() == depth && field.is_none() => {
                        let which = if name == b"loc" { Field::Loc } else { Field::Lastmod };
                        field = Some((which, String::new()));
                    }
                    _ => {}
                }
                stack.push(String::from_utf8_lossy(name).into_owned());
            }
            Ok(Event::Empty(e)) => {
                saw_root = true;
                if open.is_none() {
                    match e.local_name().as_ref() {
                        b"sitemap" => sitemap_count += 1,
                        b"url" => url_count += 1,
                        _ => {}
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if let Some((_, text)) = field.as_mut() {
                    let unescaped = e.unescape().map_err(|err| ParseError::Malformed {
                        position: reader.buffer_position() as u64,
                        message: err.to_string(),
                    })?;
                    text.push_str(&unescaped);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some((_, text)) = field.as_mut() {
                    text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::End(_)) => {
                stack.pop();
                if let Some(entry) = open.as_mut() {
                    if stack.len() == entry.depth {
                        if let Some((which, text)) = field.take() {
                            let slot = match which {
                                Field::Loc => &mut entry.loc,
                                Field::Lastmod => &mut entry.lastmod,
                            };
                            slot.get_or_insert(text);
                        }
                    } else if stack.len() < entry.depth {
                        if let Some(entry) = open.take() {
                            let tag = entry.tag;
                            if let Some(finished) = entry.finish() {
                                match tag {
                                    EntryTag::Sitemap => sitemaps.push(finished),
                                    EntryTag::Url => urls.push(finished),
                                }
                            }
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ParseError::Malformed {
                    position: reader.error_position() as u64,
                    message: e.to_string(),
                });
            }
            _ => {}
        }
    }

    if let Some(unclosed) = stack.pop() {
        return Err(ParseError::Unclosed(unclosed));
    }
    if !saw_root {
        return Err(ParseError::NoRootElement);
    }

    let node = if sitemap_count > 0 {
        SitemapNode {
            kind: NodeKind::Index,
            declared: sitemap_count,
            entries: sitemaps,
        }
    } else if url_count > 0 {
        SitemapNode {
            kind: NodeKind::Urlset,
            declared: url_count,
            entries: urls,
        }
    } else {
        SitemapNode::empty()
    };
    Ok(node)
}
