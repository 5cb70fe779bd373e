//! Core types for docref

use crate::budget::estimate_tokens;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which triage path produced a page's current content
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShrinkState {
    /// Content is unchanged since the crawl
    #[default]
    Original,
    /// Content was structurally reduced to key sections
    Reduced,
    /// Content was replaced by an external summary
    Summarized,
}

/// A code block extracted from a documentation page
///
/// Passed through the pipeline untouched; the crawler never inspects
/// the contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeExample {
    /// The code itself
    pub code: String,
    /// Language hint, lower-cased ("" when unknown)
    pub language: String,
    /// Nearby heading or paragraph used as a description
    pub description: String,
}

/// An API signature extracted from a documentation page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEntry {
    /// Heading text the signature was found under
    pub name: String,
    /// The signature itself
    pub signature: String,
    /// First paragraph following the heading, if any
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// A raw outbound link as found in page markup, prior to filtering
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateLink {
    /// The href attribute value, possibly relative
    pub href: String,
    /// Anchor text, possibly empty
    pub text: String,
}

impl CandidateLink {
    /// Create a candidate link
    pub fn new(href: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            text: text.into(),
        }
    }
}

/// A single crawled page in its normalized textual form
///
/// `content` and `token_count` are kept private so the estimate can
/// never go stale: all mutation goes through [`Page::set_content`],
/// which recomputes the count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// Canonical absolute URL, primary identity
    pub url: String,
    /// Extracted page title
    pub title: String,
    content: String,
    /// Outbound links that survived relevance filtering
    pub links: Vec<String>,
    /// Code blocks found on the page
    #[serde(default)]
    pub code_examples: Vec<CodeExample>,
    /// API signatures found on the page
    #[serde(default)]
    pub api_entries: Vec<ApiEntry>,
    token_count: usize,
    /// Which triage path produced the current content
    #[serde(default)]
    pub shrink_state: ShrinkState,
    /// When the page was fetched
    pub fetched_at: DateTime<Utc>,
}

impl Page {
    /// Build a page from freshly normalized content
    ///
    /// The token estimate is computed here and kept in sync by
    /// [`set_content`](Self::set_content) from then on.
    pub fn new(url: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        let token_count = estimate_tokens(&content);
        Self {
            url: url.into(),
            title: title.into(),
            content,
            links: Vec::new(),
            code_examples: Vec::new(),
            api_entries: Vec::new(),
            token_count,
            shrink_state: ShrinkState::Original,
            fetched_at: Utc::now(),
        }
    }

    /// Attach filtered outbound links
    pub fn with_links(mut self, links: Vec<String>) -> Self {
        self.links = links;
        self
    }

    /// Attach extracted code examples
    pub fn with_code_examples(mut self, examples: Vec<CodeExample>) -> Self {
        self.code_examples = examples;
        self
    }

    /// Attach extracted API entries
    pub fn with_api_entries(mut self, entries: Vec<ApiEntry>) -> Self {
        self.api_entries = entries;
        self
    }

    /// Normalized text body
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Estimated token cost of the current content
    pub fn token_count(&self) -> usize {
        self.token_count
    }

    /// Replace the content, recomputing the token estimate
    pub fn set_content(&mut self, content: impl Into<String>, state: ShrinkState) {
        self.content = content.into();
        self.token_count = estimate_tokens(&self.content);
        self.shrink_state = state;
    }

    /// Recompute the token estimate from the current content
    ///
    /// Used to repair cache entries persisted before token counting.
    pub fn refresh_token_count(&mut self) -> usize {
        self.token_count = estimate_tokens(&self.content);
        self.token_count
    }
}

/// Per-page line item in a [`TokenReport`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageTokens {
    /// Page title
    pub title: String,
    /// Page URL
    pub url: String,
    /// Token cost charged against the budget at crawl time
    pub tokens: usize,
    /// Shrink state after triage
    #[serde(default)]
    pub shrink_state: ShrinkState,
}

/// Token usage summary for a completed crawl
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenReport {
    /// Total tokens charged against the budget
    pub total_tokens: usize,
    /// Number of pages accepted into the result set
    pub pages_processed: usize,
    /// Average tokens per accepted page
    pub average_tokens_per_page: usize,
    /// The most expensive page, if any pages were accepted
    pub largest_page: Option<PageTokens>,
    /// The cheapest page, if any pages were accepted
    pub smallest_page: Option<PageTokens>,
    /// Per-page breakdown, in acceptance order
    pub pages: Vec<PageTokens>,
}

impl TokenReport {
    /// Build a report from per-page line items
    pub fn from_pages(pages: Vec<PageTokens>) -> Self {
        let total_tokens: usize = pages.iter().map(|p| p.tokens).sum();
        let pages_processed = pages.len();
        let average_tokens_per_page = if pages_processed > 0 {
            total_tokens / pages_processed
        } else {
            0
        };
        let largest_page = pages.iter().max_by_key(|p| p.tokens).cloned();
        let smallest_page = pages.iter().min_by_key(|p| p.tokens).cloned();
        Self {
            total_tokens,
            pages_processed,
            average_tokens_per_page,
            largest_page,
            smallest_page,
            pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_token_count_tracks_content() {
        let mut page = Page::new("https://x.test/docs", "Docs", "some body text here");
        let before = page.token_count();
        assert!(before > 0);

        page.set_content("short", ShrinkState::Reduced);
        assert_eq!(page.token_count(), estimate_tokens("short"));
        assert_eq!(page.shrink_state, ShrinkState::Reduced);
        assert!(page.token_count() < before);
    }

    #[test]
    fn test_report_from_pages() {
        let pages = vec![
            PageTokens {
                title: "A".into(),
                url: "https://x.test/a".into(),
                tokens: 100,
                shrink_state: ShrinkState::Original,
            },
            PageTokens {
                title: "B".into(),
                url: "https://x.test/b".into(),
                tokens: 300,
                shrink_state: ShrinkState::Reduced,
            },
        ];
        let report = TokenReport::from_pages(pages);

        assert_eq!(report.total_tokens, 400);
        assert_eq!(report.pages_processed, 2);
        assert_eq!(report.average_tokens_per_page, 200);
        assert_eq!(report.largest_page.as_ref().unwrap().url, "https://x.test/b");
        assert_eq!(report.smallest_page.as_ref().unwrap().url, "https://x.test/a");
    }

    #[test]
    fn test_report_empty() {
        let report = TokenReport::from_pages(Vec::new());
        assert_eq!(report.total_tokens, 0);
        assert_eq!(report.average_tokens_per_page, 0);
        assert!(report.largest_page.is_none());
        assert!(report.smallest_page.is_none());
    }

    #[test]
    fn test_page_serialization_round_trip() {
        let page = Page::new("https://x.test/docs", "Docs", "body")
            .with_links(vec!["https://x.test/docs/api".into()]);
        let json = serde_json::to_string(&page).unwrap();
        let back: Page = serde_json::from_str(&json).unwrap();
        assert_eq!(back.url, page.url);
        assert_eq!(back.content(), "body");
        assert_eq!(back.token_count(), page.token_count());
    }
}
