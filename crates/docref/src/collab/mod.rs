//! Collaborator contracts consumed by the crawler
//!
//! The crawl pipeline owns scheduling, budgeting, and triage; all
//! I/O-shaped and markup-shaped work is delegated through these traits.
//! Default implementations live in the submodules; callers can inject
//! their own at construction.

mod convert;
mod extract;
mod transport;

pub use convert::MarkdownNormalizer;
pub use extract::DomExtractor;
pub use transport::{HttpTransport, HttpTransportBuilder, DEFAULT_USER_AGENT};

use crate::error::{FetchError, SummarizeError};
use crate::types::{ApiEntry, CandidateLink, CodeExample};
use async_trait::async_trait;

/// Fetches raw HTML for a URL
///
/// Retries and timeouts are the implementation's concern; the crawler
/// only sees success or a [`FetchError`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch the raw HTML body of a URL
    ///
    /// Non-2xx responses and network failures are errors.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Converts raw HTML to normalized text
pub trait Normalizer: Send + Sync {
    /// Convert HTML to plain structured text
    ///
    /// Pure and infallible; best-effort on malformed markup.
    fn to_text(&self, html: &str) -> String;
}

/// Extracts structured records from raw HTML
///
/// All methods are pure and best-effort, returning empty results when
/// nothing matches.
pub trait ContentExtractor: Send + Sync {
    /// Extract the page title
    fn title(&self, html: &str) -> String;

    /// Extract every anchor as a candidate link, prior to filtering
    fn links(&self, html: &str) -> Vec<CandidateLink>;

    /// Extract code blocks
    fn code_examples(&self, html: &str) -> Vec<CodeExample>;

    /// Extract API signatures found under headings
    fn api_entries(&self, html: &str) -> Vec<ApiEntry>;
}

/// External text-shrinking service
///
/// An optional dependency: when absent, triage falls straight through
/// to structural reduction. Implementations must not retry internally;
/// the triage layer already has a fallback for any failure.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize a page, returning replacement text
    async fn summarize(&self, title: &str, text: &str) -> Result<String, SummarizeError>;
}
