//! Error types for docref

use thiserror::Error;

/// Errors that prevent a crawl run from starting
///
/// Failures inside a single page's pipeline are absorbed and logged;
/// only configuration problems surface here.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// No seed URL was provided
    #[error("At least one seed URL is required")]
    NoSeeds,

    /// A seed URL could not be parsed
    #[error("Invalid seed URL: {url}")]
    InvalidSeed {
        /// The offending URL string
        url: String,
        /// Underlying parse error
        #[source]
        source: url::ParseError,
    },
}

/// Errors that can occur while fetching a page
#[derive(Debug, Error)]
pub enum FetchError {
    /// URL is missing or empty
    #[error("Missing required parameter: url")]
    MissingUrl,

    /// Failed to build HTTP client
    #[error("Failed to create HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    /// Server responded with a non-2xx status
    #[error("Server returned status {0}")]
    Status(u16),

    /// Request timed out
    #[error("Request timed out")]
    Timeout,

    /// Failed to connect to server
    #[error("Failed to connect to server")]
    Connect(#[source] reqwest::Error),

    /// Other request error
    #[error("Request failed: {0}")]
    Request(String),
}

impl FetchError {
    /// Create an error from a reqwest error
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_connect() {
            FetchError::Connect(err)
        } else {
            FetchError::Request(err.to_string())
        }
    }
}

/// Error returned by a [`Summarizer`](crate::collab::Summarizer)
///
/// The triage layer treats any summarization failure as a signal to
/// fall back to structural reduction, so the payload is informational.
#[derive(Debug, Error)]
#[error("Summarization failed: {0}")]
pub struct SummarizeError(pub String);
