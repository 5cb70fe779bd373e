//! Docref - token-budgeted documentation crawler
//!
//! This crate crawls a documentation site breadth-first from one or
//! more seed URLs, normalizes each page to markdown-ish text, and
//! keeps the whole result under a global token budget so the output
//! fits an LLM context window.
//!
//! ## Pipeline
//!
//! The [`Crawler`] drives everything: it schedules rounds of bounded
//! concurrency, consults the [`CacheStore`] before fetching, expands
//! the frontier through the relevance filter, charges every accepted
//! page against a token ledger, and finally shrinks oversized pages
//! via [`triage`] — structural reduction or, when a [`Summarizer`] is
//! available, external summarization.
//!
//! I/O and markup concerns are behind collaborator traits in
//! [`collab`]; defaults ([`HttpTransport`], [`MarkdownNormalizer`],
//! [`DomExtractor`]) are provided for ordinary use.

pub mod budget;
pub mod cache;
pub mod collab;
mod crawler;
mod error;
pub mod filter;
pub mod triage;
mod types;

pub use cache::{CacheStore, JsonCache, MemoryCache};
pub use collab::{
    ContentExtractor, DomExtractor, HttpTransport, MarkdownNormalizer, Normalizer, Summarizer,
    Transport,
};
pub use crawler::{infer_library_name, CrawlConfig, CrawlOutcome, Crawler};
pub use error::{CrawlError, FetchError, SummarizeError};
pub use triage::triage;
pub use types::{ApiEntry, CandidateLink, CodeExample, Page, PageTokens, ShrinkState, TokenReport};

pub use collab::DEFAULT_USER_AGENT;
