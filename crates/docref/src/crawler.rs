//! Crawl orchestration
//!
//! A round-based breadth-first crawl: each round pops up to
//! `concurrency` unvisited URLs off the frontier, marks them visited
//! *before* dispatch, fetches and processes them concurrently, then a
//! single coordinating pass applies all budget and frontier mutations
//! in dispatch order. Keeping every counter mutation on the
//! coordinator makes the accounting invariants easy to reason about:
//! the check-then-commit against the token ledger is atomic per page,
//! so the spent total never passes the ceiling.
//!
//! Individual page failures are absorbed; a run only fails on
//! configuration errors, before any work starts.

use crate::budget::TokenLedger;
use crate::cache::CacheStore;
use crate::collab::{ContentExtractor, Normalizer, Summarizer, Transport};
use crate::error::CrawlError;
use crate::filter::{filter_links, VariantAnchor};
use crate::triage::triage;
use crate::types::{Page, PageTokens, TokenReport};
use futures::future::join_all;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use url::Url;

/// Configuration for a crawl run
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Library the documentation covers; feeds link relevance
    pub library_name: String,
    /// Maximum pages to dispatch
    pub max_pages: usize,
    /// Pages fetched in parallel per round
    pub concurrency: usize,
    /// Per-page token ceiling applied by triage
    pub max_tokens_per_page: usize,
    /// Global token ceiling for the whole crawl
    pub max_total_tokens: usize,
    /// Expand the frontier with each page's filtered links
    pub crawl_links: bool,
    /// Bypass the cache for this run
    pub skip_cache: bool,
    /// Constrain the crawl to the anchor URL's locale and version
    pub single_variant: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            library_name: String::new(),
            max_pages: 10,
            concurrency: 3,
            max_tokens_per_page: 50_000,
            max_total_tokens: 200_000,
            crawl_links: true,
            skip_cache: false,
            single_variant: true,
        }
    }
}

/// Result of a completed crawl run
#[derive(Debug)]
pub struct CrawlOutcome {
    /// Accepted pages in dispatch order, post-triage
    pub pages: Vec<Page>,
    /// Token usage summary
    pub report: TokenReport,
}

/// What one page-processing task produced
enum FetchOutcome {
    /// Freshly fetched and processed; not yet cached
    Fresh(Page),
    /// Served from the cache store
    Cached(Page),
    /// Fetch or processing failed; the page yields nothing
    Failed,
}

/// The budgeted documentation crawler
///
/// All collaborators are explicit dependencies injected at
/// construction; the summarizer is optional, and without it triage
/// falls back to structural reduction.
pub struct Crawler {
    config: CrawlConfig,
    transport: Arc<dyn Transport>,
    normalizer: Arc<dyn Normalizer>,
    extractor: Arc<dyn ContentExtractor>,
    cache: Arc<dyn CacheStore>,
    summarizer: Option<Arc<dyn Summarizer>>,
}

impl Crawler {
    /// Create a crawler from its collaborators
    pub fn new(
        config: CrawlConfig,
        transport: Arc<dyn Transport>,
        normalizer: Arc<dyn Normalizer>,
        extractor: Arc<dyn ContentExtractor>,
        cache: Arc<dyn CacheStore>,
    ) -> Self {
        Self {
            config,
            transport,
            normalizer,
            extractor,
            cache,
            summarizer: None,
        }
    }

    /// Attach an external summarizer
    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    /// Crawl from the given seeds and return the processed pages plus
    /// a token report
    ///
    /// The first seed is the anchor URL: it defines the hostname scope
    /// and, in single-variant mode, the locale/version constraints.
    pub async fn run(&self, seeds: &[String]) -> Result<CrawlOutcome, CrawlError> {
        if seeds.is_empty() {
            return Err(CrawlError::NoSeeds);
        }
        let anchor_url = Url::parse(&seeds[0]).map_err(|source| CrawlError::InvalidSeed {
            url: seeds[0].clone(),
            source,
        })?;
        let anchor = VariantAnchor::infer(&anchor_url);

        let mut visited: HashSet<String> = HashSet::new();
        let mut enqueued: HashSet<String> = HashSet::new();
        let mut frontier: VecDeque<String> = VecDeque::new();
        for seed in seeds {
            if enqueued.insert(seed.clone()) {
                frontier.push_back(seed.clone());
            }
        }

        let mut ledger = TokenLedger::new(self.config.max_total_tokens);
        let mut accepted: Vec<Page> = Vec::new();
        let mut line_items: Vec<PageTokens> = Vec::new();
        let mut pages_visited = 0usize;

        info!(
            seeds = seeds.len(),
            max_pages = self.config.max_pages,
            ceiling = self.config.max_total_tokens,
            "Starting crawl"
        );

        while !frontier.is_empty() && pages_visited < self.config.max_pages {
            // Mark the whole batch visited before dispatch so no URL
            // can be picked up twice, within this round or a later one.
            let capacity = self
                .config
                .concurrency
                .min(self.config.max_pages - pages_visited);
            let mut batch: Vec<String> = Vec::with_capacity(capacity);
            while batch.len() < capacity {
                let Some(url) = frontier.pop_front() else {
                    break;
                };
                if visited.insert(url.clone()) {
                    batch.push(url);
                }
            }
            if batch.is_empty() {
                break;
            }
            pages_visited += batch.len();
            debug!(round_size = batch.len(), pages_visited, "Dispatching round");

            let results = join_all(batch.iter().map(|url| self.process_url(url, &anchor))).await;

            // Coordinator pass: apply ledger and result mutations in
            // dispatch order, keeping the result sequence batch-stable.
            let mut round_pages: Vec<Page> = Vec::new();
            for (url, outcome) in batch.iter().zip(results) {
                let (page, fresh) = match outcome {
                    FetchOutcome::Fresh(page) => (page, true),
                    FetchOutcome::Cached(page) => (page, false),
                    FetchOutcome::Failed => continue,
                };
                if !ledger.try_charge(page.token_count()) {
                    warn!(
                        url = %url,
                        tokens = page.token_count(),
                        spent = ledger.spent(),
                        ceiling = ledger.ceiling(),
                        "Skipping page: would exceed token budget"
                    );
                    continue;
                }
                line_items.push(PageTokens {
                    title: page.title.clone(),
                    url: url.clone(),
                    tokens: page.token_count(),
                    shrink_state: page.shrink_state,
                });
                if fresh {
                    self.cache.put(url, page.clone()).await;
                }
                round_pages.push(page);
            }

            if self.config.crawl_links
                && pages_visited < self.config.max_pages
                && !ledger.soft_stop()
            {
                for page in &round_pages {
                    for link in &page.links {
                        if !visited.contains(link) && enqueued.insert(link.clone()) {
                            frontier.push_back(link.clone());
                        }
                    }
                }
            }

            accepted.extend(round_pages);

            if ledger.soft_stop() {
                info!(
                    spent = ledger.spent(),
                    ceiling = ledger.ceiling(),
                    "Approaching token ceiling, stopping crawl"
                );
                frontier.clear();
            }
        }

        // One triage pass over the full result set; crawling is done,
        // so no shrink work is wasted on pages that never made it.
        let mut pages = Vec::with_capacity(accepted.len());
        for page in accepted {
            pages.push(
                triage(
                    page,
                    self.config.max_tokens_per_page,
                    self.summarizer.as_deref(),
                )
                .await,
            );
        }
        for (item, page) in line_items.iter_mut().zip(&pages) {
            item.shrink_state = page.shrink_state;
        }

        let report = TokenReport::from_pages(line_items);
        debug_assert_eq!(report.total_tokens, ledger.spent());

        self.cache.flush_all().await;

        info!(
            pages = report.pages_processed,
            tokens = report.total_tokens,
            "Crawl finished"
        );
        Ok(CrawlOutcome { pages, report })
    }

    /// Fetch and process one URL; never fails, only yields nothing
    async fn process_url(&self, url: &str, anchor: &VariantAnchor) -> FetchOutcome {
        if !self.config.skip_cache {
            if let Some(mut page) = self.cache.get(url).await {
                debug!(url, "Using cached page");
                if page.token_count() == 0 && !page.content().is_empty() {
                    // Entry predates token counting; repair it in place
                    page.refresh_token_count();
                    self.cache.put(url, page.clone()).await;
                }
                return FetchOutcome::Cached(page);
            }
        }

        let Ok(page_url) = Url::parse(url) else {
            error!(url, "Unparseable URL in frontier");
            return FetchOutcome::Failed;
        };
        let html = match self.transport.fetch(url).await {
            Ok(html) => html,
            Err(err) => {
                error!(url, error = %err, "Failed to fetch page");
                return FetchOutcome::Failed;
            }
        };

        let title = self.extractor.title(&html);
        let content = self.normalizer.to_text(&html);
        let candidates = self.extractor.links(&html);
        let links = filter_links(
            &candidates,
            &page_url,
            anchor,
            &self.config.library_name,
            self.config.single_variant,
        );

        let page = Page::new(url, title, content)
            .with_links(links)
            .with_code_examples(self.extractor.code_examples(&html))
            .with_api_entries(self.extractor.api_entries(&html));
        FetchOutcome::Fresh(page)
    }
}

/// Keywords stripped when inferring a library name from a URL
const NAME_NOISE: &[&str] = &["docs", "documentation", "api", "reference"];

/// Guess a library name from its documentation URL
///
/// Prefers a meaningful trailing path segment, then the first path
/// segment, then the hostname, with generic words like "docs" removed.
pub fn infer_library_name(url: &Url) -> String {
    let host = url.host_str().unwrap_or("library");
    let host_labels: Vec<&str> = host.split('.').collect();
    let host_label = if host_labels.first() == Some(&"www") && host_labels.len() > 2 {
        host_labels[1]
    } else {
        host_labels[0]
    };

    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|p| !p.is_empty()).collect())
        .unwrap_or_default();
    let mut name = host_label.to_string();
    if let Some(last) = segments.last() {
        if !last.contains('.') && last.len() > 2 {
            name = last.to_string();
        } else if segments.len() > 1 && segments[0].len() > 2 {
            name = segments[0].to_string();
        }
    }

    let name = name.replace('-', " ");
    let name = strip_first_noise_word(&name);
    let name = name.trim();
    if name.is_empty() {
        host_label.to_string()
    } else {
        capitalize(name)
    }
}

/// Remove the leftmost occurrence of a generic documentation word
///
/// Matched case-insensitively over the raw bytes; the keywords are
/// ASCII, so a hit never lands inside a multi-byte character.
fn strip_first_noise_word(name: &str) -> String {
    let bytes = name.as_bytes();
    let hit = NAME_NOISE
        .iter()
        .filter_map(|kw| {
            bytes
                .windows(kw.len())
                .position(|w| w.eq_ignore_ascii_case(kw.as_bytes()))
                .map(|pos| (pos, kw.len()))
        })
        .min_by_key(|(pos, _)| *pos);
    match hit {
        Some((pos, len)) => format!("{}{}", &name[..pos], &name[pos + len..]),
        None => name.to_string(),
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name_of(url: &str) -> String {
        infer_library_name(&Url::parse(url).unwrap())
    }

    #[test]
    fn test_infer_name_from_path() {
        assert_eq!(name_of("https://example.com/docs/tokio"), "Tokio");
        assert_eq!(name_of("https://www.example.com/"), "Example");
    }

    #[test]
    fn test_infer_name_strips_noise() {
        assert_eq!(name_of("https://example.com/guide/docs-tokio"), "Tokio");
        // Entirely generic names fall back to the raw host label
        assert_eq!(name_of("https://react.dev/reference"), "react");
    }

    #[test]
    fn test_infer_name_skips_file_segments() {
        assert_eq!(
            name_of("https://example.com/serde/index.html"),
            "Serde"
        );
    }

    #[test]
    fn test_strip_noise_word_with_multibyte_text() {
        assert_eq!(strip_first_noise_word("πdocs lib"), "π lib");
        assert_eq!(strip_first_noise_word("Docs Übersicht"), " Übersicht");
        assert_eq!(strip_first_noise_word("naïve"), "naïve");
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("tokio"), "Tokio");
        assert_eq!(capitalize(""), "");
    }
}
