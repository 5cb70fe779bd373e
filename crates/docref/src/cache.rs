//! Page cache contract and adapters
//!
//! The crawler consults the store before fetching, writes every
//! accepted fresh page, and flushes once at the end of a run. Store
//! failures never surface to the crawl: a malformed or unreadable
//! cache behaves like a cold one, and a failed flush is logged.
//! Writes made after the last flush are lost if the process dies;
//! that is a documented limitation, not a bug.

use crate::types::Page;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Key/value persistence of processed pages, keyed by URL
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Is a page cached for this URL?
    async fn has(&self, url: &str) -> bool;

    /// Fetch the cached page, if any
    ///
    /// A missing key is `None`, never an error.
    async fn get(&self, url: &str) -> Option<Page>;

    /// Store a page under its URL
    async fn put(&self, url: &str, page: Page);

    /// Persist all entries to the backing store
    async fn flush_all(&self);
}

/// In-memory cache, useful for tests and cache-less runs
#[derive(Debug, Default)]
pub struct MemoryCache {
    pages: Mutex<HashMap<String, Page>>,
}

impl MemoryCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached pages
    pub fn len(&self) -> usize {
        self.pages.lock().expect("cache lock poisoned").len()
    }

    /// True when nothing is cached
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn has(&self, url: &str) -> bool {
        self.pages
            .lock()
            .expect("cache lock poisoned")
            .contains_key(url)
    }

    async fn get(&self, url: &str) -> Option<Page> {
        self.pages
            .lock()
            .expect("cache lock poisoned")
            .get(url)
            .cloned()
    }

    async fn put(&self, url: &str, page: Page) {
        self.pages
            .lock()
            .expect("cache lock poisoned")
            .insert(url.to_string(), page);
    }

    async fn flush_all(&self) {}
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheFile {
    pages: HashMap<String, Page>,
}

/// Single-file JSON cache
///
/// Loads every entry on open and rewrites the whole file on flush.
/// Suits the crawl's access pattern: read-heavy during the run, one
/// bulk write at the end.
#[derive(Debug)]
pub struct JsonCache {
    path: PathBuf,
    pages: Mutex<HashMap<String, Page>>,
}

impl JsonCache {
    /// Open a cache file, treating a missing or malformed file as empty
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let pages = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<CacheFile>(&raw) {
                Ok(file) => {
                    debug!(path = %path.display(), entries = file.pages.len(), "Loaded page cache");
                    file.pages
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "Malformed cache file, starting cold");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        Self {
            path,
            pages: Mutex::new(pages),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CacheStore for JsonCache {
    async fn has(&self, url: &str) -> bool {
        self.pages
            .lock()
            .expect("cache lock poisoned")
            .contains_key(url)
    }

    async fn get(&self, url: &str) -> Option<Page> {
        self.pages
            .lock()
            .expect("cache lock poisoned")
            .get(url)
            .cloned()
    }

    async fn put(&self, url: &str, page: Page) {
        self.pages
            .lock()
            .expect("cache lock poisoned")
            .insert(url.to_string(), page);
    }

    async fn flush_all(&self) {
        let serialized = {
            let pages = self.pages.lock().expect("cache lock poisoned");
            serde_json::to_string_pretty(&CacheFile {
                pages: pages.clone(),
            })
        };
        match serialized {
            Ok(json) => {
                if let Err(err) = std::fs::write(&self.path, json) {
                    warn!(path = %self.path.display(), error = %err, "Failed to flush cache");
                }
            }
            Err(err) => warn!(error = %err, "Failed to serialize cache"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_cache_round_trip() {
        let cache = MemoryCache::new();
        assert!(!cache.has("https://x.test/docs").await);
        assert!(cache.get("https://x.test/docs").await.is_none());

        let page = Page::new("https://x.test/docs", "Docs", "body");
        cache.put("https://x.test/docs", page).await;

        assert!(cache.has("https://x.test/docs").await);
        let got = cache.get("https://x.test/docs").await.unwrap();
        assert_eq!(got.title, "Docs");
    }

    #[tokio::test]
    async fn test_json_cache_flush_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");

        let cache = JsonCache::open(&path);
        cache
            .put(
                "https://x.test/docs",
                Page::new("https://x.test/docs", "Docs", "body text"),
            )
            .await;
        cache.flush_all().await;

        let reopened = JsonCache::open(&path);
        let got = reopened.get("https://x.test/docs").await.unwrap();
        assert_eq!(got.title, "Docs");
        assert_eq!(got.content(), "body text");
    }

    #[tokio::test]
    async fn test_json_cache_malformed_file_is_cold() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "{not json").unwrap();

        let cache = JsonCache::open(&path);
        assert!(!cache.has("https://x.test/docs").await);
    }

    #[tokio::test]
    async fn test_json_cache_missing_file_is_cold() {
        let dir = tempfile::tempdir().unwrap();
        let cache = JsonCache::open(dir.path().join("nope.json"));
        assert!(cache.get("https://x.test/docs").await.is_none());
    }
}
