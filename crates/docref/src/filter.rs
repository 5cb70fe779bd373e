//! Relevance filtering of outbound links
//!
//! Pure logic: candidate links in, absolute in-scope URLs out. No I/O
//! and no mutation, so the whole module is unit-testable against
//! literal fixtures.

use crate::types::CandidateLink;
use std::collections::HashSet;
use url::Url;

/// Keywords that mark a link as documentation-relevant
const LINK_KEYWORDS: &[&str] = &["api", "reference", "doc", "guide", "example", "tutorial"];

/// Locale and version constraints inferred from the crawl's anchor URL
///
/// Built once per run. When single-variant mode is on, links whose
/// path carries a *different* locale or version segment are dropped;
/// links with no such segment pass.
#[derive(Debug, Clone)]
pub struct VariantAnchor {
    host: String,
    locale: Option<String>,
    version: Option<String>,
}

impl VariantAnchor {
    /// Infer locale and version tokens from the anchor URL's path
    pub fn infer(anchor: &Url) -> Self {
        let segments: Vec<&str> = anchor
            .path_segments()
            .map(|s| s.filter(|p| !p.is_empty()).collect())
            .unwrap_or_default();

        let locale = segments
            .iter()
            .find(|p| is_locale_segment(p))
            .map(|p| p.to_string());
        let version = segments
            .iter()
            .find(|p| is_version_segment(p))
            .map(|p| p.to_string());

        Self {
            host: anchor.host_str().unwrap_or_default().to_string(),
            locale,
            version,
        }
    }

    /// Hostname links must match to stay in scope
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Inferred locale segment, e.g. `en`
    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    /// Inferred version segment, e.g. `v2`
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Does this URL's path carry a locale or version that conflicts
    /// with the anchor's?
    fn conflicts_with(&self, url: &Url) -> bool {
        let Some(segments) = url.path_segments() else {
            return false;
        };
        for part in segments.filter(|p| !p.is_empty()) {
            if let Some(locale) = &self.locale {
                if is_locale_segment(part) && part != locale {
                    return true;
                }
            }
            if let Some(version) = &self.version {
                if is_version_segment(part) && part != version {
                    return true;
                }
            }
        }
        false
    }
}

/// Exactly two lowercase ASCII letters, e.g. `en`, `fr`
fn is_locale_segment(part: &str) -> bool {
    part.len() == 2 && part.bytes().all(|b| b.is_ascii_lowercase())
}

/// A version-like path segment: `v2`, `2`, `3.1`, `2.x`
fn is_version_segment(part: &str) -> bool {
    let rest = part.strip_prefix('v').unwrap_or(part);
    let digits = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return false;
    }
    match &rest[digits..] {
        "" | "." | "x" | ".x" => true,
        tail => {
            tail.len() > 1
                && tail.starts_with('.')
                && tail[1..].bytes().all(|b| b.is_ascii_digit())
        }
    }
}

/// Filter a page's candidate links down to in-scope crawl targets
///
/// - unparseable links are silently dropped
/// - cross-origin links (host differs from the anchor's) are dropped
/// - in single-variant mode, links with a conflicting locale or
///   version segment are dropped
/// - the rest are kept only if the path or anchor text contains a
///   documentation keyword, or the path contains the library name
/// - duplicates collapse to their first occurrence, preserving order
pub fn filter_links(
    candidates: &[CandidateLink],
    page_url: &Url,
    anchor: &VariantAnchor,
    library_name: &str,
    single_variant: bool,
) -> Vec<String> {
    let library_lower = library_name.to_lowercase();
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for candidate in candidates {
        let Ok(resolved) = page_url.join(&candidate.href) else {
            continue;
        };
        if resolved.host_str().unwrap_or_default() != anchor.host() {
            continue;
        }
        if single_variant && anchor.conflicts_with(&resolved) {
            continue;
        }

        let path_lower = resolved.path().to_lowercase();
        let text_lower = candidate.text.to_lowercase();
        let relevant = LINK_KEYWORDS
            .iter()
            .any(|kw| path_lower.contains(kw) || text_lower.contains(kw))
            || (!library_lower.is_empty() && path_lower.contains(&library_lower));
        if !relevant {
            continue;
        }

        let absolute = resolved.to_string();
        if seen.insert(absolute.clone()) {
            links.push(absolute);
        }
    }

    links
}
