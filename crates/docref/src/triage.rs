//! Post-crawl content triage
//!
//! Runs once over the accepted result set, shrinking any page that
//! threatens the per-page ceiling. Pages at or under half the ceiling
//! pass untouched; pages far over it are structurally reduced; the
//! band in between is offered to the external summarizer, with
//! reduction as the fallback for any failure.

use crate::collab::Summarizer;
use crate::types::{Page, ShrinkState};
use tracing::{debug, warn};

/// Keywords that mark a section worth keeping during reduction
const SECTION_KEYWORDS: &[&str] = &[
    "api",
    "method",
    "function",
    "class",
    "interface",
    "parameter",
    "return",
    "example",
    "usage",
];

/// Minimum sections to keep when reducing
const MIN_SECTIONS: usize = 3;

/// Notice prepended to structurally reduced content
const REDUCTION_NOTICE: &str =
    "> Note: This page was automatically reduced to focus on key content.";

/// Notice prepended to externally summarized content
const SUMMARY_NOTICE: &str =
    "> Note: This is an AI-generated summary of the original documentation page.";

/// Shrink a page that would blow the per-page token ceiling
///
/// Idempotent for pages under the 0.5x threshold; an already-shrunk
/// page re-entering triage is handled like any other (though the
/// orchestrator only runs triage once per page per crawl).
pub async fn triage(
    mut page: Page,
    per_page_ceiling: usize,
    summarizer: Option<&dyn Summarizer>,
) -> Page {
    let tokens = page.token_count() as f64;
    let ceiling = per_page_ceiling as f64;

    if tokens <= ceiling * 0.5 {
        return page;
    }

    if tokens > ceiling * 0.75 {
        debug!(url = %page.url, tokens = page.token_count(), "Reducing oversized page");
        reduce(&mut page);
        return page;
    }

    // Mid-band: summarize when a summarizer is available, otherwise
    // reduce. Summarization failures also land on the reduction path;
    // a page is never dropped because summarization failed.
    match summarizer {
        Some(s) => match s.summarize(&page.title, page.content()).await {
            Ok(summary) => {
                let content = format!("{SUMMARY_NOTICE}\n\n{summary}");
                page.set_content(content, ShrinkState::Summarized);
            }
            Err(err) => {
                warn!(url = %page.url, error = %err, "Summarization failed, reducing instead");
                reduce(&mut page);
            }
        },
        None => reduce(&mut page),
    }
    page
}

/// Structurally reduce a page to its key sections
///
/// Splits at heading boundaries, keeps keyword-bearing sections, and
/// backfills with the first three original sections when too few
/// survive so intro context is preserved.
fn reduce(page: &mut Page) {
    let sections = split_sections(page.content());

    let mut kept: Vec<&str> = sections
        .iter()
        .copied()
        .filter(|s| section_is_relevant(s))
        .collect();

    if kept.len() < MIN_SECTIONS && sections.len() > MIN_SECTIONS {
        for section in sections.iter().take(MIN_SECTIONS) {
            if !kept.contains(section) {
                kept.push(section);
            }
        }
    }

    let body = kept.join("\n\n");
    page.set_content(format!("{REDUCTION_NOTICE}\n\n{body}"), ShrinkState::Reduced);
}

/// Split text into sections at level 1-3 heading boundaries
///
/// Text before the first heading forms its own leading section.
fn split_sections(text: &str) -> Vec<&str> {
    let mut boundaries = vec![0];
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if offset > 0 && is_heading_line(line) {
            boundaries.push(offset);
        }
        offset += line.len();
    }
    boundaries.push(text.len());

    boundaries
        .windows(2)
        .map(|w| text[w[0]..w[1]].trim_end_matches('\n'))
        .filter(|s| !s.is_empty())
        .collect()
}

/// A markdown heading of level 1-3, e.g. `## Usage`
fn is_heading_line(line: &str) -> bool {
    let hashes = line.bytes().take_while(|&b| b == b'#').count();
    (1..=3).contains(&hashes) && line.as_bytes().get(hashes) == Some(&b' ')
}

fn section_is_relevant(section: &str) -> bool {
    let lower = section.to_lowercase();
    SECTION_KEYWORDS.iter().any(|kw| lower.contains(kw))
}
