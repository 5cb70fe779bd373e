//! Structured extraction from raw HTML
//!
//! Best-effort scanners for titles, anchors, code blocks, and API
//! signatures. Everything here is pure; malformed markup degrades to
//! empty results, never errors.

use crate::collab::convert::{attr_value, decode_entities};
use crate::collab::ContentExtractor;
use crate::types::{ApiEntry, CandidateLink, CodeExample};

/// Minimum characters for a code block to count as an example
const MIN_EXAMPLE_LEN: usize = 10;

/// Heading text length beyond which a heading is not an API name
const MAX_API_NAME_LEN: usize = 100;

/// Default HTML extractor
#[derive(Debug, Clone, Copy, Default)]
pub struct DomExtractor;

impl DomExtractor {
    /// Create an extractor
    pub fn new() -> Self {
        Self
    }
}

impl ContentExtractor for DomExtractor {
    fn title(&self, html: &str) -> String {
        extract_title(html).unwrap_or_else(|| "Untitled Page".to_string())
    }

    fn links(&self, html: &str) -> Vec<CandidateLink> {
        extract_links(html)
    }

    fn code_examples(&self, html: &str) -> Vec<CodeExample> {
        extract_code_examples(html)
    }

    fn api_entries(&self, html: &str) -> Vec<ApiEntry> {
        extract_api_entries(html)
    }
}

/// Case-insensitive substring search; needle must be ASCII
fn find_ci(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let h = haystack.as_bytes();
    let n = needle.as_bytes();
    if n.is_empty() || from >= h.len() {
        return None;
    }
    h[from..]
        .windows(n.len())
        .position(|w| w.eq_ignore_ascii_case(n))
        .map(|p| p + from)
}

/// Drop tags from a fragment, decoding entities, preserving layout
fn strip_tags(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len());
    let mut rest = fragment;
    while let Some(lt) = rest.find('<') {
        out.push_str(&rest[..lt]);
        match rest[lt..].find('>') {
            Some(gt) => rest = &rest[lt + gt + 1..],
            None => {
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    decode_entities(&out)
}

/// Collapse whitespace runs into single spaces and trim
fn clean_inline(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn extract_title(html: &str) -> Option<String> {
    let open = find_ci(html, "<title", 0)?;
    let start = html[open..].find('>').map(|p| open + p + 1)?;
    let end = find_ci(html, "</title", start)?;
    let title = clean_inline(&strip_tags(&html[start..end]));
    (!title.is_empty()).then_some(title)
}

fn extract_links(html: &str) -> Vec<CandidateLink> {
    let mut links = Vec::new();
    let mut pos = 0;
    while let Some(open) = find_ci(html, "<a", pos) {
        // Require a real anchor tag, not <abbr> etc.
        if !matches!(html.as_bytes().get(open + 2), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            pos = open + 2;
            continue;
        }
        let Some(tag_end) = html[open..].find('>').map(|p| open + p) else {
            break;
        };
        let tag = &html[open + 1..tag_end];
        let close = find_ci(html, "</a", tag_end).unwrap_or(html.len());
        if let Some(href) = attr_value(tag, "href") {
            if !href.is_empty() {
                let text = clean_inline(&strip_tags(&html[tag_end + 1..close]));
                links.push(CandidateLink::new(href, text));
            }
        }
        pos = close;
    }
    links
}

/// A heading and its byte range within the document
struct Heading {
    start: usize,
    body_end: usize,
    text: String,
}

fn scan_headings(html: &str) -> Vec<Heading> {
    let mut headings = Vec::new();
    let mut pos = 0;
    while let Some(open) = find_ci(html, "<h", pos) {
        let bytes = html.as_bytes();
        let level = match bytes.get(open + 2).copied() {
            Some(d @ b'1'..=b'6') => d - b'0',
            _ => {
                pos = open + 2;
                continue;
            }
        };
        if !matches!(bytes.get(open + 3), Some(b'>' | b' ' | b'\t' | b'\n' | b'\r')) {
            pos = open + 3;
            continue;
        }
        let Some(content_start) = html[open..].find('>').map(|p| open + p + 1) else {
            break;
        };
        let close_tag = format!("</h{}", (b'0' + level) as char);
        let Some(body_end) = find_ci(html, &close_tag, content_start) else {
            pos = content_start;
            continue;
        };
        headings.push(Heading {
            start: open,
            body_end,
            text: clean_inline(&strip_tags(&html[content_start..body_end])),
        });
        pos = body_end;
    }
    headings
}

/// Byte ranges of `<pre>` blocks, with fence language and inner text
fn scan_pre_blocks(html: &str) -> Vec<(usize, usize, String, String)> {
    let mut blocks = Vec::new();
    let mut pos = 0;
    while let Some(open) = find_ci(html, "<pre", pos) {
        if !matches!(html.as_bytes().get(open + 4), Some(b'>' | b' ' | b'\t' | b'\n' | b'\r')) {
            pos = open + 4;
            continue;
        }
        let Some(tag_end) = html[open..].find('>').map(|p| open + p) else {
            break;
        };
        let end = find_ci(html, "</pre", tag_end).unwrap_or(html.len());
        let inner = &html[tag_end + 1..end];
        let mut language = sniff_language(&html[open + 1..tag_end]);
        if language.is_empty() {
            // The language hint often sits on the nested <code> tag
            if let Some(code_open) = find_ci(inner, "<code", 0) {
                if let Some(code_end) = inner[code_open..].find('>') {
                    language = sniff_language(&inner[code_open + 1..code_open + code_end]);
                }
            }
        }
        blocks.push((open, end, language, strip_tags(inner).trim().to_string()));
        pos = end;
    }
    blocks
}

/// Language hint from class or data attributes on a code-bearing tag
fn sniff_language(tag: &str) -> String {
    for attr in ["data-language", "data-lang", "language"] {
        if let Some(value) = attr_value(tag, attr) {
            if !value.is_empty() {
                return value.to_lowercase();
            }
        }
    }
    if let Some(class) = attr_value(tag, "class") {
        let lower = class.to_lowercase();
        for marker in ["language-", "lang-", "syntax-"] {
            if let Some(start) = lower.find(marker) {
                let rest = &lower[start + marker.len()..];
                let end = rest
                    .find(|c: char| !c.is_ascii_alphanumeric())
                    .unwrap_or(rest.len());
                if end > 0 {
                    return rest[..end].to_string();
                }
            }
        }
        if lower.contains("typescript") || lower.split_whitespace().any(|c| c == "ts") {
            return "typescript".to_string();
        }
        if lower.contains("javascript") || lower.split_whitespace().any(|c| c == "js") {
            return "javascript".to_string();
        }
    }
    String::new()
}

fn extract_code_examples(html: &str) -> Vec<CodeExample> {
    let headings = scan_headings(html);
    let mut examples = Vec::new();

    for (start, _, language, code) in scan_pre_blocks(html) {
        if code.len() < MIN_EXAMPLE_LEN {
            continue;
        }
        let description = headings
            .iter()
            .rev()
            .find(|h| h.body_end < start)
            .map(|h| h.text.clone())
            .unwrap_or_default();
        examples.push(CodeExample {
            code,
            language,
            description,
        });
    }
    examples
}

fn extract_api_entries(html: &str) -> Vec<ApiEntry> {
    let headings = scan_headings(html);
    let pre_blocks = scan_pre_blocks(html);
    let mut entries = Vec::new();

    for (i, heading) in headings.iter().enumerate() {
        let name = &heading.text;
        let name_lower = name.to_lowercase();
        if name.is_empty()
            || name.len() > MAX_API_NAME_LEN
            || name_lower.contains("introduction")
            || name_lower.contains("getting started")
        {
            continue;
        }

        let region_end = headings
            .get(i + 1)
            .map(|next| next.start)
            .unwrap_or(html.len());

        // First code block between this heading and the next is the
        // signature; a call-shaped heading stands in when there is none.
        let signature = pre_blocks
            .iter()
            .find(|(start, _, _, _)| (heading.body_end..region_end).contains(start))
            .map(|(_, _, _, code)| clean_inline(code))
            .or_else(|| {
                (name.contains('(') && name.contains(')')).then(|| name.clone())
            });
        let Some(signature) = signature else {
            continue;
        };
        if signature.is_empty() {
            continue;
        }

        let description = first_paragraph(&html[heading.body_end..region_end]);

        entries.push(ApiEntry {
            name: name.clone(),
            signature,
            description,
        });
    }
    entries
}

/// Text of the first `<p>` element in a fragment
fn first_paragraph(fragment: &str) -> String {
    let Some(open) = find_ci(fragment, "<p", 0) else {
        return String::new();
    };
    if !matches!(fragment.as_bytes().get(open + 2), Some(b'>' | b' ' | b'\t' | b'\n' | b'\r')) {
        return String::new();
    }
    let Some(start) = fragment[open..].find('>').map(|p| open + p + 1) else {
        return String::new();
    };
    let end = find_ci(fragment, "</p", start).unwrap_or(fragment.len());
    clean_inline(&strip_tags(&fragment[start..end]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title() {
        let ex = DomExtractor::new();
        assert_eq!(ex.title("<head><title>My Docs</title></head>"), "My Docs");
        assert_eq!(ex.title("<head><TITLE> Spaced </TITLE></head>"), "Spaced");
        assert_eq!(ex.title("<p>no title</p>"), "Untitled Page");
    }

    #[test]
    fn test_links_with_text() {
        let ex = DomExtractor::new();
        let html = r#"<a href="/docs/api">API <b>Reference</b></a> <a href="/x">x</a> <abbr>n/a</abbr>"#;
        let links = ex.links(html);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].href, "/docs/api");
        assert_eq!(links[0].text, "API Reference");
        assert_eq!(links[1].href, "/x");
    }

    #[test]
    fn test_links_without_href_skipped() {
        let ex = DomExtractor::new();
        assert!(ex.links("<a name=\"anchor\">here</a>").is_empty());
    }

    #[test]
    fn test_code_examples() {
        let ex = DomExtractor::new();
        let html = r#"<h2>Install</h2><pre><code class="language-bash">cargo add docref</code></pre><pre>x</pre>"#;
        let examples = ex.code_examples(html);
        assert_eq!(examples.len(), 1); // short block dropped
        assert_eq!(examples[0].code, "cargo add docref");
        assert_eq!(examples[0].language, "bash");
        assert_eq!(examples[0].description, "Install");
    }

    #[test]
    fn test_api_entries_from_heading_and_code() {
        let ex = DomExtractor::new();
        let html = r#"
<h3>connect</h3>
<p>Opens a connection.</p>
<pre><code>connect(host: string, port: number)</code></pre>
<h3>Introduction</h3>
<p>Welcome.</p>
<h3>close()</h3>
<p>Closes it.</p>"#;
        let entries = ex.api_entries(html);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "connect");
        assert_eq!(entries[0].signature, "connect(host: string, port: number)");
        assert_eq!(entries[0].description, "Opens a connection.");
        // Call-shaped heading with no code block keeps its own text
        assert_eq!(entries[1].name, "close()");
        assert_eq!(entries[1].signature, "close()");
    }

    #[test]
    fn test_api_entries_skip_prose_headings() {
        let ex = DomExtractor::new();
        let html = "<h2>Getting Started</h2><pre>npm install thing</pre>";
        assert!(ex.api_entries(html).is_empty());
    }

    #[test]
    fn test_sniff_language_variants() {
        assert_eq!(sniff_language(r#"code class="language-rust""#), "rust");
        assert_eq!(sniff_language(r#"code data-lang="py""#), "py");
        assert_eq!(sniff_language(r#"code class="highlight js""#), "javascript");
        assert_eq!(sniff_language("code"), "");
    }

    #[test]
    fn test_strip_tags_decodes_entities() {
        assert_eq!(strip_tags("<b>a &amp; b</b>"), "a & b");
    }
}
