//! HTML to markdown normalization
//!
//! A best-effort single-pass scanner, not a full DOM parser: good
//! enough for documentation pages, resilient to malformed markup, and
//! dependency-free. Heading markers come out as `#` lines so the
//! triage layer can split content at section boundaries.

use crate::collab::Normalizer;

/// Elements whose content is dropped entirely
const SKIP_TAGS: &[&str] = &[
    "script", "style", "noscript", "iframe", "svg", "canvas", "nav", "footer", "aside",
];

/// Default HTML to markdown normalizer
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownNormalizer;

impl MarkdownNormalizer {
    /// Create a normalizer
    pub fn new() -> Self {
        Self
    }
}

impl Normalizer for MarkdownNormalizer {
    fn to_text(&self, html: &str) -> String {
        html_to_markdown(html)
    }
}

struct Emitter {
    out: String,
    skip_stack: Vec<String>,
    list_depth: usize,
    in_pre: bool,
}

impl Emitter {
    fn new(capacity: usize) -> Self {
        Self {
            out: String::with_capacity(capacity),
            skip_stack: Vec::new(),
            list_depth: 0,
            in_pre: false,
        }
    }

    fn text(&mut self, raw: &str) {
        if !self.skip_stack.is_empty() {
            return;
        }
        let decoded = decode_entities(raw);
        if self.in_pre {
            self.out.push_str(&decoded);
            return;
        }
        // Source whitespace collapses to single spaces; structure comes
        // from tags, not from the document's formatting.
        for c in decoded.chars() {
            if c.is_whitespace() {
                if !self.out.ends_with([' ', '\n']) {
                    self.out.push(' ');
                }
            } else {
                self.out.push(c);
            }
        }
    }

    fn tag(&mut self, tag: &str) {
        let inner = tag.trim();
        let closing = inner.starts_with('/');
        let name_part = if closing { &inner[1..] } else { inner };
        let name = name_part
            .split(|c: char| c.is_whitespace() || c == '/')
            .next()
            .unwrap_or("")
            .to_lowercase();

        if SKIP_TAGS.contains(&name.as_str()) {
            if closing {
                if let Some(pos) = self.skip_stack.iter().rposition(|t| *t == name) {
                    self.skip_stack.remove(pos);
                }
            } else if !inner.ends_with('/') {
                self.skip_stack.push(name);
            }
            return;
        }
        if !self.skip_stack.is_empty() {
            return;
        }

        match name.as_str() {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                if closing {
                    self.out.push_str("\n\n");
                } else {
                    let level = name.as_bytes()[1] - b'0';
                    self.out.push_str("\n\n");
                    for _ in 0..level {
                        self.out.push('#');
                    }
                    self.out.push(' ');
                }
            }
            "p" | "div" | "section" | "article" | "main" | "table" | "tr" => {
                if closing {
                    self.out.push_str("\n\n");
                }
            }
            "br" => self.out.push('\n'),
            "hr" => self.out.push_str("\n\n---\n\n"),
            "ul" | "ol" => {
                if closing {
                    self.list_depth = self.list_depth.saturating_sub(1);
                    if self.list_depth == 0 {
                        self.out.push('\n');
                    }
                } else {
                    self.list_depth += 1;
                }
            }
            "li" => {
                if !closing {
                    self.out.push('\n');
                    for _ in 0..self.list_depth.saturating_sub(1) {
                        self.out.push_str("  ");
                    }
                    self.out.push_str("- ");
                }
            }
            "strong" | "b" => self.out.push_str("**"),
            "em" | "i" => self.out.push('*'),
            "pre" => {
                if closing {
                    self.out.push_str("\n```\n\n");
                    self.in_pre = false;
                } else {
                    self.out.push_str("\n\n```");
                    if let Some(lang) = fence_language(inner) {
                        self.out.push_str(&lang);
                    }
                    self.out.push('\n');
                    self.in_pre = true;
                }
            }
            "code" => {
                if !self.in_pre {
                    self.out.push('`');
                }
            }
            "blockquote" => {
                if !closing {
                    self.out.push_str("\n\n> ");
                } else {
                    self.out.push('\n');
                }
            }
            _ => {}
        }
    }
}

/// Convert an HTML document to markdown text
pub fn html_to_markdown(html: &str) -> String {
    let mut emitter = Emitter::new(html.len() / 2);
    let mut rest = html;

    while let Some(lt) = rest.find('<') {
        emitter.text(&rest[..lt]);
        let after = &rest[lt + 1..];
        match after.find('>') {
            Some(gt) => {
                emitter.tag(&after[..gt]);
                rest = &after[gt + 1..];
            }
            None => {
                // Unterminated tag; drop the remainder
                rest = "";
                break;
            }
        }
    }
    emitter.text(rest);

    tidy(&emitter.out)
}

/// Language hint from a `class` or `data-lang` style attribute
fn fence_language(tag: &str) -> Option<String> {
    for attr in ["data-language", "data-lang", "lang"] {
        if let Some(value) = attr_value(tag, attr) {
            if !value.is_empty() {
                return Some(value.to_lowercase());
            }
        }
    }
    let class = attr_value(tag, "class")?;
    let lower = class.to_lowercase();
    for marker in ["language-", "lang-", "syntax-"] {
        if let Some(start) = lower.find(marker) {
            let rest = &lower[start + marker.len()..];
            let end = rest
                .find(|c: char| !c.is_ascii_alphanumeric())
                .unwrap_or(rest.len());
            if end > 0 {
                return Some(rest[..end].to_string());
            }
        }
    }
    None
}

/// Extract an attribute value from the inside of a tag
///
/// Matches the attribute name case-insensitively over the raw bytes;
/// a matched window is pure ASCII, so the offsets are always char
/// boundaries even when surrounding text is not.
pub(crate) fn attr_value(tag: &str, attr: &str) -> Option<String> {
    let bytes = tag.as_bytes();
    let pattern = format!("{attr}=");
    let pat = pattern.as_bytes();
    let mut search_from = 0;
    while let Some(found) = bytes[search_from..]
        .windows(pat.len())
        .position(|w| w.eq_ignore_ascii_case(pat))
    {
        let start = search_from + found;
        // Must be a standalone attribute name, not a suffix of another
        let standalone = start == 0 || bytes[start - 1].is_ascii_whitespace();
        if !standalone {
            search_from = start + pat.len();
            continue;
        }
        let rest = tag[start + pat.len()..].trim_start();
        return Some(match rest.as_bytes().first() {
            Some(b'"') => rest[1..].split('"').next().unwrap_or("").to_string(),
            Some(b'\'') => rest[1..].split('\'').next().unwrap_or("").to_string(),
            _ => rest
                .split(|c: char| c.is_whitespace() || c == '>')
                .next()
                .unwrap_or("")
                .to_string(),
        });
    }
    None
}

/// Decode the common named and numeric HTML entities
pub(crate) fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];
        match tail.find(';').filter(|&end| end <= 10) {
            Some(end) => {
                let entity = &tail[..end];
                match decode_entity(entity) {
                    Some(c) => out.push(c),
                    None => {
                        out.push('&');
                        out.push_str(entity);
                        out.push(';');
                    }
                }
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" | "#39" => Some('\''),
        "nbsp" => Some(' '),
        "mdash" => Some('\u{2014}'),
        "ndash" => Some('\u{2013}'),
        "copy" => Some('\u{a9}'),
        "reg" => Some('\u{ae}'),
        _ => {
            let num = entity.strip_prefix('#')?;
            let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// Trim the result and squeeze runs of blank lines down to one
fn tidy(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newlines = 0;
    for c in text.chars() {
        if c == '\n' {
            while out.ends_with(' ') {
                out.pop();
            }
            newlines += 1;
            if newlines <= 2 {
                out.push('\n');
            }
        } else {
            newlines = 0;
            out.push(c);
        }
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headings() {
        let md = html_to_markdown("<h1>Title</h1><h2>Section</h2><h3>Sub</h3>");
        assert!(md.contains("# Title"));
        assert!(md.contains("## Section"));
        assert!(md.contains("### Sub"));
    }

    #[test]
    fn test_paragraphs_and_lists() {
        let md = html_to_markdown("<p>First</p><p>Second</p><ul><li>One</li><li>Two</li></ul>");
        assert!(md.contains("First\n\nSecond"));
        assert!(md.contains("- One"));
        assert!(md.contains("- Two"));
    }

    #[test]
    fn test_nested_list_indentation() {
        let md = html_to_markdown("<ul><li>Outer<ul><li>Inner</li></ul></li></ul>");
        assert!(md.contains("- Outer"));
        assert!(md.contains("  - Inner"));
    }

    #[test]
    fn test_emphasis_and_inline_code() {
        let md = html_to_markdown("<p><strong>bold</strong> and <em>italic</em> and <code>x</code></p>");
        assert!(md.contains("**bold**"));
        assert!(md.contains("*italic*"));
        assert!(md.contains("`x`"));
    }

    #[test]
    fn test_pre_block_with_language() {
        let md = html_to_markdown("<pre class=\"language-rust\"><code>fn main() {}</code></pre>");
        assert!(md.contains("```rust"));
        assert!(md.contains("fn main() {}"));
    }

    #[test]
    fn test_script_and_nav_dropped() {
        let md = html_to_markdown(
            "<nav><a href=\"/\">Home</a></nav><p>Body</p><script>alert('x');</script>",
        );
        assert!(md.contains("Body"));
        assert!(!md.contains("alert"));
        assert!(!md.contains("Home"));
    }

    #[test]
    fn test_entity_decoding() {
        assert_eq!(decode_entities("Tom &amp; Jerry &lt;3"), "Tom & Jerry <3");
        assert_eq!(decode_entities("&#65;&#x42;"), "AB");
        assert_eq!(decode_entities("broken &unknownentity; stays"), "broken &unknownentity; stays");
    }

    #[test]
    fn test_attr_value() {
        assert_eq!(
            attr_value("a href=\"/docs\" class=link", "href"),
            Some("/docs".to_string())
        );
        assert_eq!(
            attr_value("a href='/docs'", "href"),
            Some("/docs".to_string())
        );
        assert_eq!(attr_value("a href=/docs", "href"), Some("/docs".to_string()));
        assert_eq!(attr_value("a class=x", "href"), None);
        // data-lang must not satisfy a lookup for lang
        assert_eq!(attr_value("code data-lang=\"py\"", "lang"), None);
    }

    #[test]
    fn test_attr_value_case_insensitive_name() {
        assert_eq!(
            attr_value("a HREF=\"/docs\"", "href"),
            Some("/docs".to_string())
        );
    }

    #[test]
    fn test_attr_value_with_multibyte_text() {
        // Non-ASCII text elsewhere in the tag must not shift offsets
        assert_eq!(
            attr_value("a title=\"İzmir Guide\" href=\"/π/docs\"", "href"),
            Some("/π/docs".to_string())
        );
        assert_eq!(
            attr_value("a title=\"İ\" href=π/docs", "href"),
            Some("π/docs".to_string())
        );
        assert_eq!(
            attr_value("a title=\"Überblick\" class=x", "href"),
            None
        );
    }

    #[test]
    fn test_blank_line_squeeze() {
        let md = html_to_markdown("<div></div><div></div><div></div><p>Text</p>");
        assert!(!md.contains("\n\n\n"));
    }

    #[test]
    fn test_malformed_markup_best_effort() {
        let md = html_to_markdown("<p>ok</p><h1>Trailing");
        assert!(md.contains("ok"));
        assert!(md.contains("# Trailing"));
    }
}
