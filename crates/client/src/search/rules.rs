//! Named extraction rules for search result pages.
//!
//! Each rule is an independent matcher over raw markup. Primary rules look for
//! self-contained result blocks; fallback rules are looser and only consulted
//! when every primary rule comes back empty.

use std::sync::LazyLock;

use go2web_core::Error;
use regex::Regex;

use super::SearchResult;
use super::links::{classify, unwrap_redirect};
use crate::extract::clean;

static ANCHOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<a\b([^>]*)>(.*?)</a\s*>").expect("invalid regex"));
static HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)\bhref\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("invalid regex"));

/// Value of the `href` attribute in an attribute list, with `&amp;` decoded.
fn href_of(attrs: &str) -> Option<String> {
    let caps = HREF.captures(attrs)?;
    let raw = caps.get(1).or_else(|| caps.get(2))?.as_str();
    Some(raw.replace("&amp;", "&"))
}

/// Opening `tag` whose class list contains `class` as a whole
/// whitespace-separated token.
fn class_pattern(tag: &str, class: &str) -> String {
    format!(
        r#"(?is)<{tag}\b[^>]*\bclass\s*=\s*["'](?:[^"']*\s)?{}(?:\s[^"']*)?["']"#,
        regex::escape(class)
    )
}

fn compile(pattern: &str) -> Result<Regex, Error> {
    Regex::new(pattern).map_err(|e| Error::InvalidInput(format!("invalid extraction rule: {e}")))
}

/// Resolve an href to an accepted result URL, unwrapping engine redirects first.
fn accept_link(href: &str, engine_domain: &str) -> Option<String> {
    let destination = unwrap_redirect(href, engine_domain);
    match classify(&destination, engine_domain) {
        Ok(url) => Some(url.to_string()),
        Err(reason) => {
            tracing::trace!(href, ?reason, "skipping link");
            None
        }
    }
}

/// Matches markup blocks tagged with a result class.
///
/// The block spans from one result opening tag to the next (or the end of the
/// document). The first anchor with an `href` decides the URL: a relative or
/// internal link discards the whole block.
#[derive(Debug, Clone)]
pub struct BlockRule {
    name: &'static str,
    block_start: Regex,
    title_anchor: Regex,
    snippet: Regex,
}

impl BlockRule {
    /// Build a rule from the result, title-anchor and snippet class names.
    pub fn new(name: &'static str, block_class: &str, title_class: &str, snippet_class: &str) -> Result<Self, Error> {
        let block_start = compile(&class_pattern("(?:div|article|li|section|table)", block_class))?;
        let title_anchor = compile(&format!(r"{}[^>]*>(.*?)</a\s*>", class_pattern("a", title_class)))?;
        let snippet = compile(&format!(
            r"{}[^>]*>(.*?)</(?:a|div|span|td|p)\s*>",
            class_pattern("(?:a|div|span|td|p)", snippet_class)
        ))?;

        Ok(Self { name, block_start, title_anchor, snippet })
    }

    /// Rule for DuckDuckGo's HTML endpoint (`result`, `result__a`, `result__snippet`).
    pub fn duckduckgo() -> Result<Self, Error> {
        Self::new("result-blocks", "result", "result__a", "result__snippet")
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Slice `html` into result blocks in document order.
    fn blocks<'a>(&self, html: &'a str) -> Vec<&'a str> {
        let starts: Vec<usize> = self.block_start.find_iter(html).map(|m| m.start()).collect();
        starts
            .iter()
            .enumerate()
            .map(|(i, &start)| {
                let end = starts.get(i + 1).copied().unwrap_or(html.len());
                &html[start..end]
            })
            .collect()
    }

    fn extract_block(&self, block: &str, engine_domain: &str) -> Option<SearchResult> {
        let (href, first_text) = ANCHOR
            .captures_iter(block)
            .find_map(|caps| Some((href_of(caps.get(1)?.as_str())?, caps.get(2)?.as_str())))?;

        let url = accept_link(&href, engine_domain)?;

        let title_html = self
            .title_anchor
            .captures(block)
            .and_then(|caps| caps.get(1))
            .map_or(first_text, |m| m.as_str());
        let title = clean(title_html);

        let description = self
            .snippet
            .captures(block)
            .and_then(|caps| caps.get(1))
            .map(|m| clean(m.as_str()))
            .unwrap_or_default();

        if url.is_empty() || title.is_empty() {
            return None;
        }

        Some(SearchResult { title, url, description })
    }

    pub fn apply(&self, html: &str, engine_domain: &str) -> Vec<SearchResult> {
        self.blocks(html)
            .into_iter()
            .filter_map(|block| self.extract_block(block, engine_domain))
            .collect()
    }
}

/// Matches a block-level opening tag immediately followed by an anchor.
///
/// Descriptions are always empty.
#[derive(Debug, Clone)]
pub struct AnchorRule {
    name: &'static str,
    pattern: Regex,
}

impl AnchorRule {
    /// Build a rule matching anchors that open any of `container_tags`.
    pub fn new(name: &'static str, container_tags: &[&str]) -> Result<Self, Error> {
        let tags = container_tags.iter().map(|t| regex::escape(t)).collect::<Vec<_>>().join("|");
        let pattern = compile(&format!(r"(?is)<(?:{tags})\b[^>]*>\s*<a\b([^>]*)>(.*?)</a\s*>"))?;
        Ok(Self { name, pattern })
    }

    /// Headings, list items, cells and divisions that start with a link.
    pub fn loose() -> Result<Self, Error> {
        Self::new("loose-anchors", &["h1", "h2", "h3", "h4", "li", "div", "td", "article"])
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn apply(&self, html: &str, engine_domain: &str) -> Vec<SearchResult> {
        self.pattern
            .captures_iter(html)
            .filter_map(|caps| {
                let href = href_of(caps.get(1)?.as_str())?;
                let url = accept_link(&href, engine_domain)?;
                let title = clean(caps.get(2)?.as_str());
                (!title.is_empty()).then(|| SearchResult { title, url, description: String::new() })
            })
            .collect()
    }
}

/// A rule tagged with the phase it runs in.
#[derive(Debug, Clone)]
pub enum SearchRule {
    Primary(BlockRule),
    Fallback(AnchorRule),
}

impl SearchRule {
    pub fn name(&self) -> &'static str {
        match self {
            SearchRule::Primary(rule) => rule.name(),
            SearchRule::Fallback(rule) => rule.name(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, SearchRule::Fallback(_))
    }

    pub fn apply(&self, html: &str, engine_domain: &str) -> Vec<SearchResult> {
        match self {
            SearchRule::Primary(rule) => rule.apply(html, engine_domain),
            SearchRule::Fallback(rule) => rule.apply(html, engine_domain),
        }
    }
}
