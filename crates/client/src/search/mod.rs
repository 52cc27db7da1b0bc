//! Search result scraping.
//!
//! ### Query URL
//! Terms are joined with single spaces and every space becomes `+`; no other
//! percent-encoding is applied before substituting into the `{query}` slot.
//!
//! ### Extraction
//! - Primary rules match self-contained result blocks
//! - Fallback rules run only when every primary rule came back empty
//! - Engine redirect wrappers are unwrapped before filtering, then relative,
//!   `javascript:` and same-site links are dropped
//! - Document order is kept and duplicates are not removed

pub mod links;
pub mod rules;

pub use links::{LinkRejection, classify, is_same_site, unwrap_redirect};
pub use rules::{AnchorRule, BlockRule, SearchRule};

use go2web_core::Error;
use go2web_core::config::QUERY_PLACEHOLDER;

use crate::fetch::{FetchClient, Transport};

/// One scraped search hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    /// Snippet text; empty when the page had none
    pub description: String,
}

/// Build the results page URL for `terms`.
pub fn search_url<S: AsRef<str>>(template: &str, terms: &[S]) -> Result<String, Error> {
    let phrase = terms
        .iter()
        .map(|t| t.as_ref().trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if phrase.is_empty() {
        return Err(Error::InvalidInput("search phrase is empty".to_string()));
    }
    if !template.contains(QUERY_PLACEHOLDER) {
        return Err(Error::InvalidInput(format!("search URL template has no `{QUERY_PLACEHOLDER}` slot")));
    }

    Ok(template.replace(QUERY_PLACEHOLDER, &phrase.replace(' ', "+")))
}

/// Ordered set of rules run against one engine's results page.
#[derive(Debug, Clone)]
pub struct SearchExtractor {
    domain: String,
    rules: Vec<SearchRule>,
}

impl SearchExtractor {
    /// Extractor with the DuckDuckGo block rule and the loose anchor fallback.
    pub fn new(domain: impl Into<String>) -> Result<Self, Error> {
        Ok(Self {
            domain: domain.into(),
            rules: vec![SearchRule::Primary(BlockRule::duckduckgo()?), SearchRule::Fallback(AnchorRule::loose()?)],
        })
    }

    /// Extractor with no rules; add them with [`SearchExtractor::with_rule`].
    pub fn empty(domain: impl Into<String>) -> Self {
        Self { domain: domain.into(), rules: Vec::new() }
    }

    pub fn with_rule(mut self, rule: SearchRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn rules(&self) -> &[SearchRule] {
        &self.rules
    }

    pub fn extract(&self, html: &str) -> Vec<SearchResult> {
        let primary = self.run_phase(html, false);
        if !primary.is_empty() {
            return primary;
        }

        let fallback = self.run_phase(html, true);
        tracing::debug!(count = fallback.len(), "primary rules found nothing, used fallback");
        fallback
    }

    fn run_phase(&self, html: &str, fallback: bool) -> Vec<SearchResult> {
        self.rules
            .iter()
            .filter(|rule| rule.is_fallback() == fallback)
            .flat_map(|rule| {
                let found = rule.apply(html, &self.domain);
                tracing::debug!(rule = rule.name(), count = found.len(), "applied search rule");
                found
            })
            .collect()
    }
}

/// Fetch the results page for `terms` and scrape it.
pub fn search<T: Transport, S: AsRef<str>>(
    client: &FetchClient<T>, extractor: &SearchExtractor, template: &str, terms: &[S],
) -> Result<Vec<SearchResult>, Error> {
    let url = search_url(template, terms)?;
    let page = client.fetch(&url)?;
    let results = extractor.extract(&page.response.body);

    tracing::debug!(url = %page.final_url, count = results.len(), "search complete");
    Ok(results)
}
