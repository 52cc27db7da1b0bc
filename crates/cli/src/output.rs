//! Rendering of pages and result lists for stdout.

use go2web_client::{FetchResponse, SearchResult, clean};
use go2web_core::Error;

/// Page as printed by `-u`: cleaned text, or the response bytes as received with `raw`.
pub fn render_page(page: &FetchResponse, raw: bool) -> Vec<u8> {
    let response = &page.response;
    if raw { response.as_bytes().to_vec() } else { clean(&response.body).into_bytes() }
}

/// Stderr line telling the user the page came from the disk cache.
pub fn cache_notice(page: &FetchResponse) -> Option<String> {
    page.from_cache.then(|| format!("(served from cache: {})", page.final_url))
}

/// Numbered result list, one blank line between entries.
pub fn render_results(results: &[SearchResult]) -> String {
    let mut out = String::new();
    for (i, result) in results.iter().enumerate() {
        out.push_str(&format!("{}. {}\n   {}\n", i + 1, result.title, result.url));
        if !result.description.is_empty() {
            out.push_str(&format!("   {}\n", result.description.replace('\n', " ")));
        }
        out.push('\n');
    }
    out
}

/// Interpret the prompt answer: `None` for empty input, otherwise a 1-based
/// index into `results`.
pub fn select<'a>(results: &'a [SearchResult], input: &str) -> Result<Option<&'a SearchResult>, Error> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }

    let number: usize = input
        .parse()
        .map_err(|_| Error::InvalidInput(format!("`{input}` is not a result number")))?;

    number
        .checked_sub(1)
        .and_then(|i| results.get(i))
        .map(Some)
        .ok_or_else(|| Error::InvalidInput(format!("choose a number between 1 and {}", results.len())))
}
