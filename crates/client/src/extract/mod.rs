//! Plain-text extraction from HTML.
//!
//! Extraction is pattern based and best effort; malformed or unbalanced
//! markup may leave stray fragments behind.
//!
//! ### Pipeline
//! Each step runs on the output of the previous one:
//! 1. Drop `<!DOCTYPE ...>` declarations
//! 2. Drop `<script>` and `<style>` blocks with their content
//! 3. Drop `<!-- ... -->` comments
//! 4. Replace every remaining tag with a single space
//! 5. Decode `&lt; &gt; &amp; &quot; &apos; &nbsp;`, drop numeric
//!    references, turn any other named entity into a space
//! 6. Collapse whitespace runs to one space
//! 7. Break the line after every `. `
//! 8. Trim

use std::sync::LazyLock;

use regex::{Captures, Regex};

static DOCTYPE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<!DOCTYPE[^>]*>").expect("invalid regex"));
static SCRIPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b.*?</script\s*>").expect("invalid regex"));
static STYLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<style\b.*?</style\s*>").expect("invalid regex"));
static COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("invalid regex"));
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("invalid regex"));
static ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z][a-zA-Z0-9]*);").expect("invalid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("invalid regex"));
static TITLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title\s*>").expect("invalid regex"));

/// Convert an HTML document or fragment to readable plain text.
pub fn clean(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }

    let text = DOCTYPE.replace_all(html, "");
    let text = SCRIPT.replace_all(&text, "");
    let text = STYLE.replace_all(&text, "");
    let text = COMMENT.replace_all(&text, "");
    let text = TAG.replace_all(&text, " ");
    let text = decode_entities(&text);
    let text = WHITESPACE.replace_all(&text, " ");
    let text = text.replace(". ", ".\n");

    text.trim().to_string()
}

/// Decode the supported entity set in a single pass.
///
/// Decoded output is never re-scanned, so `&amp;lt;` becomes `&lt;`.
pub fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures| {
            let name = &caps[1];
            if name.starts_with('#') {
                return String::new();
            }
            match name {
                "lt" => "<",
                "gt" => ">",
                "amp" => "&",
                "quot" => "\"",
                "apos" => "'",
                "nbsp" => " ",
                _ => " ",
            }
            .to_string()
        })
        .into_owned()
}

/// Cleaned text of the first `<title>` element, if any.
pub fn page_title(html: &str) -> Option<String> {
    let raw = TITLE.captures(html)?.get(1)?.as_str();
    let title = clean(raw);
    (!title.is_empty()).then_some(title)
}
