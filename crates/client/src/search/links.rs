//! Result link normalization and filtering.

use url::Url;

/// Unwrap a search engine redirect link to its destination.
///
/// DuckDuckGo wraps hits as `//duckduckgo.com/l/?uddg=<encoded>&rut=...`;
/// anything that is not such a wrapper is returned unchanged.
pub fn unwrap_redirect(href: &str, engine_domain: &str) -> String {
    let trimmed = href.trim();
    let absolute = if trimmed.starts_with("//") { format!("https:{trimmed}") } else { trimmed.to_string() };

    let Ok(parsed) = Url::parse(&absolute) else {
        return trimmed.to_string();
    };
    if !parsed.host_str().is_some_and(|host| is_same_site(host, engine_domain)) || !parsed.path().starts_with("/l/") {
        return trimmed.to_string();
    }

    parsed
        .query_pairs()
        .find(|(key, _)| key == "uddg")
        .map(|(_, value)| value.trim().to_string())
        .filter(|dest| dest.starts_with("http://") || dest.starts_with("https://"))
        .unwrap_or_else(|| trimmed.to_string())
}

/// Why a link was rejected as a result URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkRejection {
    Empty,
    Relative,
    Script,
    Internal,
    Unparseable,
}

/// Accept `href` as an external result URL or say why not.
pub fn classify(href: &str, engine_domain: &str) -> Result<Url, LinkRejection> {
    let href = href.trim();
    if href.is_empty() {
        return Err(LinkRejection::Empty);
    }
    if href.starts_with('/') || href.starts_with('#') || href.starts_with('?') {
        return Err(LinkRejection::Relative);
    }
    if href.get(..11).is_some_and(|prefix| prefix.eq_ignore_ascii_case("javascript:")) {
        return Err(LinkRejection::Script);
    }

    let url = Url::parse(href).map_err(|_| LinkRejection::Unparseable)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(LinkRejection::Unparseable);
    }
    match url.host_str() {
        Some(host) if is_same_site(host, engine_domain) => Err(LinkRejection::Internal),
        Some(_) => Ok(url),
        None => Err(LinkRejection::Unparseable),
    }
}

/// Whether `host` is `domain` or one of its subdomains.
pub fn is_same_site(host: &str, domain: &str) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    let domain = domain.trim_end_matches('.').to_ascii_lowercase();
    !domain.is_empty() && (host == domain || host.ends_with(&format!(".{domain}")))
}
