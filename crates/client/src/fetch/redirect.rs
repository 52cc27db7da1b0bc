//! Redirect detection and target resolution.

use super::response::RawResponse;
use super::url::Target;
use go2web_core::Error;

/// Status codes followed as redirects.
pub const REDIRECT_CODES: [u16; 5] = [301, 302, 303, 307, 308];

/// Whether `response` is a redirect the fetcher should follow.
///
/// Requires an `HTTP/1.0` or `HTTP/1.1` status line with one of
/// [`REDIRECT_CODES`] and a non-empty `Location` header.
pub fn is_redirect(response: &RawResponse) -> bool {
    location(response).is_some()
}

fn location(response: &RawResponse) -> Option<&str> {
    let status = response.status()?;
    if !matches!(status.version.as_str(), "1.0" | "1.1") || !REDIRECT_CODES.contains(&status.code) {
        return None;
    }
    response.header("location").filter(|value| !value.is_empty())
}

/// Compute the next hop for a redirect response, or `None` for a terminal one.
pub fn next_hop(current: &Target, response: &RawResponse) -> Result<Option<Target>, Error> {
    let Some(location) = location(response) else {
        return Ok(None);
    };

    let next = current.join(location)?;
    tracing::debug!(from = %current, to = %next, status = response.status_line(), "following redirect");
    Ok(Some(next))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(head: &str) -> RawResponse {
        RawResponse::parse(format!("{head}\r\n\r\n").as_bytes()).unwrap()
    }

    #[test]
    fn test_all_redirect_codes_followed() {
        let current = Target::parse("http://example.com/").unwrap();
        for code in REDIRECT_CODES {
            let resp = response(&format!("HTTP/1.1 {code} Moved\r\nLocation: /next"));
            let next = next_hop(&current, &resp).unwrap().unwrap();
            assert_eq!(next.as_str(), "http://example.com/next");
        }
    }

    #[test]
    fn test_http_10_redirect() {
        let current = Target::parse("http://example.com/").unwrap();
        let resp = response("HTTP/1.0 302 Found\r\nLocation: http://other.example/");
        assert!(is_redirect(&resp));
        assert_eq!(next_hop(&current, &resp).unwrap().unwrap().as_str(), "http://other.example/");
    }

    #[test]
    fn test_path_absolute_location_keeps_scheme_and_host() {
        let current = Target::parse("https://example.com:8443/a/b").unwrap();
        let resp = response("HTTP/1.1 301 Moved Permanently\r\nLocation: /c?d=1");
        let next = next_hop(&current, &resp).unwrap().unwrap();
        assert_eq!(next.as_str(), "https://example.com:8443/c?d=1");
    }

    #[test]
    fn test_location_header_case_insensitive() {
        let resp = response("HTTP/1.1 307 Temporary Redirect\r\nLOCATION: /x");
        assert!(is_redirect(&resp));
    }

    #[test]
    fn test_redirect_without_location_is_terminal() {
        let current = Target::parse("http://example.com/").unwrap();
        let resp = response("HTTP/1.1 302 Found\r\nContent-Length: 0");
        assert!(next_hop(&current, &resp).unwrap().is_none());
    }

    #[test]
    fn test_empty_location_is_terminal() {
        let resp = response("HTTP/1.1 302 Found\r\nLocation: ");
        assert!(!is_redirect(&resp));
    }

    #[test]
    fn test_other_statuses_are_terminal() {
        for head in [
            "HTTP/1.1 200 OK\r\nLocation: /ignored",
            "HTTP/1.1 304 Not Modified\r\nLocation: /ignored",
            "HTTP/1.1 404 Not Found",
            "HTTP/1.1 500 Internal Server Error",
        ] {
            assert!(!is_redirect(&response(head)), "{head}");
        }
    }

    #[test]
    fn test_http2_status_line_not_followed() {
        let resp = response("HTTP/2 301 Moved\r\nLocation: /x");
        assert!(!is_redirect(&resp));
    }

    #[test]
    fn test_unsupported_location_scheme_errors() {
        let current = Target::parse("http://example.com/").unwrap();
        let resp = response("HTTP/1.1 302 Found\r\nLocation: ftp://example.com/file");
        assert!(matches!(next_hop(&current, &resp), Err(Error::InvalidUrl(_))));
    }
}
