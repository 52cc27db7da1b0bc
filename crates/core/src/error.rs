//! Unified error types for go2web.
//!
//! Every fetch-path failure surfaces as one of these variants. Display strings
//! carry an upper-case code prefix so the CLI can print them verbatim.

/// Unified error types for the go2web fetcher.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty search phrase).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Malformed or unsupported URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// DNS resolution, connect, TLS handshake, or socket I/O failure.
    #[error("TRANSPORT_ERROR: {0}")]
    Transport(String),

    /// Response bytes lack a header/body boundary or a readable status line.
    #[error("MALFORMED_RESPONSE: {0}")]
    MalformedResponse(String),

    /// Redirect chain exceeded the configured bound.
    #[error("REDIRECT_LOOP: more than {max} redirects while fetching {url}")]
    RedirectLoop { max: usize, url: String },

    /// Cache file could not be written. Never aborts a fetch.
    #[error("CACHE_WRITE: {0}")]
    CacheWrite(String),

    /// Existing cache file could not be read.
    #[error("CACHE_READ: {0}")]
    CacheRead(String),
}

impl Error {
    /// Whether this error is a warning that callers log and move past.
    pub fn is_warning(&self) -> bool {
        matches!(self, Error::CacheWrite(_) | Error::CacheRead(_))
    }
}
