//! URL normalization for request targets and cache keys.

use std::fmt;

use url::Url;

/// Error type for URL normalization failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("missing host: {0}")]
    MissingHost(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<UrlError> for go2web_core::Error {
    fn from(err: UrlError) -> Self {
        go2web_core::Error::InvalidUrl(err.to_string())
    }
}

/// A normalized `http`/`https` request target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    url: Url,
}

impl Target {
    /// Normalize user input into a request target.
    ///
    /// Normalization steps:
    /// 1. Trim leading/trailing whitespace
    /// 2. Default scheme to http:// if missing
    /// 3. Lowercase the host
    /// 4. Remove fragment (#...)
    /// 5. Default an empty path to `/`, keep query string intact
    pub fn parse(input: &str) -> Result<Self, UrlError> {
        let trimmed = input.trim();

        if trimmed.is_empty() {
            return Err(UrlError::Empty);
        }

        let url_str = if trimmed.contains("://") { trimmed.to_string() } else { format!("http://{trimmed}") };
        let parsed = Url::parse(&url_str).map_err(|e| UrlError::InvalidUrl(format!("{trimmed}: {e}")))?;

        Self::from_url(parsed)
    }

    /// Wrap an already-parsed URL, applying the same checks as [`Target::parse`].
    pub fn from_url(mut url: Url) -> Result<Self, UrlError> {
        match url.scheme() {
            "http" | "https" => {}
            scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
        }

        let host = match url.host_str() {
            Some(h) if !h.is_empty() => h.to_lowercase(),
            _ => return Err(UrlError::MissingHost(url.to_string())),
        };
        url.set_host(Some(&host)).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

        url.set_fragment(None);
        if url.path().is_empty() {
            url.set_path("/");
        }

        Ok(Self { url })
    }

    /// Whether the connection must be wrapped in TLS.
    pub fn is_secure(&self) -> bool {
        self.url.scheme() == "https"
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    /// Host as it appears in the `Host` header and TLS server name.
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// Explicit port, or 80/443 by scheme.
    pub fn port(&self) -> u16 {
        self.url.port_or_known_default().unwrap_or(if self.is_secure() { 443 } else { 80 })
    }

    /// Request-line target: `path[?query]`.
    pub fn request_path(&self) -> String {
        let path = if self.url.path().is_empty() { "/" } else { self.url.path() };
        match self.url.query() {
            Some(query) => format!("{path}?{query}"),
            None => path.to_string(),
        }
    }

    /// The normalized URL string; cache keys are derived from this.
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Resolve a `Location` value against this target.
    pub fn join(&self, location: &str) -> Result<Self, UrlError> {
        let next = self
            .url
            .join(location.trim())
            .map_err(|e| UrlError::InvalidUrl(format!("{location}: {e}")))?;
        Self::from_url(next)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}
