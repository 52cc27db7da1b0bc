//! HTTP fetch pipeline over raw sockets with an opportunistic disk cache.
//!
//! ### Request Framing
//! - One `GET` per connection with `Connection: close`
//! - The body is whatever arrives before the peer closes; no chunked or
//!   length-delimited decoding, no compression
//!
//! ### Redirects
//! - 301/302/303/307/308 with a `Location` header are followed
//! - Max redirects: 5 (configurable); exceeding it fails with `RedirectLoop`
//! - Every hop looks up and stores the cache under its own resolved URL
//!
//! ### Cache
//! - Fresh entries skip the network entirely
//! - Only terminal (non-redirect) network responses are stored
//! - Write failures are logged and never fail the fetch

pub mod redirect;
pub mod response;
pub mod transport;
pub mod url;

#[cfg(test)]
pub(crate) mod testing;

use std::time::{Duration, Instant};

pub use redirect::{REDIRECT_CODES, is_redirect, next_hop};
pub use response::{HEADER_TERMINATOR, RawResponse, StatusLine};
pub use transport::{BoxedIoStream, IoStream, NetTransport, Transport, build_request, exchange};
pub use url::{Target, UrlError};

use go2web_core::{AppConfig, CacheStore, Error, compute_cache_key};

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "go2web/1.0")
    pub user_agent: String,

    /// Accept header value
    pub accept: String,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,

    /// Socket timeout; `None` blocks indefinitely (default: None)
    pub timeout: Option<Duration>,

    /// Skip cache reads while still storing fresh responses (default: false)
    pub bypass_cache: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "go2web/1.0".to_string(),
            accept: "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".to_string(),
            max_redirects: 5,
            timeout: None,
            bypass_cache: false,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            accept: config.accept.clone(),
            max_redirects: config.max_redirects,
            timeout: config.timeout(),
            bypass_cache: false,
        }
    }
}

/// Response from a fetch operation.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// The original URL requested
    pub url: Target,
    /// The final URL after redirects
    pub final_url: Target,
    /// Header block and body of the terminal response
    pub response: RawResponse,
    /// Whether the terminal response was served from the disk cache
    pub from_cache: bool,
    /// Number of redirect hops followed
    pub redirects: usize,
    /// Time taken in milliseconds
    pub fetch_ms: u64,
}

/// Fetch client composing cache, transport, parser and redirect resolver.
pub struct FetchClient<T: Transport = NetTransport> {
    transport: T,
    cache: Option<CacheStore>,
    config: FetchConfig,
}

impl FetchClient<NetTransport> {
    /// Create a fetch client over real sockets.
    pub fn new(config: FetchConfig, cache: Option<CacheStore>) -> Result<Self, Error> {
        let transport = NetTransport::new(config.timeout)?;
        Ok(Self::with_transport(transport, config, cache))
    }
}

impl<T: Transport> FetchClient<T> {
    /// Create a fetch client over a custom transport.
    pub fn with_transport(transport: T, config: FetchConfig, cache: Option<CacheStore>) -> Self {
        Self { transport, cache, config }
    }

    /// Fetch a URL, following redirects and consulting the cache at every hop.
    pub fn fetch(&self, url_str: &str) -> Result<FetchResponse, Error> {
        let target = Target::parse(url_str)?;
        self.fetch_target(target)
    }

    /// Fetch an already-normalized target.
    pub fn fetch_target(&self, requested: Target) -> Result<FetchResponse, Error> {
        let start = Instant::now();
        let mut current = requested.clone();
        let mut redirects = 0;

        loop {
            let key = compute_cache_key(current.as_str());

            let (response, from_cache) = match self.lookup(&key, &current) {
                Some(cached) => (cached, true),
                None => (self.request(&current)?, false),
            };

            match next_hop(&current, &response)? {
                Some(next) => {
                    if redirects == self.config.max_redirects {
                        return Err(Error::RedirectLoop { max: self.config.max_redirects, url: requested.to_string() });
                    }
                    redirects += 1;
                    current = next;
                }
                None => {
                    if !from_cache && let Some(cache) = &self.cache {
                        cache.put(&key, response.header_bytes(), response.body_bytes());
                    }

                    let fetch_ms = start.elapsed().as_millis() as u64;
                    tracing::debug!(
                        "fetched {} -> {} in {}ms ({} bytes, {} redirects, cache hit: {})",
                        requested,
                        current,
                        fetch_ms,
                        response.body_bytes().len(),
                        redirects,
                        from_cache
                    );

                    return Ok(FetchResponse {
                        url: requested,
                        final_url: current,
                        response,
                        from_cache,
                        redirects,
                        fetch_ms,
                    });
                }
            }
        }
    }

    /// Read a fresh cache entry for `target`. Unreadable or corrupt entries count as misses.
    fn lookup(&self, key: &str, target: &Target) -> Option<RawResponse> {
        if self.config.bypass_cache {
            return None;
        }
        let cache = self.cache.as_ref()?;

        let entry = match cache.get(key) {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(url = %target, error = %e, "ignoring unreadable cache entry");
                return None;
            }
        };

        match RawResponse::parse(&entry.bytes) {
            Ok(response) => {
                tracing::info!(url = %target, key, "served from cache");
                Some(response)
            }
            Err(e) => {
                tracing::warn!(url = %target, error = %e, "ignoring corrupt cache entry");
                None
            }
        }
    }

    /// Perform one request/response exchange over a fresh connection.
    fn request(&self, target: &Target) -> Result<RawResponse, Error> {
        let request = build_request(target, &self.config.user_agent, &self.config.accept);
        let mut stream = self.transport.connect(target.host(), target.port(), target.is_secure())?;

        tracing::debug!(url = %target, bytes = request.len(), "sending request");
        let raw = exchange(&mut *stream, request.as_bytes())?;
        tracing::debug!(url = %target, bytes = raw.len(), "received response");

        RawResponse::parse(&raw)
    }

    /// Get reference to the cache store, if caching is enabled.
    pub fn cache(&self) -> Option<&CacheStore> {
        self.cache.as_ref()
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}
