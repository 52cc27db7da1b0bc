//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (GO2WEB_*)
//! 2. TOML config file (if GO2WEB_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Placeholder substituted with the encoded search phrase in `search_url`.
pub const QUERY_PLACEHOLDER: &str = "{query}";

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (GO2WEB_*)
/// 2. TOML config file (if GO2WEB_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding one file per cached response.
    ///
    /// Set via GO2WEB_CACHE_DIR environment variable.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Seconds a cached response stays fresh.
    ///
    /// Set via GO2WEB_CACHE_TTL_SECS environment variable.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Whether responses are read from and written to the disk cache.
    ///
    /// Set via GO2WEB_CACHE_ENABLED environment variable.
    #[serde(default = "default_true")]
    pub cache_enabled: bool,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via GO2WEB_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Accept header sent with every request.
    ///
    /// Set via GO2WEB_ACCEPT environment variable.
    #[serde(default = "default_accept")]
    pub accept: String,

    /// Maximum number of redirect hops to follow.
    ///
    /// Set via GO2WEB_MAX_REDIRECTS environment variable.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Socket connect/read/write timeout in milliseconds. Unset means block forever.
    ///
    /// Set via GO2WEB_TIMEOUT_MS environment variable.
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Search engine URL template containing `{query}`.
    ///
    /// Set via GO2WEB_SEARCH_URL environment variable.
    #[serde(default = "default_search_url")]
    pub search_url: String,

    /// Domain whose links are treated as internal navigation in search results.
    ///
    /// Set via GO2WEB_SEARCH_DOMAIN environment variable.
    #[serde(default = "default_search_domain")]
    pub search_domain: String,

    /// Number of search results shown to the user.
    ///
    /// Set via GO2WEB_MAX_RESULTS environment variable.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("go2web"))
        .unwrap_or_else(|| PathBuf::from("./.go2web-cache"))
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

fn default_user_agent() -> String {
    "go2web/1.0".into()
}

fn default_accept() -> String {
    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".into()
}

fn default_max_redirects() -> usize {
    5
}

fn default_search_url() -> String {
    "https://html.duckduckgo.com/html/?q={query}".into()
}

fn default_search_domain() -> String {
    "duckduckgo.com".into()
}

fn default_max_results() -> usize {
    10
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_enabled: true,
            user_agent: default_user_agent(),
            accept: default_accept(),
            max_redirects: default_max_redirects(),
            timeout_ms: None,
            search_url: default_search_url(),
            search_domain: default_search_domain(),
            max_results: default_max_results(),
        }
    }
}

impl AppConfig {
    /// Cache freshness window as a Duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Socket timeout as a Duration, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `GO2WEB_`
    /// 2. TOML file from `GO2WEB_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("GO2WEB_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("GO2WEB_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into()),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.cache_dir.ends_with("go2web") || config.cache_dir.ends_with(".go2web-cache"));
        assert_eq!(config.cache_ttl_secs, 3600);
        assert!(config.cache_enabled);
        assert_eq!(config.user_agent, "go2web/1.0");
        assert!(config.accept.starts_with("text/html"));
        assert_eq!(config.max_redirects, 5);
        assert!(config.timeout_ms.is_none());
        assert!(config.search_url.contains(QUERY_PLACEHOLDER));
        assert_eq!(config.search_domain, "duckduckgo.com");
        assert_eq!(config.max_results, 10);
    }

    #[test]
    fn test_cache_ttl_duration() {
        let config = AppConfig::default();
        assert_eq!(config.cache_ttl(), Duration::from_secs(3600));
    }

    #[test]
    fn test_timeout_unset_by_default() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig { timeout_ms: Some(2_500), ..Default::default() };
        assert_eq!(config.timeout(), Some(Duration::from_millis(2_500)));
    }

    #[test]
    fn test_load_from_toml_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("go2web.toml", "cache_ttl_secs = 60\nuser_agent = \"tester/2\"")?;
            jail.set_env("GO2WEB_CONFIG_FILE", "go2web.toml");
            jail.set_env("GO2WEB_MAX_RESULTS", "3");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.cache_ttl_secs, 60);
            assert_eq!(config.user_agent, "tester/2");
            assert_eq!(config.max_results, 3);
            assert_eq!(config.max_redirects, 5);
            Ok(())
        });
    }

    #[test]
    fn test_load_env_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("go2web.toml", "max_redirects = 2")?;
            jail.set_env("GO2WEB_CONFIG_FILE", "go2web.toml");
            jail.set_env("GO2WEB_MAX_REDIRECTS", "7");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.max_redirects, 7);
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("GO2WEB_MAX_REDIRECTS", "50");
            assert!(matches!(AppConfig::load(), Err(ConfigError::Invalid { .. })));
            Ok(())
        });
    }
}
