//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `BAZAAR_API_BASE_URL` - Backend REST API base URL (default: `http://localhost:8080/`)
//! - `BAZAAR_PUBLIC_URL` - Public storefront origin for shareable links (default: `http://localhost:3000/`)
//! - `BAZAAR_STATE_DIR` - Directory for persisted session and admin state (default: `.bazaar`)
//! - `BAZAAR_STALE_SECS` - Age after which a cached query is refetched (default: 30)
//! - `BAZAAR_CACHE_TTL_SECS` - Hard expiry of cached queries (default: 300)
//! - `BAZAAR_CACHE_CAPACITY` - Maximum number of cached queries (default: 1000)
//! - `BAZAAR_STALE_POLICY` - `refetch` or `background` (default: `refetch`)
//! - `BAZAAR_REQUEST_TIMEOUT_SECS` - Per-request timeout; unset leaves the transport default

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/";
const DEFAULT_PUBLIC_URL: &str = "http://localhost:3000/";
const DEFAULT_STATE_DIR: &str = ".bazaar";
const DEFAULT_STALE_SECS: u64 = 30;
const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_CACHE_CAPACITY: u64 = 1000;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// What a read does when its cached entry has gone stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StalePolicy {
    /// Treat the stale entry as a miss and wait for a fresh fetch.
    #[default]
    Refetch,
    /// Serve the stale entry immediately and refresh it in the background.
    RevalidateInBackground,
}

impl FromStr for StalePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "refetch" => Ok(Self::Refetch),
            "background" | "revalidate" => Ok(Self::RevalidateInBackground),
            other => Err(format!("expected `refetch` or `background`, got `{other}`")),
        }
    }
}

/// Query cache tuning.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Age after which an entry is stale.
    pub stale_after: Duration,
    /// Age after which an entry is dropped entirely.
    pub time_to_live: Duration,
    /// Maximum number of cached entries.
    pub max_capacity: u64,
    /// Behaviour on stale reads.
    pub stale_policy: StalePolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_after: Duration::from_secs(DEFAULT_STALE_SECS),
            time_to_live: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            max_capacity: DEFAULT_CACHE_CAPACITY,
            stale_policy: StalePolicy::Refetch,
        }
    }
}

/// Marketplace client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend REST API base URL. Always ends with `/`.
    pub api_base_url: Url,
    /// Public storefront origin. Always ends with `/`.
    pub public_url: Url,
    /// Directory holding persisted client state.
    pub state_dir: PathBuf,
    /// Query cache tuning.
    pub cache: CacheConfig,
    /// Optional per-request timeout.
    pub request_timeout: Option<Duration>,
}

impl ClientConfig {
    /// Build a configuration for `api_base_url` with every other value at
    /// its default.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the URL does not parse.
    pub fn new(api_base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base_url: parse_base_url("BAZAAR_API_BASE_URL", api_base_url)?,
            public_url: parse_base_url("BAZAAR_PUBLIC_URL", DEFAULT_PUBLIC_URL)?,
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            cache: CacheConfig::default(),
            request_timeout: None,
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unparseable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let api_base_url = parse_base_url(
            "BAZAAR_API_BASE_URL",
            &get_or("BAZAAR_API_BASE_URL", DEFAULT_API_BASE_URL),
        )?;
        let public_url = parse_base_url(
            "BAZAAR_PUBLIC_URL",
            &get_or("BAZAAR_PUBLIC_URL", DEFAULT_PUBLIC_URL),
        )?;
        let state_dir = PathBuf::from(get_or("BAZAAR_STATE_DIR", DEFAULT_STATE_DIR));

        let cache = CacheConfig {
            stale_after: Duration::from_secs(parse_or(
                "BAZAAR_STALE_SECS",
                lookup("BAZAAR_STALE_SECS"),
                DEFAULT_STALE_SECS,
            )?),
            time_to_live: Duration::from_secs(parse_or(
                "BAZAAR_CACHE_TTL_SECS",
                lookup("BAZAAR_CACHE_TTL_SECS"),
                DEFAULT_CACHE_TTL_SECS,
            )?),
            max_capacity: parse_or(
                "BAZAAR_CACHE_CAPACITY",
                lookup("BAZAAR_CACHE_CAPACITY"),
                DEFAULT_CACHE_CAPACITY,
            )?,
            stale_policy: parse_or(
                "BAZAAR_STALE_POLICY",
                lookup("BAZAAR_STALE_POLICY"),
                StalePolicy::default(),
            )?,
        };

        let request_timeout = lookup("BAZAAR_REQUEST_TIMEOUT_SECS")
            .map(|raw| {
                raw.trim().parse::<u64>().map(Duration::from_secs).map_err(|e| {
                    ConfigError::InvalidEnvVar(
                        "BAZAAR_REQUEST_TIMEOUT_SECS".to_string(),
                        e.to_string(),
                    )
                })
            })
            .transpose()?;

        Ok(Self {
            api_base_url,
            public_url,
            state_dir,
            cache,
            request_timeout,
        })
    }

    /// Shareable public URL of the store with `slug`.
    #[must_use]
    pub fn store_url(&self, slug: &str) -> String {
        format!(
            "{}store/{}",
            self.public_url,
            urlencoding::encode(slug.trim())
        )
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse a base URL, forcing a trailing slash so relative joins keep any
/// path prefix (`http://host/api` + `stores` must give `/api/stores`).
fn parse_base_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut raw = raw.trim().to_string();
    if !raw.ends_with('/') {
        raw.push('/');
    }
    let url = Url::parse(&raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be an absolute http(s) URL".to_string(),
        ));
    }
    Ok(url)
}

/// Parse an optional value, falling back to `default` when unset.
fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.map_or(Ok(default), |value| {
        value
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}
