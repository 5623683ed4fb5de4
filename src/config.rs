//! Connection settings for the product backend
//!
//! Groups the backend host, the credentials used on the service-level call
//! paths, and the deal validation cache bounds.

use std::time::Duration;

use reqwest::header::HeaderName;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Header carrying the shared secret unless overridden
pub const DEFAULT_SHARED_SECRET_HEADER: &str = "x-secret-key";

/// How long a deal validation lookup is reused
pub const DEFAULT_DEAL_CACHE_TTL: Duration = Duration::from_secs(3);

/// How many distinct deal validation lookups are kept
pub const DEFAULT_DEAL_CACHE_CAPACITY: usize = 128;

/// Errors raised while assembling a `BackendConfig`
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The backend URL could not be parsed
    #[error("Invalid backend URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The backend URL cannot have paths joined onto it (e.g. `mailto:`)
    #[error("Backend URL '{0}' cannot be used as a base")]
    CannotBeABase(String),

    /// The shared secret header name is not a valid HTTP header name
    #[error("Invalid header name: '{0}'")]
    InvalidHeaderName(String),

    /// The requested query needs a credential that was not supplied
    #[error("Missing {0}; it is required for this query")]
    MissingCredential(&'static str),
}

/// Settings for `BackendClient`
#[derive(Debug)]
pub struct BackendConfig {
    /// Base the request paths are resolved against
    pub base_url: Url,
    /// Header name for the shared secret
    pub shared_secret_header: HeaderName,
    /// Shared secret sent on the elevated deal validation path
    pub shared_secret: SecretString,
    /// API key sent on service-to-service calls
    pub service_api_key: SecretString,
    /// Lifetime of a memoized deal validation result
    pub deal_cache_ttl: Duration,
    /// Maximum number of memoized deal validation results
    pub deal_cache_capacity: usize,
}

impl BackendConfig {
    /// Creates a config with default header name and cache bounds
    pub fn new(
        base_url: Url,
        shared_secret: impl Into<String>,
        service_api_key: impl Into<String>,
    ) -> Self {
        Self {
            base_url,
            shared_secret_header: HeaderName::from_static(DEFAULT_SHARED_SECRET_HEADER),
            shared_secret: SecretString::from(shared_secret.into()),
            service_api_key: SecretString::from(service_api_key.into()),
            deal_cache_ttl: DEFAULT_DEAL_CACHE_TTL,
            deal_cache_capacity: DEFAULT_DEAL_CACHE_CAPACITY,
        }
    }

    /// Parses the base URL and creates a config from it
    ///
    /// # Returns
    /// * `Ok(BackendConfig)` with default header name and cache bounds
    /// * `Err(ConfigError)` if the URL is malformed or cannot act as a base
    pub fn from_parts(
        base_url: &str,
        shared_secret: impl Into<String>,
        service_api_key: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let url = parse_base_url(base_url)?;
        Ok(Self::new(url, shared_secret, service_api_key))
    }

    /// Overrides the shared secret header name
    pub fn with_shared_secret_header(mut self, header: HeaderName) -> Self {
        self.shared_secret_header = header;
        self
    }

    /// Overrides how long deal validation results are reused
    pub fn with_deal_cache_ttl(mut self, ttl: Duration) -> Self {
        self.deal_cache_ttl = ttl;
        self
    }

    /// Overrides how many deal validation results are kept
    pub fn with_deal_cache_capacity(mut self, capacity: usize) -> Self {
        self.deal_cache_capacity = capacity;
        self
    }
}

/// Parses a backend URL, rejecting ones that cannot carry a path
pub fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|source| ConfigError::InvalidBaseUrl {
        url: raw.to_string(),
        source,
    })?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::CannotBeABase(raw.to_string()));
    }
    Ok(url)
}

/// Parses a header name for the shared secret
pub fn parse_header_name(raw: &str) -> Result<HeaderName, ConfigError> {
    HeaderName::from_bytes(raw.as_bytes()).map_err(|_| ConfigError::InvalidHeaderName(raw.to_string()))
}
