//! Provider configuration.
//!
//! Tunables (rate limits per endpoint, retry policy, cache TTLs, timeouts)
//! load from TOML with a precedence system:
//!
//! 1. Bundled defaults (`amazon.toml` shipped with the crate)
//! 2. `~/.config/amazon-core/amazon.toml`
//! 3. `./amazon.toml`
//!
//! Credentials never come from these files; callers pass them to the
//! provider config builders.

use crate::auth::{LWA_TOKEN_URL, LwaCredentials};
use crate::region::{AssociatesMarketplace, SpApiRegion};
use amazon_cache::CacheConfig;
use amazon_error::{AmazonError, AmazonResult, Provider};
use amazon_rate_limit::{RateLimitConfig, RetryConfig};
use config::{Config, File, FileFormat};
use derive_builder::Builder;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, instrument};

/// ASIN looked up by the Associates health check unless configured otherwise.
pub const DEFAULT_HEALTH_CHECK_ASIN: &str = "B00ZV9RDKK";

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Request-control settings for one provider.
///
/// ```toml
/// [providers.sp-api]
/// request_timeout_ms = 30000
///
/// [providers.sp-api.rate_limit]
/// requests_per_second = 1.0
/// burst_limit = 5
///
/// [providers.sp-api.endpoints."/orders/v0/orders"]
/// requests_per_second = 0.0167
/// burst_limit = 20
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct ProviderSettings {
    /// Bucket for endpoints without an entry in `endpoints`
    rate_limit: RateLimitConfig,

    /// Buckets keyed by endpoint pattern (`{param}` matches one segment)
    #[serde(default)]
    endpoints: HashMap<String, RateLimitConfig>,

    /// Retry policy
    retry: RetryConfig,

    /// Per-attempt timeout
    #[serde(
        rename = "request_timeout_ms",
        with = "amazon_rate_limit::millis",
        default = "default_request_timeout"
    )]
    request_timeout: Duration,
}

impl ProviderSettings {
    /// Settings with no endpoint overrides.
    pub fn new(rate_limit: RateLimitConfig, retry: RetryConfig) -> Self {
        Self {
            rate_limit,
            endpoints: HashMap::new(),
            retry,
            request_timeout: default_request_timeout(),
        }
    }

    /// Built-in settings for `provider`, used when no file configures it.
    pub fn preset(provider: Provider) -> Self {
        match provider {
            Provider::SpApi => Self::new(RateLimitConfig::sp_api(), RetryConfig::sp_api()),
            Provider::Advertising => {
                Self::new(RateLimitConfig::advertising(), RetryConfig::advertising())
            }
            Provider::Associates => {
                Self::new(RateLimitConfig::associates(), RetryConfig::associates())
            }
        }
    }

    /// Add or replace an endpoint bucket.
    pub fn with_endpoint(mut self, pattern: impl Into<String>, config: RateLimitConfig) -> Self {
        self.endpoints.insert(pattern.into(), config);
        self
    }

    /// Replace the retry policy.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Replace the per-attempt timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Check every rate limit and the retry policy.
    ///
    /// # Errors
    ///
    /// Returns the first configuration error found.
    pub fn validate(&self) -> AmazonResult<()> {
        self.rate_limit.validate()?;
        for (pattern, config) in &self.endpoints {
            config.validate().map_err(|e| {
                AmazonError::config(format!("endpoint '{}': {}", pattern, e.message()))
            })?;
        }
        self.retry.validate()
    }
}

/// Top-level file configuration.
///
/// # Example
///
/// ```no_run
/// use amazon_providers::AmazonConfig;
/// use amazon_error::Provider;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = AmazonConfig::load()?;
/// let sp_api = config.provider(Provider::SpApi);
/// println!("{} endpoint limits", sp_api.endpoints().len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AmazonConfig {
    /// Settings keyed by provider name (`sp-api`, `associates`, `advertising`)
    #[serde(default)]
    pub providers: HashMap<String, ProviderSettings>,

    /// Response cache settings shared by every provider
    #[serde(default)]
    pub cache: CacheConfig,
}

fn config_error(context: &str, e: config::ConfigError) -> AmazonError {
    AmazonError::config(format!("{}: {}", context, e))
}

impl AmazonConfig {
    /// Load one file.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> AmazonResult<Self> {
        debug!("Loading configuration from file");
        Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                config_error(
                    &format!("Failed to read configuration from {}", path.as_ref().display()),
                    e,
                )
            })?
            .try_deserialize()
            .map_err(|e| config_error("Failed to parse configuration", e))
    }

    /// Load bundled defaults, then the home directory file, then `./amazon.toml`.
    ///
    /// User files are optional and merge over the defaults key by key.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if any present file is malformed.
    #[instrument]
    pub fn load() -> AmazonResult<Self> {
        debug!("Loading configuration with precedence: current dir > home dir > bundled defaults");

        const DEFAULT_CONFIG: &str = include_str!("../../../amazon.toml");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/amazon-core/amazon.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("amazon").required(false));

        builder
            .build()
            .map_err(|e| config_error("Failed to build configuration", e))?
            .try_deserialize()
            .map_err(|e| config_error("Failed to parse configuration", e))
    }

    /// Settings for `provider`, falling back to the built-in preset.
    pub fn provider(&self, provider: Provider) -> ProviderSettings {
        self.providers
            .get(provider.as_ref())
            .cloned()
            .unwrap_or_else(|| ProviderSettings::preset(provider))
    }
}

/// SP-API provider configuration.
///
/// # Example
///
/// ```
/// use amazon_providers::{LwaCredentials, SpApiConfig, SpApiRegion};
///
/// let config = SpApiConfig::builder()
///     .credentials(LwaCredentials::new("client", "secret", "refresh"))
///     .region(SpApiRegion::Europe)
///     .build()
///     .unwrap();
/// assert_eq!(config.base_url(), "https://sellingpartnerapi-eu.amazon.com");
/// ```
#[derive(Debug, Clone, Builder, Getters)]
#[builder(setter(into))]
pub struct SpApiConfig {
    /// LWA credentials
    credentials: LwaCredentials,

    /// Selling region
    #[builder(default)]
    region: SpApiRegion,

    /// Use the sandbox endpoints
    #[builder(default)]
    sandbox: bool,

    /// Rate limits, retry policy and timeout
    #[builder(default = "ProviderSettings::preset(Provider::SpApi)")]
    settings: ProviderSettings,

    /// Response cache
    #[builder(default)]
    cache: CacheConfig,

    /// LWA token endpoint
    #[builder(default = "LWA_TOKEN_URL.to_string()")]
    token_url: String,

    /// Base URL replacing the regional endpoint
    #[builder(default, setter(strip_option))]
    endpoint_override: Option<String>,
}

impl SpApiConfig {
    /// Start building a config.
    pub fn builder() -> SpApiConfigBuilder {
        SpApiConfigBuilder::default()
    }

    /// Base URL requests go to.
    pub fn base_url(&self) -> String {
        self.endpoint_override
            .clone()
            .unwrap_or_else(|| self.region.endpoint(self.sandbox).to_string())
    }

    /// Config for `region` using settings from `file`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the builder is incomplete.
    pub fn from_file_config(
        file: &AmazonConfig,
        credentials: LwaCredentials,
        region: SpApiRegion,
    ) -> AmazonResult<Self> {
        Self::builder()
            .credentials(credentials)
            .region(region)
            .settings(file.provider(Provider::SpApi))
            .cache(file.cache.clone())
            .build()
            .map_err(|e| AmazonError::config(e.to_string()))
    }
}

/// Associates (PA-API 5) provider configuration.
///
/// # Example
///
/// ```
/// use amazon_providers::{AssociatesConfig, AssociatesMarketplace};
///
/// let config = AssociatesConfig::builder()
///     .access_key("AKIAEXAMPLE")
///     .secret_key("secret")
///     .partner_tag("mystore-20")
///     .marketplace(AssociatesMarketplace::UnitedKingdom)
///     .build()
///     .unwrap();
/// assert_eq!(config.base_url(), "https://webservices.amazon.co.uk");
/// ```
#[derive(Clone, Builder, Getters)]
#[builder(setter(into))]
pub struct AssociatesConfig {
    /// AWS access key id
    access_key: String,

    /// AWS secret key
    secret_key: String,

    /// Associates tracking id, e.g. `mystore-20`
    partner_tag: String,

    /// Storefront
    #[builder(default)]
    marketplace: AssociatesMarketplace,

    /// Rate limits, retry policy and timeout
    #[builder(default = "ProviderSettings::preset(Provider::Associates)")]
    settings: ProviderSettings,

    /// Response cache
    #[builder(default)]
    cache: CacheConfig,

    /// ASIN fetched by the health check
    #[builder(default = "DEFAULT_HEALTH_CHECK_ASIN.to_string()")]
    health_check_asin: String,

    /// Base URL replacing the marketplace host
    #[builder(default, setter(strip_option))]
    endpoint_override: Option<String>,
}

impl fmt::Debug for AssociatesConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssociatesConfig")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("partner_tag", &self.partner_tag)
            .field("marketplace", &self.marketplace)
            .field("settings", &self.settings)
            .field("endpoint_override", &self.endpoint_override)
            .finish_non_exhaustive()
    }
}

impl AssociatesConfig {
    /// Start building a config.
    pub fn builder() -> AssociatesConfigBuilder {
        AssociatesConfigBuilder::default()
    }

    /// Base URL requests go to.
    pub fn base_url(&self) -> String {
        self.endpoint_override
            .clone()
            .unwrap_or_else(|| format!("https://{}", self.marketplace.host()))
    }

    /// Config for `marketplace` using settings from `file`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the builder is incomplete.
    pub fn from_file_config(
        file: &AmazonConfig,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        partner_tag: impl Into<String>,
        marketplace: AssociatesMarketplace,
    ) -> AmazonResult<Self> {
        Self::builder()
            .access_key(access_key)
            .secret_key(secret_key)
            .partner_tag(partner_tag)
            .marketplace(marketplace)
            .settings(file.provider(Provider::Associates))
            .cache(file.cache.clone())
            .build()
            .map_err(|e| AmazonError::config(e.to_string()))
    }
}
