//! Process-wide handle to the configured providers.

use amazon_error::{AmazonResult, Provider};
use amazon_providers::{AmazonProvider, AssociatesProvider, HealthStatus, SpApiProvider};
use amazon_rate_limit::RateLimitStatus;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Providers constructed once at start-up and passed to call sites.
///
/// Cloning is cheap; clones share the same providers, and with them the same
/// rate limit buckets and caches.
///
/// # Example
///
/// ```no_run
/// use amazon_core::{AmazonContext, AssociatesConfig, AssociatesProvider};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let associates = AssociatesProvider::new(
///     AssociatesConfig::builder()
///         .access_key("AKIAEXAMPLE")
///         .secret_key("secret")
///         .partner_tag("mystore-20")
///         .build()?,
/// )?;
/// let context = AmazonContext::new().with_associates(associates);
///
/// for (provider, status) in context.health_check_all().await {
///     println!("{}: {:?}", provider, status);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct AmazonContext {
    sp_api: Option<Arc<SpApiProvider>>,
    associates: Option<Arc<AssociatesProvider>>,
}

impl AmazonContext {
    /// Context without providers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the SP-API provider.
    pub fn with_sp_api(mut self, provider: SpApiProvider) -> Self {
        self.sp_api = Some(Arc::new(provider));
        self
    }

    /// Register the Associates provider.
    pub fn with_associates(mut self, provider: AssociatesProvider) -> Self {
        self.associates = Some(Arc::new(provider));
        self
    }

    /// SP-API provider, if configured.
    pub fn sp_api(&self) -> Option<&SpApiProvider> {
        self.sp_api.as_deref()
    }

    /// Associates provider, if configured.
    pub fn associates(&self) -> Option<&AssociatesProvider> {
        self.associates.as_deref()
    }

    /// Every configured provider.
    pub fn providers(&self) -> Vec<&dyn AmazonProvider> {
        let mut providers: Vec<&dyn AmazonProvider> = Vec::new();
        if let Some(sp_api) = self.sp_api() {
            providers.push(sp_api);
        }
        if let Some(associates) = self.associates() {
            providers.push(associates);
        }
        providers
    }

    /// Provider serving `provider`, if configured.
    pub fn provider(&self, provider: Provider) -> Option<&dyn AmazonProvider> {
        self.providers()
            .into_iter()
            .find(|p| p.provider() == provider)
    }

    /// Initialize every provider, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first provider's initialization error.
    #[instrument(skip(self))]
    pub async fn initialize_all(&self) -> AmazonResult<()> {
        for provider in self.providers() {
            provider.initialize().await?;
        }
        info!(count = self.providers().len(), "Providers initialized");
        Ok(())
    }

    /// Health of every provider, probed concurrently.
    #[instrument(skip(self))]
    pub async fn health_check_all(&self) -> BTreeMap<Provider, HealthStatus> {
        let (sp_api, associates) = tokio::join!(
            probe(self.sp_api()),
            probe(self.associates()),
        );
        let report: BTreeMap<Provider, HealthStatus> =
            sp_api.into_iter().chain(associates).collect();
        for (provider, status) in &report {
            if !status.is_healthy() {
                warn!(%provider, ?status, "Provider not healthy");
            }
        }
        report
    }

    /// Rate limit buckets of every provider, keyed by provider then endpoint.
    pub fn rate_limit_status(&self) -> BTreeMap<Provider, BTreeMap<String, RateLimitStatus>> {
        self.providers()
            .into_iter()
            .map(|provider| (provider.provider(), provider.rate_limit_status()))
            .collect()
    }

    /// Drop cached responses of every provider, all of them or those
    /// matching `pattern`. Returns the number of entries removed.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the pattern cannot be compiled.
    #[instrument(skip(self))]
    pub fn clear_all_caches(&self, pattern: Option<&str>) -> AmazonResult<usize> {
        let mut cleared = 0;
        for provider in self.providers() {
            cleared += provider.clear_cache(pattern)?;
        }
        info!(cleared, "Caches cleared");
        Ok(cleared)
    }
}

async fn probe<P: AmazonProvider>(provider: Option<&P>) -> Option<(Provider, HealthStatus)> {
    match provider {
        Some(provider) => Some((provider.provider(), provider.health_check().await)),
        None => None,
    }
}
