//! Shared request pipeline.
//!
//! Every provider call runs the same sequence:
//!
//! 1. Draw a token from the endpoint's rate limiter
//! 2. Return a cached response for cacheable reads
//! 3. Authorize, send and map the response, retrying transient failures
//! 4. Cache successful cacheable responses
//!
//! A rate reported in `x-amzn-RateLimit-Limit` replaces the configured rate
//! of the endpoint's bucket from the next request on. The shared default
//! bucket keeps its configured rate.
//!
//! Local validation happens in the provider methods before a request reaches
//! the pipeline, so invalid input never spends a token.

use crate::auth::AuthProvider;
use crate::config::ProviderSettings;
use crate::logging::{log_cache, log_failure, log_request, log_response};
use crate::transport::{HttpRequest, HttpTransport, Method};
use amazon_cache::{CacheConfig, CacheKey, CacheStats, ResponseCache, TtlClass};
use amazon_error::{AmazonError, AmazonResult, ApiErrorFactory, ConnectionFailure, Provider};
use amazon_rate_limit::{
    DEFAULT_LIMITER_KEY, EndpointRateLimiters, HeaderRateLimitDetector, RateLimitStatus,
    ResolvedLimiter, RetryExecutor,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

/// A provider call before it is resolved against a base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
    cache_class: Option<TtlClass>,
}

impl ApiRequest {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            cache_class: None,
        }
    }

    /// GET `path`.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    /// POST `path`.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    /// Add a query parameter.
    pub fn with_query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    /// Add an optional query parameter.
    pub fn with_optional_query(self, name: impl Into<String>, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.with_query(name, value),
            None => self,
        }
    }

    /// Add a comma-separated list parameter; empty lists are skipped.
    pub fn with_query_list<S: AsRef<str>>(self, name: impl Into<String>, values: &[S]) -> Self {
        if values.is_empty() {
            return self;
        }
        let joined = values
            .iter()
            .map(|v| v.as_ref())
            .collect::<Vec<_>>()
            .join(",");
        self.with_query(name, joined)
    }

    /// Set a JSON body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Cache successful responses under `class`.
    pub fn cached(mut self, class: TtlClass) -> Self {
        self.cache_class = Some(class);
        self
    }

    /// Method.
    pub fn method(&self) -> Method {
        self.method
    }

    /// Path relative to the base URL.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query parameters in insertion order.
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// JSON body.
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// TTL class when cacheable.
    pub fn cache_class(&self) -> Option<TtlClass> {
        self.cache_class
    }

    /// Cache key for this request.
    pub fn cache_key(&self, provider: Provider) -> String {
        let key = CacheKey::new(provider, self.method.as_ref(), &self.path)
            .query(self.query.iter().cloned());
        match &self.body {
            Some(body) => key.body(body).build(),
            None => key.build(),
        }
    }

    /// Absolute URL against `base_url`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `base_url` is not a valid URL.
    pub fn url(&self, base_url: &str) -> AmazonResult<String> {
        let mut url = url::Url::parse(base_url)
            .and_then(|base| base.join(&self.path))
            .map_err(|e| {
                AmazonError::config(format!("Invalid base URL '{}': {}", base_url, e))
            })?;
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }
        Ok(url.to_string())
    }
}

/// Rate limiting, caching, auth and retry for one provider.
#[derive(Debug)]
pub struct RequestPipeline {
    provider: Provider,
    base_url: String,
    transport: Arc<dyn HttpTransport>,
    auth: Arc<dyn AuthProvider>,
    limiters: EndpointRateLimiters,
    cache: ResponseCache<Value>,
    retry: RetryExecutor,
    factory: ApiErrorFactory,
    detector: HeaderRateLimitDetector,
    timeout: Duration,
}

impl RequestPipeline {
    /// Pipeline for `provider` at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if any rate limit or the retry policy
    /// is invalid.
    pub fn new(
        provider: Provider,
        base_url: impl Into<String>,
        settings: &ProviderSettings,
        cache: CacheConfig,
        transport: Arc<dyn HttpTransport>,
        auth: Arc<dyn AuthProvider>,
    ) -> AmazonResult<Self> {
        settings.validate()?;
        let limiters =
            EndpointRateLimiters::from_config(settings.rate_limit().clone(), settings.endpoints())?;
        debug!(
            provider = %provider,
            endpoints = settings.endpoints().len(),
            "Request pipeline configured"
        );
        Ok(Self {
            provider,
            base_url: base_url.into(),
            transport,
            auth,
            limiters,
            cache: ResponseCache::new(cache),
            retry: RetryExecutor::from_config(settings.retry().clone()),
            factory: ApiErrorFactory::new(provider),
            detector: HeaderRateLimitDetector::new(),
            timeout: *settings.request_timeout(),
        })
    }

    /// Provider served.
    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// Base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Endpoint rate limiters.
    pub fn limiters(&self) -> &EndpointRateLimiters {
        &self.limiters
    }

    /// Upstream rate-limit headers seen so far.
    pub fn detector(&self) -> &HeaderRateLimitDetector {
        &self.detector
    }

    /// Run `request` through the pipeline.
    ///
    /// # Errors
    ///
    /// Returns the mapped upstream error after retries are exhausted, or the
    /// first non-retryable error.
    #[instrument(
        skip(self, request),
        fields(provider = %self.provider, method = %request.method, path = %request.path)
    )]
    pub async fn execute(&self, request: ApiRequest) -> AmazonResult<Value> {
        let limiter = self.limiters.resolve(&request.path);
        let waited = limiter.bucket.wait_for_token().await;
        if !waited.is_zero() {
            debug!(
                limiter = limiter.key,
                waited_ms = waited.as_millis() as u64,
                "Waited for rate limit token"
            );
        }

        let cache_key = request
            .cache_class
            .map(|class| (request.cache_key(self.provider), class));
        if let Some((key, _)) = &cache_key {
            let hit = self.cache.get(key);
            log_cache(self.provider, &request.path, hit.is_some());
            if let Some(value) = hit {
                return Ok(value);
            }
        }

        let url = request.url(&self.base_url)?;
        let body = request
            .body
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| AmazonError::config(format!("Unserializable request body: {}", e)))?;
        let context = format!("{} {}", request.method, request.path);

        let result = self
            .retry
            .execute(&context, || {
                self.attempt(&request, limiter, &url, body.clone())
            })
            .await;

        match result {
            Ok(data) => {
                if let Some((key, class)) = cache_key {
                    let ttl = self.cache.config().ttl_for(class);
                    self.cache.set(&key, data.clone(), Some(ttl));
                }
                Ok(data)
            }
            Err(err) => {
                log_failure(self.provider, request.method.as_ref(), &request.path, &err);
                Err(err)
            }
        }
    }

    /// Run `request` and decode the response body into `T`.
    ///
    /// # Errors
    ///
    /// As [`execute`](Self::execute), plus a non-retryable API error when the
    /// body does not have the expected shape.
    pub async fn execute_as<T: DeserializeOwned>(&self, request: ApiRequest) -> AmazonResult<T> {
        let data = self.execute(request).await?;
        serde_json::from_value(data).map_err(|e| {
            AmazonError::api(
                self.provider,
                200,
                None,
                format!("Unexpected response shape: {}", e),
            )
            .with_cause(e)
        })
    }

    async fn attempt(
        &self,
        request: &ApiRequest,
        limiter: ResolvedLimiter<'_>,
        url: &str,
        body: Option<String>,
    ) -> AmazonResult<Value> {
        let mut http = HttpRequest::new(request.method, url).with_header("accept", "application/json");
        if let Some(body) = body {
            http = http
                .with_header("content-type", "application/json")
                .with_body(body);
        }
        // Per attempt so retried requests carry fresh tokens and signatures
        self.auth.authorize(&mut http).await?;

        let method = request.method.as_ref();
        log_request(self.provider, method, &request.path);
        let started = Instant::now();
        let response = tokio::time::timeout(self.timeout, self.transport.send(http, self.timeout))
            .await
            .map_err(|_| AmazonError::connection(ConnectionFailure::Timeout, url, method))??;
        log_response(
            self.provider,
            method,
            &request.path,
            response.status,
            started.elapsed(),
        );

        if let Some(rps) = self.detector.observe(limiter.key, &response.headers).await {
            self.apply_detected_rate(limiter, rps);
        }

        if !response.is_success() {
            let error_response = response.to_error_response();
            let request_id = error_response.request_id();
            return Err(self
                .factory
                .from_response(&error_response, request_id.as_deref()));
        }
        Ok(response.data)
    }

    fn apply_detected_rate(&self, limiter: ResolvedLimiter<'_>, rps: f64) {
        if limiter.key == DEFAULT_LIMITER_KEY || limiter.bucket.rate() == rps {
            return;
        }
        match limiter.bucket.set_rate(rps) {
            Ok(()) => debug!(limiter = limiter.key, rps, "Applied upstream rate limit"),
            Err(e) => warn!(limiter = limiter.key, rps, error = %e, "Ignoring upstream rate limit"),
        }
    }

    /// Snapshot of every endpoint bucket.
    pub fn rate_limit_status(&self) -> BTreeMap<String, RateLimitStatus> {
        self.limiters.statuses()
    }

    /// Cache counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drop cached responses, all of them or those matching `pattern`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the pattern cannot be compiled.
    pub fn clear_cache(&self, pattern: Option<&str>) -> AmazonResult<usize> {
        match pattern {
            Some(pattern) => self.cache.clear_pattern(pattern),
            None => {
                let cleared = self.cache.len();
                self.cache.clear();
                Ok(cleared)
            }
        }
    }
}
