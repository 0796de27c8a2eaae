//! Per-endpoint limiter registry.

use crate::{RateLimitConfig, RateLimitStatus, TokenBucket};
use amazon_error::AmazonResult;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Key reported for the fallback bucket.
pub const DEFAULT_LIMITER_KEY: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param,
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    path.split('/').filter(|s| !s.is_empty())
}

#[derive(Debug)]
struct EndpointLimiter {
    pattern: String,
    segments: Vec<Segment>,
    bucket: Arc<TokenBucket>,
}

impl EndpointLimiter {
    /// Match score `(segments, literals)`; `None` if the pattern is not a prefix of `path`.
    ///
    /// Literals compare case-insensitively; config loaders may fold key case.
    fn score(&self, path: &[&str]) -> Option<(usize, usize)> {
        if self.segments.len() > path.len() {
            return None;
        }
        let mut literals = 0;
        for (segment, actual) in self.segments.iter().zip(path) {
            match segment {
                Segment::Param => {}
                Segment::Literal(expected) if expected.eq_ignore_ascii_case(actual) => literals += 1,
                Segment::Literal(_) => return None,
            }
        }
        Some((self.segments.len(), literals))
    }
}

/// Limiter chosen for a request path.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedLimiter<'a> {
    /// Registered pattern, or [`DEFAULT_LIMITER_KEY`]
    pub key: &'a str,
    /// Bucket to draw from
    pub bucket: &'a Arc<TokenBucket>,
}

/// Independent token buckets keyed by endpoint pattern.
///
/// Patterns are path prefixes where `{name}` matches any single segment:
/// `/orders/v0/orders/{orderId}/orderItems`. The most specific matching
/// pattern wins (most segments, then most literal segments); unmatched
/// paths share the default bucket.
///
/// Buckets never share tokens: draining one endpoint leaves every other
/// endpoint untouched.
#[derive(Debug)]
pub struct EndpointRateLimiters {
    default: Arc<TokenBucket>,
    endpoints: Vec<EndpointLimiter>,
}

impl EndpointRateLimiters {
    /// Registry holding only the default bucket.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `default` is invalid.
    pub fn new(default: RateLimitConfig) -> AmazonResult<Self> {
        Ok(Self {
            default: Arc::new(TokenBucket::new(default)?),
            endpoints: Vec::new(),
        })
    }

    /// Registry with a default bucket plus one bucket per configured pattern.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if any config is invalid.
    #[instrument(skip_all, fields(endpoints = endpoints.len()))]
    pub fn from_config(
        default: RateLimitConfig,
        endpoints: &HashMap<String, RateLimitConfig>,
    ) -> AmazonResult<Self> {
        let mut registry = Self::new(default)?;
        for (pattern, config) in endpoints {
            registry.register(pattern.clone(), config.clone())?;
        }
        Ok(registry)
    }

    /// Register (or replace) the bucket for `pattern`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` is invalid.
    pub fn register(
        &mut self,
        pattern: impl Into<String>,
        config: RateLimitConfig,
    ) -> AmazonResult<()> {
        let pattern = pattern.into();
        let parsed = segments(&pattern)
            .map(|s| {
                if s.starts_with('{') && s.ends_with('}') {
                    Segment::Param
                } else {
                    Segment::Literal(s.to_string())
                }
            })
            .collect();
        let bucket = Arc::new(TokenBucket::new(config)?);
        debug!(pattern = %pattern, "Registered endpoint rate limiter");
        self.endpoints.retain(|e| e.pattern != pattern);
        self.endpoints.push(EndpointLimiter {
            pattern,
            segments: parsed,
            bucket,
        });
        Ok(())
    }

    /// Limiter for `path`, falling back to the default bucket.
    pub fn resolve(&self, path: &str) -> ResolvedLimiter<'_> {
        let path: Vec<&str> = segments(path).collect();
        self.endpoints
            .iter()
            .filter_map(|e| e.score(&path).map(|score| (score, e)))
            .max_by_key(|(score, _)| *score)
            .map(|(_, e)| ResolvedLimiter {
                key: &e.pattern,
                bucket: &e.bucket,
            })
            .unwrap_or(ResolvedLimiter {
                key: DEFAULT_LIMITER_KEY,
                bucket: &self.default,
            })
    }

    /// Bucket for `path`.
    pub fn limiter_for(&self, path: &str) -> &Arc<TokenBucket> {
        self.resolve(path).bucket
    }

    /// The fallback bucket.
    pub fn default_limiter(&self) -> &Arc<TokenBucket> {
        &self.default
    }

    /// Registered patterns, in registration order.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.endpoints.iter().map(|e| e.pattern.as_str())
    }

    /// Snapshot of every bucket, keyed by pattern.
    pub fn statuses(&self) -> BTreeMap<String, RateLimitStatus> {
        std::iter::once((DEFAULT_LIMITER_KEY.to_string(), self.default.status()))
            .chain(
                self.endpoints
                    .iter()
                    .map(|e| (e.pattern.clone(), e.bucket.status())),
            )
            .collect()
    }

    /// Refill every bucket.
    pub fn reset_all(&self) {
        self.default.reset();
        for endpoint in &self.endpoints {
            endpoint.bucket.reset();
        }
    }
}
