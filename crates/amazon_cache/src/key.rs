//! Deterministic cache keys.

use amazon_error::Provider;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Builds `"{provider}:{path}:{digest}"` keys.
///
/// The digest covers the method, path, query parameters (sorted) and body
/// (object keys sorted at every depth), so logically identical requests map
/// to the same key regardless of parameter or field order.
///
/// # Example
///
/// ```
/// use amazon_cache::CacheKey;
/// use amazon_error::Provider;
/// use serde_json::json;
///
/// let a = CacheKey::new(Provider::Associates, "POST", "/paapi5/getitems")
///     .body(&json!({"ItemIds": ["B00ZV9RDKK"], "PartnerTag": "store-20"}))
///     .build();
/// let b = CacheKey::new(Provider::Associates, "POST", "/paapi5/getitems")
///     .body(&json!({"PartnerTag": "store-20", "ItemIds": ["B00ZV9RDKK"]}))
///     .build();
/// assert_eq!(a, b);
/// assert!(a.starts_with("associates:/paapi5/getitems:"));
/// ```
#[derive(Debug, Clone)]
pub struct CacheKey {
    provider: Provider,
    method: String,
    path: String,
    query: Vec<(String, String)>,
    body: Option<String>,
}

impl CacheKey {
    /// Key for `method path` on `provider`.
    pub fn new(provider: Provider, method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            provider,
            method: method.into().to_ascii_uppercase(),
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Include query parameters; order does not matter.
    pub fn query<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Include a JSON body.
    pub fn body(mut self, body: &Value) -> Self {
        self.body = Some(canonical(body).to_string());
        self
    }

    /// Final key string.
    pub fn build(mut self) -> String {
        self.query.sort();
        let mut hasher = Sha256::new();
        hasher.update(self.method.as_bytes());
        hasher.update(b"\n");
        hasher.update(self.path.as_bytes());
        hasher.update(b"\n");
        for (key, value) in &self.query {
            hasher.update(key.as_bytes());
            hasher.update(b"=");
            hasher.update(value.as_bytes());
            hasher.update(b"&");
        }
        hasher.update(b"\n");
        if let Some(body) = &self.body {
            hasher.update(body.as_bytes());
        }
        format!(
            "{}:{}:{}",
            self.provider,
            self.path,
            hex::encode(hasher.finalize())
        )
    }
}

/// Copy of `value` with object keys sorted at every depth.
fn canonical(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), canonical(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        other => other.clone(),
    }
}
