//! The configuration client facade.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;

use crate::cache::{cache_key, CacheStore};
use crate::config::ClientConfig;
use crate::context::EvaluationContext;
use crate::domain_config::{ChatConfig, GamesConfig, SelConfig, SlpConfig};
use crate::flags::{
    BatchEvaluationRequest, BatchEvaluationResponse, EvaluationResponse, FlagDefinition, FlagKind,
    FlagValue, HealthResponse, ListFlagsResponse, UserFlagsResponse,
};
use crate::resolution::Resolution;
use crate::transport::ResilientTransport;
use crate::{Error, Result};

/// Optional filters for [`ConfigClient::list_flags`].
#[derive(Debug, Clone, Default)]
pub struct ListFlagsFilter {
    /// Only flags carrying every listed tag.
    pub tags: Vec<String>,
    /// Only flags with a matching enabled state.
    pub enabled: Option<bool>,
}

impl ListFlagsFilter {
    /// An empty filter matching every flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a tag.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Require an enabled state.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }
}

/// Client for resolving flags and domain configuration against the backend.
///
/// The client caches flag resolutions per (key, context) pair with a TTL and
/// retries transient failures with bounded exponential backoff. High-level
/// operations never fail: when the backend stays unreachable after the retry
/// budget, they return a [`Resolution::Fallback`] carrying a conservative
/// default.
///
/// Construct one instance at application composition time and share it
/// (`Arc<ConfigClient>`) with every consumer. The [`registry`](crate::registry)
/// module exists only for legacy call sites.
///
/// # Examples
/// ```no_run
/// # use edflags::{ClientConfig, ConfigClient, EvaluationContext};
/// # async fn demo() -> edflags::Result<()> {
/// let client = ConfigClient::new(ClientConfig::new("https://flags.example.com"))?;
/// let context = EvaluationContext::new().tenant_id("district-42");
/// let streaming = client
///     .evaluate_boolean("chat.streaming", &context)
///     .await
///     .into_value()
///     .unwrap_or(false);
/// # Ok(())
/// # }
/// ```
pub struct ConfigClient {
    http: reqwest::Client,
    base_url: String,
    transport: ResilientTransport,
    cache: CacheStore,
    /// Per-cache-key gates so concurrent misses share one network call.
    inflight: Mutex<HashMap<String, Weak<tokio::sync::Mutex<()>>>>,
}

impl ConfigClient {
    /// Create a new client using the specified configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        // Validate early so a bad URL fails at construction, not at first call.
        url::Url::parse(&config.base_url).map_err(Error::InvalidBaseUrl)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = &config.api_key {
            let mut value = HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|_| Error::InvalidApiKey)?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        // The client holds a connection pool internally, so it is shared
        // between requests.
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(ConfigClient {
            http,
            base_url: config.base_url,
            transport: ResilientTransport::new(config.retry_attempts, config.timeout),
            cache: CacheStore::new(config.cache_ttl, config.cache_max_entries),
            inflight: Mutex::new(HashMap::new()),
        })
    }

    /// Evaluate a single flag for `context`.
    ///
    /// Serves from the cache while a fresh entry exists; otherwise issues one
    /// logical request, shared with any concurrent caller of the same key and
    /// context, and caches the result. `Resolved(None)` means the backend
    /// itself resolved the flag to absent; `Fallback(None, _)` means
    /// resolution failed.
    pub async fn evaluate_flag(
        &self,
        key: &str,
        context: &EvaluationContext,
    ) -> Resolution<Option<FlagValue>> {
        let cache_key = cache_key(key, context);
        if let Some(value) = self.cache.get(&cache_key) {
            log::debug!(target: "edflags", flag = key; "cache hit");
            return Resolution::Resolved(value);
        }

        let gate = self.inflight_gate(&cache_key);
        let _guard = gate.lock().await;

        // Another caller may have resolved the key while we waited on the gate.
        if let Some(value) = self.cache.get(&cache_key) {
            return Resolution::Resolved(value);
        }

        let url = format!("{}/flags/{}/evaluate", self.base_url, key);
        let request = self.http.get(url).headers(context.to_headers());
        match self.fetch_json::<EvaluationResponse>(request).await {
            Ok(response) => {
                self.cache.insert(cache_key, response.value.clone());
                Resolution::Resolved(response.value)
            }
            Err(err) => {
                log::warn!(target: "edflags", flag = key; "flag evaluation failed: {err}");
                Resolution::Fallback(None, err)
            }
        }
    }

    /// Boolean-typed variant of [`ConfigClient::evaluate_flag`]. A flag of a
    /// different kind resolves to `None`.
    pub async fn evaluate_boolean(
        &self,
        key: &str,
        context: &EvaluationContext,
    ) -> Resolution<Option<bool>> {
        self.evaluate_typed(key, context, FlagKind::Boolean, FlagValue::as_boolean)
            .await
    }

    /// String-typed variant of [`ConfigClient::evaluate_flag`].
    pub async fn evaluate_string(
        &self,
        key: &str,
        context: &EvaluationContext,
    ) -> Resolution<Option<String>> {
        self.evaluate_typed(key, context, FlagKind::String, |value| {
            value.as_str().map(str::to_owned)
        })
        .await
    }

    /// Number-typed variant of [`ConfigClient::evaluate_flag`].
    pub async fn evaluate_number(
        &self,
        key: &str,
        context: &EvaluationContext,
    ) -> Resolution<Option<f64>> {
        self.evaluate_typed(key, context, FlagKind::Number, FlagValue::as_number)
            .await
    }

    /// Structured-typed variant of [`ConfigClient::evaluate_flag`].
    pub async fn evaluate_structured(
        &self,
        key: &str,
        context: &EvaluationContext,
    ) -> Resolution<Option<serde_json::Value>> {
        self.evaluate_typed(key, context, FlagKind::Structured, |value| {
            value.as_structured().cloned()
        })
        .await
    }

    async fn evaluate_typed<T>(
        &self,
        key: &str,
        context: &EvaluationContext,
        expected: FlagKind,
        convert: impl Fn(&FlagValue) -> Option<T>,
    ) -> Resolution<Option<T>> {
        self.evaluate_flag(key, context).await.map(|value| {
            value.and_then(|value| {
                let converted = convert(&value);
                if converted.is_none() {
                    log::warn!(
                        target: "edflags",
                        flag = key,
                        expected = expected.as_str(),
                        actual = value.kind().as_str();
                        "flag value has unexpected kind"
                    );
                }
                converted
            })
        })
    }

    /// Evaluate a batch of flags in one network call.
    ///
    /// Every requested key gets its own cache entry, so later single-key
    /// lookups with the same context are cache hits. Keys the backend omitted
    /// or nulled are cached as resolved-absent and left out of the returned
    /// map.
    pub async fn evaluate_flags(
        &self,
        keys: &[&str],
        context: &EvaluationContext,
    ) -> Resolution<HashMap<String, FlagValue>> {
        let url = format!("{}/flags/evaluate", self.base_url);
        let request = self
            .http
            .post(url)
            .json(&BatchEvaluationRequest { flags: keys, context });

        match self.fetch_json::<BatchEvaluationResponse>(request).await {
            Ok(response) => {
                for &key in keys {
                    let value = response.flags.get(key).cloned().flatten();
                    self.cache.insert(cache_key(key, context), value);
                }
                let values = response
                    .flags
                    .into_iter()
                    .filter_map(|(key, value)| Some((key, value?)))
                    .collect();
                Resolution::Resolved(values)
            }
            Err(err) => {
                log::warn!(target: "edflags", flags = keys.len(); "batch flag evaluation failed: {err}");
                Resolution::Fallback(HashMap::new(), err)
            }
        }
    }

    /// The full set of flags applicable to `context`, without an explicit key
    /// list. Never served from or written to the cache; every call
    /// re-fetches.
    pub async fn get_user_flags(
        &self,
        context: &EvaluationContext,
    ) -> Resolution<HashMap<String, FlagValue>> {
        let url = format!("{}/flags/user", self.base_url);
        let request = self.http.get(url).headers(context.to_headers());
        match self.fetch_json::<UserFlagsResponse>(request).await {
            Ok(response) => Resolution::Resolved(response.flags),
            Err(err) => {
                log::warn!(target: "edflags", "user flags fetch failed: {err}");
                Resolution::Fallback(HashMap::new(), err)
            }
        }
    }

    /// Administrative listing of flag definitions.
    pub async fn list_flags(&self, filter: &ListFlagsFilter) -> Resolution<Vec<FlagDefinition>> {
        let url = format!("{}/flags", self.base_url);
        let mut request = self.http.get(url);
        if !filter.tags.is_empty() {
            request = request.query(&[("tags", filter.tags.join(","))]);
        }
        if let Some(enabled) = filter.enabled {
            request = request.query(&[("enabled", enabled)]);
        }

        match self.fetch_json::<ListFlagsResponse>(request).await {
            Ok(response) => Resolution::Resolved(response.flags),
            Err(err) => {
                log::warn!(target: "edflags", "flag listing failed: {err}");
                Resolution::Fallback(Vec::new(), err)
            }
        }
    }

    /// Metadata for a single flag.
    pub async fn get_flag_definition(&self, key: &str) -> Resolution<Option<FlagDefinition>> {
        let url = format!("{}/flags/{}", self.base_url, key);
        match self.fetch_json::<FlagDefinition>(self.http.get(url)).await {
            Ok(definition) => Resolution::Resolved(Some(definition)),
            Err(err) => {
                log::warn!(target: "edflags", flag = key; "flag definition fetch failed: {err}");
                Resolution::Fallback(None, err)
            }
        }
    }

    /// Chat configuration for `context`; [`ChatConfig::default`] when the
    /// backend is unreachable.
    pub async fn get_chat_config(&self, context: &EvaluationContext) -> Resolution<ChatConfig> {
        self.domain_config("chat", context).await
    }

    /// Games configuration for `context`; games stay disabled when the
    /// backend is unreachable.
    pub async fn get_games_config(&self, context: &EvaluationContext) -> Resolution<GamesConfig> {
        self.domain_config("games", context).await
    }

    /// Speech-language screening configuration for `context`.
    pub async fn get_slp_config(&self, context: &EvaluationContext) -> Resolution<SlpConfig> {
        self.domain_config("slp", context).await
    }

    /// Social-emotional learning screening configuration for `context`.
    pub async fn get_sel_config(&self, context: &EvaluationContext) -> Resolution<SelConfig> {
        self.domain_config("sel", context).await
    }

    async fn domain_config<T: DeserializeOwned + Default>(
        &self,
        name: &str,
        context: &EvaluationContext,
    ) -> Resolution<T> {
        let url = format!("{}/config/{}", self.base_url, name);
        let request = self.http.get(url).headers(context.to_headers());
        match self.fetch_json::<T>(request).await {
            Ok(config) => Resolution::Resolved(config),
            Err(err) => {
                log::warn!(target: "edflags", domain = name; "config fetch failed, using defaults: {err}");
                Resolution::Fallback(T::default(), err)
            }
        }
    }

    /// Ask the backend to recompute its authoritative cache. The local cache
    /// is left untouched; use [`ConfigClient::clear_cache`] for that.
    pub async fn refresh_cache(&self) -> bool {
        let url = format!("{}/flags/refresh", self.base_url);
        match self.transport.execute(self.http.post(url)).await {
            Ok(_) => true,
            Err(err) => {
                log::warn!(target: "edflags", "cache refresh request failed: {err}");
                false
            }
        }
    }

    /// Drop every locally cached flag resolution. Synchronous; no network
    /// call.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Number of locally cached entries, including not-yet-overwritten
    /// expired ones.
    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }

    /// Probe the backend liveness endpoint.
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.fetch_json::<HealthResponse>(self.http.get(url)).await {
            Ok(health) => health.status == "healthy",
            Err(err) => {
                log::debug!(target: "edflags", "health check failed: {err}");
                false
            }
        }
    }

    /// One logical request through the resilient transport, decoded as JSON.
    async fn fetch_json<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let response = self.transport.execute(request).await?;
        let value = response.json().await?;
        Ok(value)
    }

    /// The gate for a cache key, creating it when no concurrent caller holds
    /// one. Dead gates are pruned opportunistically; the map never outgrows
    /// the number of in-flight requests.
    fn inflight_gate(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut map = self
            .inflight
            .lock()
            .expect("thread holding in-flight lock should not panic");

        if let Some(gate) = map.get(key).and_then(Weak::upgrade) {
            return gate;
        }

        let gate = Arc::new(tokio::sync::Mutex::new(()));
        map.retain(|_, weak| weak.strong_count() > 0);
        map.insert(key.to_owned(), Arc::downgrade(&gate));
        gate
    }
}
