//! Cached Handler Wrapper
//!
//! `ResponseCache` owns a store and turns any `Handler` into a caching one.
//! It is also the invalidation surface used by admin actions.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::cache::{derive_key, CacheStats, MemoryStore, ResponseStore, SingleFlight};
use crate::error::Result;
use crate::handler::{ApiRequest, ApiResponse, Handler};

/// Header reporting whether a GET was served from the cache.
pub const CACHE_STATUS_HEADER: &str = "x-cache";

/// Lifetime used when none is configured.
pub const DEFAULT_DURATION: Duration = Duration::from_secs(60);

// == Cache Status ==
/// Whether a response came from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }

    fn header(self) -> (HeaderName, HeaderValue) {
        (
            HeaderName::from_static(CACHE_STATUS_HEADER),
            HeaderValue::from_static(self.as_str()),
        )
    }
}

// == Cache Options ==
/// Per-route caching policy.
#[derive(Debug, Clone)]
pub struct CacheOptions {
    /// How long a stored response is served
    pub duration: Duration,
    /// Whether query parameters are part of the key
    pub include_query: bool,
    /// Tags the stored key is registered under
    pub tags: Vec<String>,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            duration: DEFAULT_DURATION,
            include_query: true,
            tags: Vec::new(),
        }
    }
}

impl CacheOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn duration_secs(self, secs: u64) -> Self {
        self.duration(Duration::from_secs(secs))
    }

    pub fn include_query(mut self, include_query: bool) -> Self {
        self.include_query = include_query;
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    fn cache_control(&self) -> HeaderValue {
        HeaderValue::from_str(&format!("public, max-age={}", self.duration.as_secs()))
            .unwrap_or_else(|_| HeaderValue::from_static("no-cache"))
    }
}

// == Response Cache ==
/// Handle to a response store.
///
/// Clones share the same store, so the router's wrappers and the admin
/// invalidation endpoints see one cache.
#[derive(Clone)]
pub struct ResponseCache {
    store: Arc<dyn ResponseStore>,
}

impl ResponseCache {
    // == Constructor ==
    pub fn new(store: Arc<dyn ResponseStore>) -> Self {
        Self { store }
    }

    /// Cache backed by a fresh process-local `MemoryStore`.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    // == Wrap ==
    /// Wraps `handler` so GET responses are cached under `options`.
    pub fn wrap<H: Handler>(&self, handler: H, options: CacheOptions) -> CachedHandler<H> {
        CachedHandler {
            inner: handler,
            options,
            store: self.store.clone(),
            flights: SingleFlight::new(),
        }
    }

    // == Invalidate ==
    /// Evicts every entry registered under any of `tags`.
    ///
    /// Unknown tags are accepted. Returns the number of entries removed.
    pub async fn invalidate<S: AsRef<str>>(&self, tags: &[S]) -> usize {
        let tags: Vec<String> = tags.iter().map(|t| t.as_ref().to_string()).collect();
        let removed = self.store.evict_tags(&tags).await;
        info!(?tags, removed, "cache tags invalidated");
        removed
    }

    // == Clear ==
    /// Evicts every entry. Returns the number of entries removed.
    pub async fn clear(&self) -> usize {
        let removed = self.store.clear_all().await;
        info!(removed, "cache cleared");
        removed
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.stats().await
    }
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache").finish_non_exhaustive()
    }
}

// == Stored Response ==
/// What the store keeps for one cached response.
///
/// Status and the handler's own headers travel with the body, so a hit
/// replays a 203 as a 203.
#[derive(Debug, Serialize, Deserialize)]
struct StoredResponse {
    status: u16,
    headers: Vec<(String, String)>,
    body: String,
}

impl StoredResponse {
    fn capture(response: &ApiResponse) -> Self {
        let headers = response
            .headers
            .iter()
            .filter_map(|(name, value)| {
                let value = value.to_str().ok()?;
                Some((name.as_str().to_string(), value.to_string()))
            })
            .collect();
        Self {
            status: response.status.as_u16(),
            headers,
            body: response.body.clone(),
        }
    }

    fn replay(self) -> Option<ApiResponse> {
        let status = StatusCode::from_u16(self.status).ok()?;
        let mut headers = HeaderMap::new();
        for (name, value) in self.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).ok()?;
            headers.append(name, HeaderValue::from_str(&value).ok()?);
        }
        Some(ApiResponse {
            status,
            headers,
            body: self.body,
        })
    }
}

// == Cached Handler ==
/// A `Handler` that answers repeated GETs from the store.
pub struct CachedHandler<H> {
    inner: H,
    options: CacheOptions,
    store: Arc<dyn ResponseStore>,
    flights: SingleFlight,
}

impl<H> CachedHandler<H> {
    /// Live response for `key`, marked as a hit.
    async fn cached(&self, key: &str) -> Option<ApiResponse> {
        let payload = self.store.lookup(key).await?;
        let response = serde_json::from_str::<StoredResponse>(&payload)
            .ok()
            .and_then(StoredResponse::replay);

        match response {
            Some(response) => {
                let (name, value) = CacheStatus::Hit.header();
                Some(response.with_header(name, value))
            }
            None => {
                warn!(%key, "unreadable cache entry, recomputing");
                None
            }
        }
    }
}

#[async_trait]
impl<H: Handler> Handler for CachedHandler<H> {
    #[instrument(name = "cached_handler", skip_all, fields(method = %request.method, path = %request.path()))]
    async fn call(&self, request: ApiRequest) -> Result<ApiResponse> {
        if request.method != Method::GET {
            return self.inner.call(request).await;
        }

        let key = derive_key(request.path(), &request.query, self.options.include_query);

        if let Some(response) = self.cached(&key).await {
            debug!(%key, outcome = "hit", "serving cached response");
            return Ok(response);
        }

        // Concurrent misses on this key queue here; the first one fills the store
        let _flight = self.flights.acquire(&key).await;
        if let Some(response) = self.cached(&key).await {
            debug!(%key, outcome = "hit", "filled by concurrent request");
            return Ok(response);
        }

        self.store.record_miss().await;
        debug!(%key, outcome = "miss", "executing handler");
        let response = self.inner.call(request).await?;

        let (name, value) = CacheStatus::Miss.header();
        if !response.status.is_success() {
            return Ok(response.with_header(name, value));
        }

        let stored = serde_json::to_string(&StoredResponse::capture(&response))?;
        self.store
            .store(&key, stored, self.options.duration, &self.options.tags)
            .await;
        debug!(%key, tags = ?self.options.tags, "response cached");

        Ok(response
            .with_header(name, value)
            .with_header(header::CACHE_CONTROL, self.options.cache_control()))
    }
}
