//! Cached wrapper for the Roblox HTTP client
//!
//! Plain verbs pass straight through to the wrapped dispatcher. The cached
//! verbs consult the disk store first: a hit is returned immediately while
//! a detached refresh re-fetches the entry in the background; a miss takes
//! the full dispatcher path and the successful response is stored before
//! being returned.
//!
//! # Example
//!
//! ```no_run
//! use robx_cache::CachedHttpClient;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = CachedHttpClient::new().await?;
//!
//! // First call fetches from the network and stores the response
//! let games = client
//!     .cache_get("https://games.roblox.com/v1/games/list")
//!     .query("sortOrder", "Asc")
//!     .send()
//!     .await?;
//!
//! // Repeat calls are served from disk instantly; a background refresh
//! // keeps the entry current
//! let again = client
//!     .cache_get("https://games.roblox.com/v1/games/list")
//!     .query("sortOrder", "Asc")
//!     .send()
//!     .await?;
//! # let _ = (games, again);
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::thread;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, trace};

use robx_client::{HttpClient, Request, RequestBuilder, Response};

use crate::fingerprint::Fingerprint;
use crate::store::{ResponseCache, RetentionPolicy};
use crate::{Result, ensure_dir, get_cache_dir};

/// A caching wrapper around [`HttpClient`]
#[derive(Debug)]
pub struct CachedHttpClient {
    /// The underlying dispatcher
    client: HttpClient,
    /// Backing store
    cache: ResponseCache,
    /// Whether the cached verbs actually consult the store
    enabled: bool,
}

impl CachedHttpClient {
    /// Create a cached client with the default cache directory
    pub async fn new() -> Result<Self> {
        let client = HttpClient::new()?;
        let cache_dir = get_cache_dir()?.join("responses");
        ensure_dir(&cache_dir).await?;

        debug!("Initialized cached HTTP client at: {:?}", cache_dir);

        Ok(Self {
            client,
            cache: ResponseCache::new(cache_dir),
            enabled: true,
        })
    }

    /// Create a cached client with a custom cache directory
    pub async fn with_cache_dir(cache_dir: PathBuf) -> Result<Self> {
        let client = HttpClient::new()?;
        ensure_dir(&cache_dir).await?;

        Ok(Self {
            client,
            cache: ResponseCache::new(cache_dir),
            enabled: true,
        })
    }

    /// Wrap an existing dispatcher
    pub async fn with_client(client: HttpClient) -> Result<Self> {
        let cache_dir = get_cache_dir()?.join("responses");
        ensure_dir(&cache_dir).await?;

        Ok(Self {
            client,
            cache: ResponseCache::new(cache_dir),
            enabled: true,
        })
    }

    /// Wrap an existing dispatcher with a custom cache directory
    pub async fn with_client_and_cache_dir(client: HttpClient, cache_dir: PathBuf) -> Result<Self> {
        ensure_dir(&cache_dir).await?;

        Ok(Self {
            client,
            cache: ResponseCache::new(cache_dir),
            enabled: true,
        })
    }

    /// Replace the retention policy of the backing store
    pub fn with_retention(self, retention: RetentionPolicy) -> Self {
        Self {
            cache: self.cache.with_retention(retention),
            client: self.client,
            enabled: self.enabled,
        }
    }

    /// Enable or disable caching
    pub fn set_caching_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Access the wrapped dispatcher
    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    /// Access the backing store
    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Start building a plain GET request
    pub fn get(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        self.client.get(url)
    }

    /// Start building a plain POST request
    pub fn post(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        self.client.post(url)
    }

    /// Start building a plain PUT request
    pub fn put(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        self.client.put(url)
    }

    /// Start building a plain PATCH request
    pub fn patch(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        self.client.patch(url)
    }

    /// Start building a plain DELETE request
    pub fn delete(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        self.client.delete(url)
    }

    /// Start building a GET request served through the disk cache
    pub fn cache_get(&self, url: impl Into<String>) -> CachedRequestBuilder<'_> {
        CachedRequestBuilder {
            owner: self,
            inner: self.client.get(url),
        }
    }

    /// Start building a POST request served through the disk cache
    ///
    /// Intended for POST-as-read endpoints; the body participates in the
    /// fingerprint, so distinct payloads get distinct entries.
    pub fn cache_post(&self, url: impl Into<String>) -> CachedRequestBuilder<'_> {
        CachedRequestBuilder {
            owner: self,
            inner: self.client.post(url),
        }
    }

    /// Run a request through the cache: hit serves the stored entry and
    /// refreshes it in the background, miss dispatches and stores
    async fn execute_cached(&self, request: Request) -> robx_client::Result<Response> {
        if !self.enabled {
            return self.client.execute(&request).await;
        }

        let fingerprint = self.fingerprint_of(&request);
        if let Some(cached) = self.cache.get(&fingerprint).await {
            trace!(fingerprint = fingerprint.as_str(), "disk cache hit, serving stored entry");
            spawn_revalidation(
                self.client.clone(),
                self.cache.clone(),
                fingerprint,
                request,
            );
            return Ok(cached);
        }

        let response = self.client.execute(&request).await?;
        self.cache.put(&fingerprint, &response).await;
        Ok(response)
    }

    fn fingerprint_of(&self, request: &Request) -> Fingerprint {
        Fingerprint::compute(
            request.method(),
            request.url(),
            request.query(),
            request.json_body(),
            &self.client.auth_marker(),
        )
    }
}

/// Builder for the cached verbs
///
/// Mirrors [`RequestBuilder`] but routes `send` through the disk cache.
#[derive(Debug)]
pub struct CachedRequestBuilder<'a> {
    owner: &'a CachedHttpClient,
    inner: RequestBuilder<'a>,
}

impl CachedRequestBuilder<'_> {
    /// Append a query parameter
    pub fn query(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.inner = self.inner.query(key, value);
        self
    }

    /// Set the JSON body
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        self.inner = self.inner.json(body);
        self
    }

    /// Set a request-scoped header
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.inner = self.inner.header(name, value);
        self
    }

    /// Execute through the cache
    pub async fn send(self) -> robx_client::Result<Response> {
        let request = self.inner.build()?;
        self.owner.execute_cached(request).await
    }
}

/// Re-fetch a cache entry after a stale copy has already been served
///
/// Runs on its own thread with its own runtime so the refresh survives the
/// caller's context teardown. Fire-and-forget: never joined, never
/// cancelled by the caller, and every failure is logged and discarded.
fn spawn_revalidation(
    client: HttpClient,
    cache: ResponseCache,
    fingerprint: Fingerprint,
    request: Request,
) {
    let spawned = thread::Builder::new()
        .name("robx-cache-revalidate".into())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(error) => {
                    debug!(%error, "revalidation runtime unavailable");
                    return;
                }
            };
            runtime.block_on(async {
                match client.execute(&request).await {
                    Ok(response) => {
                        cache.put(&fingerprint, &response).await;
                        trace!(fingerprint = fingerprint.as_str(), "cache entry revalidated");
                    }
                    Err(error) => {
                        debug!(
                            %error,
                            fingerprint = fingerprint.as_str(),
                            "background revalidation failed"
                        );
                    }
                }
            });
        });
    if let Err(error) = spawned {
        debug!(%error, "failed to spawn revalidation thread");
    }
}
