//! Network-first offline cache.
//!
//! # Design
//! [`OfflineCache`] wraps another [`Transport`] and is a `Transport` itself.
//! GET requests go to the network first; every response that comes back is
//! copied into the cache for the current version, and the cached copy is
//! served only when the network call fails outright. Other methods pass
//! straight through and never touch the cache.
//!
//! Cache contents live behind [`CacheStorage`] so the policy can be tested
//! without a real network or cache substrate.

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::{debug, info, warn};

use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};

pub const CACHE_VERSION: &str = "clarkson-v1";

/// The application shell stored at install time.
pub const PRECACHE_URLS: [&str; 3] = ["/", "/index.html", "/manifest.json"];

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("precache of {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: TransportError,
    },

    #[error("precache of {url} returned HTTP {status}")]
    BadStatus { url: String, status: u16 },
}

/// Named caches of responses keyed by request URL.
pub trait CacheStorage {
    fn put(&self, cache: &str, key: &str, response: HttpResponse);
    fn lookup(&self, cache: &str, key: &str) -> Option<HttpResponse>;
    fn delete_cache(&self, cache: &str) -> bool;
    fn cache_names(&self) -> Vec<String>;
}

#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    caches: RwLock<HashMap<String, HashMap<String, HttpResponse>>>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStorage for MemoryCacheStorage {
    fn put(&self, cache: &str, key: &str, response: HttpResponse) {
        let mut caches = self.caches.write().unwrap_or_else(|e| e.into_inner());
        caches
            .entry(cache.to_string())
            .or_default()
            .insert(key.to_string(), response);
    }

    fn lookup(&self, cache: &str, key: &str) -> Option<HttpResponse> {
        let caches = self.caches.read().unwrap_or_else(|e| e.into_inner());
        caches.get(cache)?.get(key).cloned()
    }

    fn delete_cache(&self, cache: &str) -> bool {
        let mut caches = self.caches.write().unwrap_or_else(|e| e.into_inner());
        caches.remove(cache).is_some()
    }

    fn cache_names(&self) -> Vec<String> {
        let caches = self.caches.read().unwrap_or_else(|e| e.into_inner());
        caches.keys().cloned().collect()
    }
}

#[derive(Debug)]
pub struct OfflineCache<T, C> {
    network: T,
    storage: C,
    version: String,
}

impl<T: Transport, C: CacheStorage> OfflineCache<T, C> {
    pub fn new(network: T, storage: C) -> Self {
        Self::with_version(network, storage, CACHE_VERSION)
    }

    pub fn with_version(network: T, storage: C, version: &str) -> Self {
        Self {
            network,
            storage,
            version: version.to_string(),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn storage(&self) -> &C {
        &self.storage
    }

    /// Precache `urls` for this version, then drop every other version.
    ///
    /// All-or-nothing: if any URL fails or answers non-2xx, nothing is written
    /// and older versions are kept.
    pub fn install(&self, urls: &[&str]) -> Result<(), CacheError> {
        let mut fetched = Vec::with_capacity(urls.len());
        for url in urls {
            let request = HttpRequest {
                method: HttpMethod::Get,
                path: url.to_string(),
                headers: Vec::new(),
                body: None,
            };
            let response = self.network.execute(&request).map_err(|source| CacheError::Transport {
                url: url.to_string(),
                source,
            })?;
            if !response.is_success() {
                return Err(CacheError::BadStatus {
                    url: url.to_string(),
                    status: response.status,
                });
            }
            fetched.push((url.to_string(), response));
        }

        for (url, response) in fetched {
            self.storage.put(&self.version, &url, response);
        }
        for name in self.storage.cache_names() {
            if name != self.version {
                self.storage.delete_cache(&name);
                info!(cache = %name, "dropped stale cache version");
            }
        }
        info!(version = %self.version, entries = urls.len(), "offline cache installed");
        Ok(())
    }
}

impl<T: Transport, C: CacheStorage> Transport for OfflineCache<T, C> {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        if request.method != HttpMethod::Get {
            return self.network.execute(request);
        }
        match self.network.execute(request) {
            Ok(response) => {
                self.storage.put(&self.version, &request.path, response.clone());
                Ok(response)
            }
            Err(e) => match self.storage.lookup(&self.version, &request.path) {
                Some(cached) => {
                    debug!(path = %request.path, error = %e, "network failed, serving cached response");
                    Ok(cached)
                }
                None => {
                    warn!(path = %request.path, error = %e, "network failed and nothing is cached");
                    Err(e)
                }
            },
        }
    }
}
