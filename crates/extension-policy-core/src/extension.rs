//! Extension parameter resolution
//!
//! Lookup order for an extension:
//!
//! 1. A fresh cache entry is returned without touching the network.
//! 2. A local account matching the extension is queried on its own PBX using
//!    its own extension. Failure yields `None`; there is no second attempt.
//! 3. Otherwise the directory's default account is used as a proxy: its PBX
//!    and domain, but the requested extension as the target.
//! 4. With no default account the lookup yields `None`.
//!
//! Only successful fetches are cached. Concurrent misses for the same
//! extension share one fetch unless coalescing is disabled.

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::cache::ConnectParamsCache;
use crate::client::ConnectParamsFetcher;
use crate::directory::{AccountDirectory, AccountRef};
use crate::error::{PolicyError, PolicyResult};
use crate::resolver::AddressResolver;
use crate::types::{ConnectParams, ExtensionId};

type InFlightFetch = Shared<BoxFuture<'static, Option<ConnectParams>>>;

struct ResolverInner {
    cache: ConnectParamsCache,
    addresses: Arc<dyn AddressResolver>,
    fetcher: Arc<dyn ConnectParamsFetcher>,
    directory: Arc<dyn AccountDirectory>,
    coalesce_in_flight: bool,
    in_flight: Mutex<HashMap<ExtensionId, InFlightFetch>>,
}

/// Resolves and caches [`ConnectParams`] per extension
///
/// Cheap to clone; clones share the cache and the in-flight table.
#[derive(Clone)]
pub struct ExtensionResolver {
    inner: Arc<ResolverInner>,
}

impl ExtensionResolver {
    pub fn new(
        cache: ConnectParamsCache,
        addresses: Arc<dyn AddressResolver>,
        fetcher: Arc<dyn ConnectParamsFetcher>,
        directory: Arc<dyn AccountDirectory>,
        coalesce_in_flight: bool,
    ) -> Self {
        Self {
            inner: Arc::new(ResolverInner {
                cache,
                addresses,
                fetcher,
                directory,
                coalesce_in_flight,
                in_flight: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// The params cache
    pub fn cache(&self) -> &ConnectParamsCache {
        &self.inner.cache
    }

    /// Params for `extension`, or `None` when they cannot be determined
    pub async fn resolve_params(&self, extension: &str) -> Option<ConnectParams> {
        if let Some(params) = self.inner.cache.get(extension) {
            debug!(extension = %extension, "Connect params cache hit");
            return Some(params);
        }

        if !self.inner.coalesce_in_flight {
            return self.inner.fetch_and_cache(extension).await;
        }

        let flight = {
            let mut in_flight = self.inner.in_flight.lock();
            match in_flight.get(extension) {
                Some(flight) => {
                    debug!(extension = %extension, "Joining in-flight connect params fetch");
                    flight.clone()
                }
                None => {
                    // A fetch may have completed since the first cache check
                    if let Some(params) = self.inner.cache.get(extension) {
                        return Some(params);
                    }
                    let flight = ResolverInner::start_fetch(&self.inner, extension);
                    in_flight.insert(ExtensionId::from(extension), flight.clone());
                    flight
                }
            }
        };

        flight.await
    }
}

impl ResolverInner {
    fn start_fetch(inner: &Arc<Self>, extension: &str) -> InFlightFetch {
        let inner = Arc::clone(inner);
        let extension = ExtensionId::from(extension);
        async move {
            let result = inner.fetch_and_cache(extension.as_str()).await;
            // Only this fetch can be registered under the key while it runs
            inner.in_flight.lock().remove(extension.as_str());
            result
        }
        .boxed()
        .shared()
    }

    async fn fetch_and_cache(&self, extension: &str) -> Option<ConnectParams> {
        match self.fetch_uncached(extension).await {
            Ok(params) => {
                self.cache.put(extension, params);
                Some(params)
            }
            Err(e @ (PolicyError::DirectoryMiss { .. } | PolicyError::Resolution { .. })) => {
                error!(extension = %extension, error = %e, "Cannot resolve connect params");
                None
            }
            Err(e) => {
                // Transport and response failures are logged by the fetcher
                debug!(extension = %extension, error = %e, "Connect params unavailable");
                None
            }
        }
    }

    async fn fetch_uncached(&self, extension: &str) -> PolicyResult<ConnectParams> {
        if let Some(account) = self.directory.find_account_by_extension(extension) {
            let own_extension = account.extension_id().unwrap_or(extension).to_string();
            return self.fetch_via(&account, &own_extension).await;
        }

        let account = self
            .directory
            .default_account()
            .ok_or_else(|| PolicyError::directory_miss(extension))?;

        info!(
            extension = %extension,
            via = %account,
            "No local account for extension, querying through default account"
        );
        self.fetch_via(&account, extension).await
    }

    async fn fetch_via(&self, account: &AccountRef, extension: &str) -> PolicyResult<ConnectParams> {
        let domain = account.server_domain().ok_or_else(|| {
            PolicyError::resolution(account.to_string(), "account has no server domain")
        })?;
        let address = self.addresses.resolve(domain).await;
        self.fetcher.fetch(&address, domain, extension).await
    }
}
