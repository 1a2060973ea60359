//! PBX hostname to address resolution
//!
//! Resolution never fails the caller: when DNS yields nothing usable the
//! original hostname is handed back and the HTTP client connects by name.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{PolicyError, PolicyResult};

/// Resolves a PBX domain to a connectable address
#[async_trait]
pub trait AddressResolver: Send + Sync {
    /// Resolve `hostname`, returning the hostname itself on failure
    async fn resolve(&self, hostname: &str) -> String;
}

/// Resolver backed by the system resolver via tokio
#[derive(Debug, Clone, Copy, Default)]
pub struct DnsAddressResolver;

impl DnsAddressResolver {
    pub fn new() -> Self {
        Self
    }

    async fn lookup(hostname: &str) -> PolicyResult<String> {
        // The port only satisfies the lookup API; any address family is accepted
        let mut addrs = tokio::net::lookup_host((hostname, 0))
            .await
            .map_err(|e| PolicyError::resolution(hostname, e.to_string()))?;

        addrs
            .next()
            .map(|addr| addr.ip().to_string())
            .ok_or_else(|| PolicyError::resolution(hostname, "no addresses returned"))
    }
}

#[async_trait]
impl AddressResolver for DnsAddressResolver {
    async fn resolve(&self, hostname: &str) -> String {
        match Self::lookup(hostname).await {
            Ok(address) => {
                debug!(host = %hostname, address = %address, "Resolved PBX address");
                address
            }
            Err(e) => {
                warn!(error = %e, "Falling back to unresolved PBX hostname");
                hostname.to_string()
            }
        }
    }
}
