//! Composition root for the policy service
//!
//! ```rust,no_run
//! use extension_policy_core::{AccountRef, ExtensionPolicyBuilder, StaticAccountDirectory};
//!
//! # async fn example() -> extension_policy_core::PolicyResult<()> {
//! let directory = StaticAccountDirectory::new()
//!     .with_account(AccountRef::new("100", "pbx.example.com"));
//!
//! let policy = ExtensionPolicyBuilder::new(directory).build()?;
//!
//! if policy.outgoing_call_allowed("100", "200").await {
//!     println!("call may proceed");
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use crate::cache::ConnectParamsCache;
use crate::client::{ConnectParamsFetcher, HttpConnectParamsClient};
use crate::clock::{Clock, SystemClock};
use crate::config::PolicyConfig;
use crate::directory::AccountDirectory;
use crate::error::PolicyResult;
use crate::extension::ExtensionResolver;
use crate::policy::PolicyEvaluator;
use crate::resolver::{AddressResolver, DnsAddressResolver};

/// Builder for [`PolicyEvaluator`]
///
/// Defaults to the system clock, DNS resolution and the HTTP client built
/// from the configuration.
pub struct ExtensionPolicyBuilder {
    config: PolicyConfig,
    directory: Arc<dyn AccountDirectory>,
    clock: Option<Arc<dyn Clock>>,
    addresses: Option<Arc<dyn AddressResolver>>,
    fetcher: Option<Arc<dyn ConnectParamsFetcher>>,
}

impl ExtensionPolicyBuilder {
    /// Start a builder around the application's account directory
    pub fn new(directory: impl AccountDirectory + 'static) -> Self {
        Self::with_shared_directory(Arc::new(directory))
    }

    /// Start a builder around a shared account directory
    pub fn with_shared_directory(directory: Arc<dyn AccountDirectory>) -> Self {
        Self {
            config: PolicyConfig::default(),
            directory,
            clock: None,
            addresses: None,
            fetcher: None,
        }
    }

    pub fn config(mut self, config: PolicyConfig) -> Self {
        self.config = config;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn address_resolver(mut self, addresses: Arc<dyn AddressResolver>) -> Self {
        self.addresses = Some(addresses);
        self
    }

    /// Replace the HTTP client
    pub fn fetcher(mut self, fetcher: Arc<dyn ConnectParamsFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Validate the configuration and assemble the evaluator
    pub fn build(self) -> PolicyResult<PolicyEvaluator> {
        self.config.validate()?;

        let fetcher = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(HttpConnectParamsClient::new(self.config.clone())?),
        };
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let addresses = self
            .addresses
            .unwrap_or_else(|| Arc::new(DnsAddressResolver::new()));

        let cache = ConnectParamsCache::new(self.config.cache_ttl(), clock);
        let resolver = ExtensionResolver::new(
            cache,
            addresses,
            fetcher,
            self.directory,
            self.config.coalesce_in_flight,
        );

        Ok(PolicyEvaluator::new(resolver))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::StaticAccountDirectory;
    use crate::error::PolicyError;
    use std::time::Duration;

    #[test]
    fn test_build_with_defaults() {
        let policy = ExtensionPolicyBuilder::new(StaticAccountDirectory::new())
            .build()
            .unwrap();
        assert_eq!(policy.resolver().cache().ttl(), Duration::from_secs(60));
    }

    #[test]
    fn test_build_uses_configured_ttl() {
        let policy = ExtensionPolicyBuilder::new(StaticAccountDirectory::new())
            .config(PolicyConfig::new().with_cache_ttl(Duration::from_secs(5)))
            .build()
            .unwrap();
        assert_eq!(policy.resolver().cache().ttl(), Duration::from_secs(5));
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let result = ExtensionPolicyBuilder::new(StaticAccountDirectory::new())
            .config(PolicyConfig::new().with_port(0))
            .build();
        assert!(matches!(result, Err(PolicyError::Configuration { .. })));
    }
}
