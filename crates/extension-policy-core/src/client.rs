//! Connect-params client
//!
//! Issues one form-encoded POST per lookup against the PBX:
//!
//! ```text
//! POST https://{address}:8443/getConnectParams
//! Content-Type: application/x-www-form-urlencoded
//!
//! domain={domain}&extension={extension}
//! ```
//!
//! A 200 response carries a JSON object with the optional boolean fields
//! `is_guest_extension`, `is_guest_to_admin_messaging_enabled` and
//! `is_guest_to_guest_calling_enabled`. Absent or mistyped fields read as
//! `false`. Any other status, a transport error or a body that is not a JSON
//! object is a failed fetch. There is no retry.
//!
//! The address passed to [`ConnectParamsFetcher::fetch`] is usually the
//! resolved IP of the PBX, so with certificate verification on the server
//! certificate must carry that IP as a subject alternative name. A
//! certificate issued only for the domain fails the handshake and the lookup
//! degrades to "unknown".

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::net::Ipv6Addr;
use tracing::{debug, error, warn};

use crate::config::PolicyConfig;
use crate::error::{PolicyError, PolicyResult};
use crate::types::ConnectParams;

const FIELD_IS_GUEST: &str = "is_guest_extension";
const FIELD_ADMIN_MESSAGING: &str = "is_guest_to_admin_messaging_enabled";
const FIELD_GUEST_CALLING: &str = "is_guest_to_guest_calling_enabled";

/// Fetches the policy flags of one extension from one PBX
#[async_trait]
pub trait ConnectParamsFetcher: Send + Sync {
    /// Fetch params for `extension` in `domain` from the PBX at `pbx_address`
    async fn fetch(
        &self,
        pbx_address: &str,
        domain: &str,
        extension: &str,
    ) -> PolicyResult<ConnectParams>;
}

/// HTTP implementation of [`ConnectParamsFetcher`]
///
/// Wraps a single pooled `reqwest::Client`; clone it freely, clones share the
/// connection pool.
#[derive(Debug, Clone)]
pub struct HttpConnectParamsClient {
    client: Client,
    config: PolicyConfig,
}

impl HttpConnectParamsClient {
    /// Build the shared HTTP session from configuration
    pub fn new(config: PolicyConfig) -> PolicyResult<Self> {
        config.validate()?;

        let builder = Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.request_timeout())
            .read_timeout(config.request_timeout())
            .timeout(config.resource_timeout());

        #[cfg(feature = "insecure-tls")]
        let builder = if config.accept_invalid_certs {
            warn!("TLS certificate verification is DISABLED for connect-params requests; never use this in production");
            builder.danger_accept_invalid_certs(true)
        } else {
            builder
        };

        let client = builder
            .build()
            .map_err(|e| PolicyError::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Endpoint URL for a PBX address
    pub fn endpoint_url(&self, pbx_address: &str) -> String {
        let host = if pbx_address.parse::<Ipv6Addr>().is_ok() {
            format!("[{}]", pbx_address)
        } else {
            pbx_address.to_string()
        };
        format!(
            "{}://{}:{}{}",
            self.config.scheme, host, self.config.port, self.config.endpoint_path
        )
    }

    async fn request(
        &self,
        url: &str,
        domain: &str,
        extension: &str,
    ) -> PolicyResult<ConnectParams> {
        let response = self
            .client
            .post(url)
            .form(&[("domain", domain), ("extension", extension)])
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(PolicyError::protocol(status.as_u16(), url));
        }

        let body = response.bytes().await?;
        parse_connect_params(&body)
    }
}

#[async_trait]
impl ConnectParamsFetcher for HttpConnectParamsClient {
    async fn fetch(
        &self,
        pbx_address: &str,
        domain: &str,
        extension: &str,
    ) -> PolicyResult<ConnectParams> {
        let url = self.endpoint_url(pbx_address);
        debug!(
            url = %url,
            domain = %domain,
            extension = %extension,
            insecure_tls = self.config.accept_invalid_certs,
            "Fetching connect params"
        );

        match self.request(&url, domain, extension).await {
            Ok(params) => {
                debug!(extension = %extension, ?params, "Fetched connect params");
                Ok(params)
            }
            Err(e) => {
                match &e {
                    PolicyError::Protocol { .. } | PolicyError::Parse { .. } => {
                        warn!(extension = %extension, error = %e, "Connect params request rejected")
                    }
                    _ => error!(extension = %extension, error = %e, "Connect params request failed"),
                }
                Err(e)
            }
        }
    }
}

/// Parse a connect-params response body
///
/// The body must be a JSON object; each flag defaults to `false` when absent
/// or not a boolean.
pub fn parse_connect_params(body: &[u8]) -> PolicyResult<ConnectParams> {
    let value: Value = serde_json::from_slice(body)?;
    let Value::Object(fields) = value else {
        return Err(PolicyError::parse("expected a JSON object"));
    };

    let flag = |key: &str| fields.get(key).and_then(Value::as_bool).unwrap_or(false);

    Ok(ConnectParams {
        is_guest: flag(FIELD_IS_GUEST),
        is_guest_to_admin_messaging_enabled: flag(FIELD_ADMIN_MESSAGING),
        is_guest_to_guest_calling_enabled: flag(FIELD_GUEST_CALLING),
    })
}
