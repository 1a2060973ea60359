//! # Extension Policy Core
//!
//! Guest calling and messaging policy for telephony clients attached to a
//! hospitality PBX.
//!
//! For every extension the PBX publishes three flags: whether the extension
//! is a guest, whether that guest may message admin extensions and whether it
//! may call other guests. This crate fetches those flags from the PBX's
//! `getConnectParams` endpoint, caches them for a minute and answers the
//! permission questions the client asks before placing a call or sending a
//! chat.
//!
//! ## Architecture
//!
//! ```text
//! PolicyEvaluator ──► ExtensionResolver ──► ConnectParamsCache
//!                          │
//!                          ├──► AccountDirectory (provided by the application)
//!                          ├──► AddressResolver  (DNS, falls back to the name)
//!                          └──► ConnectParamsFetcher (HTTPS POST to the PBX)
//! ```
//!
//! Failures never surface to callers. When the flags of an extension cannot
//! be determined every decision involving it is permissive.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use extension_policy_core::{AccountRef, ExtensionPolicyBuilder, StaticAccountDirectory};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let directory = StaticAccountDirectory::new()
//!         .with_account(AccountRef::new("100", "pbx.example.com"));
//!     let policy = ExtensionPolicyBuilder::new(directory).build()?;
//!
//!     let may_chat = policy.outgoing_chat_allowed("100", "200", false).await;
//!     println!("100 -> 200 chat allowed: {}", may_chat);
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod cache;
pub mod client;
pub mod clock;
pub mod config;
pub mod directory;
pub mod error;
pub mod extension;
pub mod logging;
pub mod policy;
pub mod resolver;
pub mod types;

// Re-export main types
pub use builder::ExtensionPolicyBuilder;
pub use cache::ConnectParamsCache;
pub use client::{ConnectParamsFetcher, HttpConnectParamsClient};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::PolicyConfig;
pub use directory::{AccountDirectory, AccountRef, StaticAccountDirectory};
pub use error::{PolicyError, PolicyResult};
pub use extension::ExtensionResolver;
pub use policy::PolicyEvaluator;
pub use resolver::{AddressResolver, DnsAddressResolver};
pub use types::{ConnectParams, ExtensionId};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
