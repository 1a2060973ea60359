//! Account directory consulted to find the PBX behind an extension
//!
//! Accounts are owned by the embedding application. The resolver only
//! borrows an [`AccountRef`] long enough to build one fetch request.

use std::fmt;
use std::str::FromStr;

use crate::error::PolicyError;

/// Locally known account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRef {
    server_domain: Option<String>,
    extension_id: Option<String>,
}

impl AccountRef {
    pub fn new(extension_id: impl Into<String>, server_domain: impl Into<String>) -> Self {
        Self {
            server_domain: Some(server_domain.into()),
            extension_id: Some(extension_id.into()),
        }
    }

    /// Account whose fields may be missing
    pub fn partial(extension_id: Option<String>, server_domain: Option<String>) -> Self {
        Self {
            server_domain,
            extension_id,
        }
    }

    /// PBX domain of the account
    pub fn server_domain(&self) -> Option<&str> {
        self.server_domain.as_deref()
    }

    /// Extension of the account
    pub fn extension_id(&self) -> Option<&str> {
        self.extension_id.as_deref()
    }
}

impl fmt::Display for AccountRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}",
            self.extension_id().unwrap_or("?"),
            self.server_domain().unwrap_or("?")
        )
    }
}

/// Parses `EXT@DOMAIN`
impl FromStr for AccountRef {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('@') {
            Some((ext, domain)) if !ext.is_empty() && !domain.is_empty() => {
                Ok(AccountRef::new(ext, domain))
            }
            _ => Err(PolicyError::config(format!(
                "invalid account '{}', expected EXT@DOMAIN",
                s
            ))),
        }
    }
}

/// Source of locally provisioned accounts
pub trait AccountDirectory: Send + Sync {
    /// Account whose extension matches `extension`
    fn find_account_by_extension(&self, extension: &str) -> Option<AccountRef>;

    /// Account to use when no local account matches
    fn default_account(&self) -> Option<AccountRef>;
}

/// Fixed in-memory directory
///
/// The default account is the explicitly configured one, otherwise the first
/// registered account.
#[derive(Debug, Clone, Default)]
pub struct StaticAccountDirectory {
    accounts: Vec<AccountRef>,
    default: Option<AccountRef>,
}

impl StaticAccountDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account
    pub fn with_account(mut self, account: AccountRef) -> Self {
        self.accounts.push(account);
        self
    }

    /// Set the default account
    pub fn with_default(mut self, account: AccountRef) -> Self {
        self.default = Some(account);
        self
    }
}

impl AccountDirectory for StaticAccountDirectory {
    fn find_account_by_extension(&self, extension: &str) -> Option<AccountRef> {
        self.accounts
            .iter()
            .find(|account| account.extension_id() == Some(extension))
            .cloned()
    }

    fn default_account(&self) -> Option<AccountRef> {
        self.default
            .clone()
            .or_else(|| self.accounts.first().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_account() {
        let account: AccountRef = "100@pbx.example.com".parse().unwrap();
        assert_eq!(account.extension_id(), Some("100"));
        assert_eq!(account.server_domain(), Some("pbx.example.com"));
        assert_eq!(account.to_string(), "100@pbx.example.com");

        assert!("100".parse::<AccountRef>().is_err());
        assert!("@pbx.example.com".parse::<AccountRef>().is_err());
        assert!("100@".parse::<AccountRef>().is_err());
    }

    #[test]
    fn test_static_directory_lookup() {
        let directory = StaticAccountDirectory::new()
            .with_account(AccountRef::new("100", "pbx.example.com"))
            .with_account(AccountRef::new("101", "pbx.example.com"));

        assert_eq!(
            directory.find_account_by_extension("101"),
            Some(AccountRef::new("101", "pbx.example.com"))
        );
        assert_eq!(directory.find_account_by_extension("200"), None);
        assert_eq!(
            directory.default_account(),
            Some(AccountRef::new("100", "pbx.example.com"))
        );
    }

    #[test]
    fn test_explicit_default_wins() {
        let directory = StaticAccountDirectory::new()
            .with_account(AccountRef::new("100", "pbx.example.com"))
            .with_default(AccountRef::new("900", "pbx2.example.com"));

        assert_eq!(
            directory.default_account(),
            Some(AccountRef::new("900", "pbx2.example.com"))
        );
        assert_eq!(StaticAccountDirectory::new().default_account(), None);
    }
}
