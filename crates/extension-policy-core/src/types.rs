//! Core types shared across the crate

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Identifier of an extension on the PBX
///
/// Opaque string used both as the cache key and as the account lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtensionId(String);

impl ExtensionId {
    /// Create a new extension identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExtensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ExtensionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ExtensionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for ExtensionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Policy flags fetched from the PBX for one extension
///
/// Always fully populated; a fetch either yields all three flags or nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectParams {
    /// The extension is a guest extension
    pub is_guest: bool,
    /// A guest may message admin extensions
    pub is_guest_to_admin_messaging_enabled: bool,
    /// A guest may call other guest extensions
    pub is_guest_to_guest_calling_enabled: bool,
}

impl ConnectParams {
    /// Parameters of a non-guest (admin) extension
    pub fn admin() -> Self {
        Self::default()
    }

    /// Parameters of a guest extension with the given rights
    pub fn guest(admin_messaging: bool, guest_calling: bool) -> Self {
        Self {
            is_guest: true,
            is_guest_to_admin_messaging_enabled: admin_messaging,
            is_guest_to_guest_calling_enabled: guest_calling,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_extension_id_lookup_by_str() {
        let mut map = HashMap::new();
        map.insert(ExtensionId::from("100"), 1);
        assert_eq!(map.get("100"), Some(&1));
        assert_eq!(map.get("200"), None);
    }

    #[test]
    fn test_connect_params_constructors() {
        assert!(!ConnectParams::admin().is_guest);

        let guest = ConnectParams::guest(true, false);
        assert!(guest.is_guest);
        assert!(guest.is_guest_to_admin_messaging_enabled);
        assert!(!guest.is_guest_to_guest_calling_enabled);
    }
}
