//! Call and chat permission rules
//!
//! The rules are pure functions over resolved [`ConnectParams`]. Unknown
//! params always allow: losing the policy source must not block calling or
//! messaging.
//!
//! | Decision | Denied when |
//! |----------|-------------|
//! | conversations page | self is a guest without admin messaging |
//! | outgoing chat | from and to are guests, or from is a guest starting a group chat, or from is a guest without admin messaging |
//! | outgoing call | from and to are guests and from lacks guest calling |

use tracing::{debug, warn};

use crate::extension::ExtensionResolver;
use crate::types::ConnectParams;

/// Whether the conversations page is available to an extension
pub fn conversations_page_enabled(params: Option<&ConnectParams>) -> bool {
    match params {
        Some(me) => !(me.is_guest && !me.is_guest_to_admin_messaging_enabled),
        None => true,
    }
}

/// Whether `from` may start or send a chat to `to`
pub fn outgoing_chat_allowed(
    from: Option<&ConnectParams>,
    to: Option<&ConnectParams>,
    is_group_chat: bool,
) -> bool {
    let (Some(from), Some(to)) = (from, to) else {
        warn!("Connect params unavailable, allowing outgoing chat");
        return true;
    };

    if !from.is_guest {
        return true;
    }

    let guest_to_guest = to.is_guest;
    // A non-guest recipient is an admin
    let admin_messaging_denied = !from.is_guest_to_admin_messaging_enabled;

    !(guest_to_guest || is_group_chat || admin_messaging_denied)
}

/// Whether `from` may place a call to `to`
pub fn outgoing_call_allowed(from: Option<&ConnectParams>, to: Option<&ConnectParams>) -> bool {
    let (Some(from), Some(to)) = (from, to) else {
        warn!("Connect params unavailable, allowing outgoing call");
        return true;
    };

    !(from.is_guest && to.is_guest && !from.is_guest_to_guest_calling_enabled)
}

/// Answers permission questions for extensions
///
/// Resolves the params of each extension involved, concurrently when there
/// are two, then applies the rules above.
#[derive(Clone)]
pub struct PolicyEvaluator {
    resolver: ExtensionResolver,
}

impl PolicyEvaluator {
    pub fn new(resolver: ExtensionResolver) -> Self {
        Self { resolver }
    }

    /// The underlying resolver
    pub fn resolver(&self) -> &ExtensionResolver {
        &self.resolver
    }

    /// Whether the conversations page is available to `extension`
    pub async fn conversations_page_enabled(&self, extension: &str) -> bool {
        let params = self.resolver.resolve_params(extension).await;
        let enabled = conversations_page_enabled(params.as_ref());
        debug!(extension = %extension, enabled, "Conversations page decision");
        enabled
    }

    /// Whether `from` may chat with `to`
    pub async fn outgoing_chat_allowed(&self, from: &str, to: &str, is_group_chat: bool) -> bool {
        let (from_params, to_params) = tokio::join!(
            self.resolver.resolve_params(from),
            self.resolver.resolve_params(to)
        );
        let allowed = outgoing_chat_allowed(from_params.as_ref(), to_params.as_ref(), is_group_chat);
        debug!(from = %from, to = %to, is_group_chat, allowed, "Outgoing chat decision");
        allowed
    }

    /// Whether `from` may call `to`
    pub async fn outgoing_call_allowed(&self, from: &str, to: &str) -> bool {
        let (from_params, to_params) = tokio::join!(
            self.resolver.resolve_params(from),
            self.resolver.resolve_params(to)
        );
        let allowed = outgoing_call_allowed(from_params.as_ref(), to_params.as_ref());
        debug!(from = %from, to = %to, allowed, "Outgoing call decision");
        allowed
    }
}
