//! Session-related types.
//!
//! Types stored in the session for authentication state.

use playmakers_core::{AccessToken, ShopDomain};
use serde::{Deserialize, Serialize};

use crate::shopify::OAuthToken;

/// Session-stored shop identity.
///
/// Present only once the OAuth exchange has succeeded (or, in development,
/// once the default shop/token has been seeded).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopSession {
    /// Shop the merchant installed the app on.
    pub shop: ShopDomain,
    /// Admin API access token for that shop.
    pub access_token: AccessToken,
    /// Granted scopes (comma-separated, as returned by Shopify).
    #[serde(default)]
    pub scope: String,
    /// Unix timestamp when the token was obtained.
    pub obtained_at: i64,
}

impl ShopSession {
    /// Whether the session carries a usable access token.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        !self.access_token.is_empty()
    }
}

impl From<OAuthToken> for ShopSession {
    fn from(token: OAuthToken) -> Self {
        Self {
            shop: token.shop,
            access_token: token.access_token,
            scope: token.scope,
            obtained_at: token.obtained_at,
        }
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for the authenticated shop session.
    pub const SHOP_SESSION: &str = "shop_session";

    /// Key for Shopify OAuth state (CSRF protection).
    pub const SHOPIFY_OAUTH_STATE: &str = "shopify_oauth_state";

    /// Key for the shop the pending OAuth flow was started for.
    pub const SHOPIFY_OAUTH_SHOP: &str = "shopify_oauth_shop";
}
