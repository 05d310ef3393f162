//! Authentication error types.

use thiserror::Error;

use crate::shopify::ShopifyError;

/// Errors that can occur during the OAuth handshake or the auth guard.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The merchant declined the install, or Shopify reported an error.
    #[error("authorization denied: {0}")]
    Denied(String),

    /// The callback's HMAC signature does not match.
    #[error("invalid HMAC signature")]
    InvalidHmac,

    /// A required callback parameter is absent.
    #[error("missing parameter: {0}")]
    MissingParameter(&'static str),

    /// The `shop` parameter is not a valid shop domain.
    #[error("invalid shop: {0}")]
    InvalidShop(#[from] playmakers_core::ShopDomainError),

    /// The callback is for a different shop than the one the flow started for.
    #[error("callback shop does not match the pending install")]
    ShopMismatch,

    /// The returned state does not match the one issued for this session.
    #[error("OAuth state mismatch")]
    StateMismatch,

    /// `/auth` was called without a shop and no default shop is configured.
    #[error("no shop to authenticate against")]
    MissingShop,

    /// The session has no access token.
    #[error("not authenticated")]
    MissingToken,

    /// The session store failed.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// The token exchange with Shopify failed.
    #[error("token exchange failed: {0}")]
    Upstream(#[from] ShopifyError),
}

impl AuthError {
    /// Short code passed to the login page as `?error=<code>`.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Denied(_) => "access_denied",
            Self::InvalidHmac => "invalid_hmac",
            Self::MissingParameter(_) => "missing_parameter",
            Self::InvalidShop(_) => "invalid_shop",
            Self::ShopMismatch => "shop_mismatch",
            Self::StateMismatch => "invalid_state",
            Self::MissingShop => "missing_shop",
            Self::MissingToken => "login_required",
            Self::Session(_) => "session",
            Self::Upstream(_) => "token_exchange",
        }
    }

    /// Login path carrying this error's code.
    #[must_use]
    pub fn login_redirect_path(&self) -> String {
        format!("{}?error={}", crate::routes::LOGIN_PATH, self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(AuthError::StateMismatch.code(), "invalid_state");
        assert_eq!(AuthError::InvalidHmac.code(), "invalid_hmac");
        assert_eq!(
            AuthError::MissingParameter("code").to_string(),
            "missing parameter: code"
        );
    }

    #[test]
    fn test_login_redirect_path() {
        assert_eq!(
            AuthError::StateMismatch.login_redirect_path(),
            "/login?error=invalid_state"
        );
    }
}
