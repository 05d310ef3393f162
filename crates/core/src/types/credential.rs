//! Shopify credential types.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Shopify Admin API access token.
///
/// Returned by the OAuth code exchange and sent as the
/// `X-Shopify-Access-Token` header on every proxied call. The value is
/// opaque; `Debug` redacts it so tokens never end up in logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    /// Create a new access token.
    #[must_use]
    pub const fn new(token: String) -> Self {
        Self(token)
    }

    /// Returns the raw token value.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns true if the token carries no value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

impl From<String> for AccessToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for AccessToken {
    fn from(token: &str) -> Self {
        Self(token.to_owned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_value() {
        let token = AccessToken::from("shpat_super_secret");
        let debug = format!("{token:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("shpat_super_secret"));
    }

    #[test]
    fn test_is_empty() {
        assert!(AccessToken::from("").is_empty());
        assert!(AccessToken::from("   ").is_empty());
        assert!(!AccessToken::from("shpat_1").is_empty());
    }

    #[test]
    fn test_serde_is_transparent() {
        let token = AccessToken::from("shpat_1");
        assert_eq!(serde_json::to_string(&token).unwrap(), "\"shpat_1\"");
        let parsed: AccessToken = serde_json::from_str("\"shpat_1\"").unwrap();
        assert_eq!(parsed.expose(), "shpat_1");
    }
}
