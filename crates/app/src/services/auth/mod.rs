//! Shopify OAuth helpers.
//!
//! - [`generate_random_string`] issues the per-session OAuth state
//! - [`CallbackParams`] parses the `/auth_token` query and verifies its HMAC

pub mod error;

pub use error::AuthError;

use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Generate a cryptographically secure random string.
#[must_use]
pub fn generate_random_string(length: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            char::from(CHARSET.get(idx).copied().unwrap_or(b'0'))
        })
        .collect()
}

/// Query parameters of the Shopify OAuth callback.
///
/// Keeps every pair, not only the ones the app reads, because the HMAC
/// covers the whole query.
#[derive(Debug, Clone, Default)]
pub struct CallbackParams {
    pairs: Vec<(String, String)>,
}

impl CallbackParams {
    /// Parse a raw (percent-encoded) query string.
    #[must_use]
    pub fn parse(query: &str) -> Self {
        let pairs = url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();
        Self { pairs }
    }

    /// First value of `key`, ignoring empty values.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.is_empty())
    }

    /// Value of `key`, or `AuthError::MissingParameter`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingParameter` if the parameter is absent or empty.
    pub fn require(&self, key: &'static str) -> Result<&str, AuthError> {
        self.get(key).ok_or(AuthError::MissingParameter(key))
    }

    /// The message Shopify signs: every pair except `hmac`/`signature`,
    /// sorted by key, as `k=v` joined with `&`.
    ///
    /// `%` and `&` are escaped in keys and values, `=` in keys.
    #[must_use]
    pub fn signing_message(&self) -> String {
        let mut pairs: Vec<(String, String)> = self
            .pairs
            .iter()
            .filter(|(k, _)| k != "hmac" && k != "signature")
            .map(|(k, v)| (escape(k).replace('=', "%3D"), escape(v)))
            .collect();
        pairs.sort();

        pairs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Verify the HMAC-SHA256 signature Shopify attached to the callback.
    ///
    /// The comparison is constant-time.
    #[must_use]
    pub fn verify_hmac(&self, secret: &str) -> bool {
        let Some(provided) = self.get("hmac") else {
            return false;
        };
        let Ok(provided) = hex::decode(provided) else {
            return false;
        };
        let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
            return false;
        };
        mac.update(self.signing_message().as_bytes());
        mac.verify_slice(&provided).is_ok()
    }
}

fn escape(value: &str) -> String {
    value.replace('%', "%25").replace('&', "%26")
}
