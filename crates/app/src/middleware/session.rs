//! Session middleware configuration.
//!
//! Sessions live in whatever [`SessionStore`] `main` picks: `PostgreSQL` when
//! `DATABASE_URL` is set, in-memory otherwise. The cookie only carries the
//! session ID and is signed with a key derived from `SESSION_SECRET`.

use axum::Router;
use secrecy::ExposeSecret;
use sha2::{Digest, Sha512};
use tower_sessions::{
    Expiry, SessionManagerLayer, SessionStore,
    cookie::{Key, SameSite},
};

use crate::config::AppConfig;
use crate::state::AppState;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "playmakers_session";

/// Session expiry time in seconds (7 days of inactivity).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Wrap `router` in a signed-cookie session layer backed by `store`.
///
/// When the app is served over HTTPS the cookie is `SameSite=None; Secure`
/// so it survives inside the Shopify admin iframe. Plain-HTTP development
/// falls back to `SameSite=Lax`.
pub fn with_session_layer<S>(
    router: Router<AppState>,
    store: S,
    config: &AppConfig,
) -> Router<AppState>
where
    S: SessionStore + Clone,
{
    let is_secure = config.is_secure();
    let same_site = if is_secure {
        SameSite::None
    } else {
        SameSite::Lax
    };

    let layer = SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        .with_same_site(same_site)
        .with_http_only(true)
        .with_path("/")
        .with_signed(signing_key(config.session_secret.expose_secret()));

    router.layer(layer)
}

/// Derive the 64-byte cookie signing key from the session secret.
fn signing_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signing_key_is_deterministic() {
        let a = signing_key("a-long-enough-session-secret-value");
        let b = signing_key("a-long-enough-session-secret-value");
        let c = signing_key("another-long-enough-session-secret");
        assert_eq!(a.master(), b.master());
        assert_ne!(a.master(), c.master());
    }
}
