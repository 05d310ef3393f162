//! Authentication middleware and extractors.
//!
//! The auth guard is a `route_layer` on every protected route. It reads the
//! [`ShopSession`] from the session and either lets the request through with
//! the session in the request extensions or redirects to the login page.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::config::AppConfig;
use crate::models::{ShopSession, session_keys};
use crate::services::auth::AuthError;
use crate::state::AppState;

/// Load the authenticated shop from the session, if any.
///
/// Store failures are logged and treated as "not logged in".
pub async fn current_shop(session: &Session) -> Option<ShopSession> {
    match session.get::<ShopSession>(session_keys::SHOP_SESSION).await {
        Ok(shop) => shop.filter(ShopSession::is_authenticated),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read shop session");
            None
        }
    }
}

/// Store the authenticated shop in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_shop(
    session: &Session,
    shop: &ShopSession,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::SHOP_SESSION, shop).await
}

/// Redirect to the login page asking the visitor to sign in.
fn login_required() -> Response {
    Redirect::to(&AuthError::MissingToken.login_redirect_path()).into_response()
}

/// Auth guard for protected routes.
///
/// Redirects to the login page when the session has no access token,
/// otherwise exposes the [`ShopSession`] to the handler via extensions.
pub async fn require_auth(
    session: Session,
    mut request: Request,
    next: axum::middleware::Next,
) -> Response {
    let Some(shop) = current_shop(&session).await else {
        tracing::debug!(
            path = %request.uri().path(),
            "Unauthenticated request, redirecting to login"
        );
        return login_required();
    };

    tracing::Span::current().record("shop", shop.shop.as_str());
    request.extensions_mut().insert(shop);
    next.run(request).await
}

/// Development shortcut: log every session in as the configured default shop.
///
/// Only active when `ENV=development` and both `SHOP` and `TOKEN` are set.
/// Sessions that already hold a shop (e.g. after a real OAuth install) are
/// left alone.
pub async fn seed_development_session(
    State(state): State<AppState>,
    session: Session,
    request: Request,
    next: axum::middleware::Next,
) -> Response {
    if let Some(seeded) = development_seed(state.config()) {
        if current_shop(&session).await.is_none() {
            if let Err(e) = set_current_shop(&session, &seeded).await {
                tracing::warn!(error = %e, "Failed to seed development session");
            }
        }
    }

    next.run(request).await
}

/// The session development mode logs every visitor in as, if configured.
fn development_seed(config: &AppConfig) -> Option<ShopSession> {
    if !config.is_development() {
        return None;
    }
    let shop = config.shopify.default_shop.clone()?;
    let access_token = config.shopify.default_access_token.clone()?;

    Some(ShopSession {
        shop,
        access_token,
        scope: config.shopify.scopes.join(","),
        obtained_at: chrono::Utc::now().timestamp(),
    })
}

/// Extractor for the authenticated shop.
///
/// Uses the session the auth guard already loaded, falling back to reading
/// the session when the handler sits outside the guard.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireShop(shop): RequireShop) -> impl IntoResponse {
///     format!("Hello, {}!", shop.shop)
/// }
/// ```
pub struct RequireShop(pub ShopSession);

/// Rejection for [`RequireShop`]: always a redirect to the login page.
pub struct LoginRequired;

impl IntoResponse for LoginRequired {
    fn into_response(self) -> Response {
        login_required()
    }
}

impl<S> FromRequestParts<S> for RequireShop
where
    S: Send + Sync,
{
    type Rejection = LoginRequired;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(shop) = parts.extensions.get::<ShopSession>() {
            return Ok(Self(shop.clone()));
        }

        let session = parts.extensions.get::<Session>().ok_or(LoginRequired)?;
        current_shop(session).await.map(Self).ok_or(LoginRequired)
    }
}
