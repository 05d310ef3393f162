//! OAuth install flow.
//!
//! `GET /auth` sends the merchant to Shopify's consent screen and
//! `GET /auth_token` receives them back, verifies the callback and exchanges
//! the authorization code for an access token.

use axum::{
    extract::{Query, RawQuery, State},
    response::Redirect,
};
use playmakers_core::ShopDomain;
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::Result;
use crate::middleware::auth::set_current_shop;
use crate::models::{ShopSession, session_keys};
use crate::routes::HOME_PATH;
use crate::services::auth::{AuthError, CallbackParams, generate_random_string};
use crate::state::AppState;

/// Length of the OAuth `state` nonce.
const STATE_LENGTH: usize = 32;

/// Query parameters of `GET /auth`.
#[derive(Debug, Deserialize)]
pub struct StartAuthQuery {
    pub shop: Option<String>,
}

/// Start the OAuth install.
///
/// GET /auth?shop=<shop>
///
/// Falls back to the configured default shop when no `shop` is given.
#[tracing::instrument(skip(state, session, query))]
pub async fn start_auth(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<StartAuthQuery>,
) -> Result<Redirect> {
    let config = state.config();

    let shop = match query.shop.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => ShopDomain::parse(raw).map_err(AuthError::from)?,
        None => config
            .shopify
            .default_shop
            .clone()
            .ok_or(AuthError::MissingShop)?,
    };

    let oauth_state = generate_random_string(STATE_LENGTH);
    session
        .insert(session_keys::SHOPIFY_OAUTH_STATE, &oauth_state)
        .await
        .map_err(AuthError::from)?;
    session
        .insert(session_keys::SHOPIFY_OAUTH_SHOP, &shop)
        .await
        .map_err(AuthError::from)?;

    let url = state.shopify().authorization_url(
        &shop,
        &config.shopify.redirect_uri,
        &config.shopify.scopes,
        &oauth_state,
    );

    tracing::info!(shop = %shop, "Redirecting to Shopify OAuth");
    Ok(Redirect::to(&url))
}

/// OAuth callback.
///
/// GET /auth_token?code=..&hmac=..&shop=..&state=..&timestamp=..
///
/// On success the session holds the shop's access token and the visitor is
/// sent to the home page; every failure lands on the login page.
#[tracing::instrument(skip(state, session, query))]
pub async fn get_access_token(
    State(state): State<AppState>,
    session: Session,
    RawQuery(query): RawQuery,
) -> Result<Redirect> {
    let params = CallbackParams::parse(query.as_deref().unwrap_or_default());
    let shop = complete_install(&state, &session, &params).await?;

    tracing::info!(shop = %shop.shop, scope = %shop.scope, "Shopify app installed");
    Ok(Redirect::to(HOME_PATH))
}

async fn complete_install(
    state: &AppState,
    session: &Session,
    params: &CallbackParams,
) -> std::result::Result<ShopSession, AuthError> {
    // Unsigned callbacks must not touch the pending flow, denials included
    if !params.verify_hmac(state.config().shopify.api_secret()) {
        return Err(AuthError::InvalidHmac);
    }

    if let Some(error) = params.get("error") {
        clear_pending(session).await?;
        return Err(AuthError::Denied(error.to_string()));
    }

    let code = params.require("code")?;
    let returned_state = params.require("state")?;
    let shop = ShopDomain::parse(params.require("shop")?)?;

    // One-time use: the pending flow is consumed whatever the outcome
    let (expected_state, pending_shop) = clear_pending(session).await?;

    if pending_shop.is_some_and(|pending| pending != shop) {
        return Err(AuthError::ShopMismatch);
    }
    if expected_state.as_deref() != Some(returned_state) {
        return Err(AuthError::StateMismatch);
    }

    let token = state.shopify().exchange_code(&shop, code).await?;
    let shop_session = ShopSession::from(token);

    // Fresh session ID after login to prevent fixation
    session.cycle_id().await?;
    set_current_shop(session, &shop_session).await?;

    Ok(shop_session)
}

/// Remove the pending OAuth state and shop from the session.
async fn clear_pending(
    session: &Session,
) -> std::result::Result<(Option<String>, Option<ShopDomain>), AuthError> {
    let state = session
        .remove::<String>(session_keys::SHOPIFY_OAUTH_STATE)
        .await?;
    let shop = session
        .remove::<ShopDomain>(session_keys::SHOPIFY_OAUTH_SHOP)
        .await?;
    Ok((state, shop))
}
