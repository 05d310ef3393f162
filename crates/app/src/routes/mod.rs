//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! # Public
//! GET  /                                   - Landing page
//! GET  /login                              - Login page (?error=<code>)
//! GET  /auth                               - Start OAuth install (?shop=<shop>)
//! GET  /auth_token                         - OAuth callback
//!
//! # Feature pages (auth required)
//! GET  /products/watch                     - Market analysis
//! GET  /products/watch/config              - Market analysis settings
//! GET  /products/sync                      - Stock sync
//! GET  /products/sync/config               - Stock sync settings
//!
//! # Shopify REST proxy (auth required)
//! GET  /shopify/products.json              - List products
//! GET  /shopify/products/{id}/metafields.json - Product metafields
//! *    /shopify/{resource}.json            - Any Admin REST resource
//! ```
//!
//! Every proxy route accepts GET, POST, PUT, PATCH and DELETE.

pub mod auth;
pub mod pages;
pub mod proxy;

use axum::{
    Router,
    middleware::from_fn,
    routing::{MethodRouter, get, post},
};

use crate::middleware::require_auth;
use crate::state::AppState;

/// Login page; auth failures land here with `?error=<code>`.
pub const LOGIN_PATH: &str = "/login";

/// Where a successful install lands.
pub const HOME_PATH: &str = "/";

/// Build the application router.
pub fn routes() -> Router<AppState> {
    let protected = Router::new()
        .route("/products/watch", get(pages::watch))
        .route("/products/watch/config", get(pages::watch_config))
        .route("/products/sync", get(pages::sync))
        .route("/products/sync/config", get(pages::sync_config))
        .route(
            "/shopify/products.json",
            get(proxy::list_products).merge(proxy_writes()),
        )
        .route(
            "/shopify/products/{product_id}/metafields.json",
            get(proxy::product_metafields).merge(proxy_writes()),
        )
        .route(
            "/shopify/{*resource}",
            get(proxy::forward).merge(proxy_writes()),
        )
        .route_layer(from_fn(require_auth));

    Router::new()
        .route(HOME_PATH, get(pages::index))
        .route(LOGIN_PATH, get(pages::login))
        .route("/auth", get(auth::start_auth))
        .route(crate::config::CALLBACK_PATH, get(auth::get_access_token))
        .merge(protected)
}

/// Write verbs on a proxy route, all relayed by the generic forwarder.
fn proxy_writes() -> MethodRouter<AppState> {
    post(proxy::forward)
        .put(proxy::forward)
        .patch(proxy::forward)
        .delete(proxy::forward)
}
