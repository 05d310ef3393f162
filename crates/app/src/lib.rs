//! Playmakers Shopify app library.
//!
//! Installs into a shop through Shopify's OAuth flow, renders the
//! market-analysis and stock-sync pages, and relays their Admin REST calls
//! with the shop's access token.
//!
//! The binary in `main.rs` only adds Sentry, logging and the listener; the
//! router itself is built here so tests can drive it directly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod shopify;
pub mod state;

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::get,
};
use tower_http::{
    compression::CompressionLayer,
    services::ServeDir,
    trace::{DefaultOnResponse, OnResponse, TraceLayer},
};
use tower_sessions::SessionStore;
use tracing::Span;

use crate::state::AppState;

/// Build the full application router with its middleware stack.
///
/// `store` backs the sessions; any [`SessionStore`] works (`main` uses
/// `PostgreSQL` or memory, tests use memory).
pub fn app<S>(state: AppState, store: S) -> Router
where
    S: SessionStore + Clone,
{
    let router = Router::new()
        .route("/health", get(health))
        .merge(routes::routes())
        .fallback_service(ServeDir::new(&state.config().static_dir))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::seed_development_session,
        ))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::security_headers_middleware,
        ));

    middleware::with_session_layer(router, store, state.config())
        .layer(from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        shop = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .layer(CompressionLayer::new())
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}
