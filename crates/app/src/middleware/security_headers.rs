//! Security headers middleware.
//!
//! The app is usually rendered inside the Shopify admin, so framing is
//! restricted to Shopify's origins instead of being denied outright. Outside
//! the embedded mode no one may frame it.

use axum::{
    extract::{Request, State},
    http::{
        HeaderName, HeaderValue,
        header::{CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS},
    },
    middleware::Next,
    response::Response,
};

use crate::state::AppState;

/// CSP for pages embedded in the Shopify admin.
const EMBEDDED_CSP: &str = "default-src 'self'; \
     script-src 'self' https://cdn.shopify.com; \
     style-src 'self' 'unsafe-inline' https://cdn.shopify.com; \
     img-src 'self' data: https://cdn.shopify.com; \
     connect-src 'self'; \
     object-src 'none'; \
     base-uri 'self'; \
     form-action 'self' https://*.myshopify.com; \
     frame-ancestors https://*.myshopify.com https://admin.shopify.com";

/// CSP for the standalone (non-embedded) mode.
const STANDALONE_CSP: &str = "default-src 'self'; \
     script-src 'self' https://cdn.shopify.com; \
     style-src 'self' 'unsafe-inline' https://cdn.shopify.com; \
     img-src 'self' data: https://cdn.shopify.com; \
     connect-src 'self'; \
     object-src 'none'; \
     base-uri 'self'; \
     form-action 'self' https://*.myshopify.com; \
     frame-ancestors 'none'";

/// Add security headers to all responses.
///
/// - `X-Content-Type-Options: nosniff`
/// - `Referrer-Policy: strict-origin-when-cross-origin`
/// - `Content-Security-Policy` with `frame-ancestors` limited to Shopify
///   when embedded
/// - `X-DNS-Prefetch-Control: off`
pub async fn security_headers_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let embedded = state.config().embedded_sdk;
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));

    // Shopify reads the referrer to detect the embedding admin
    headers.insert(
        REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    headers.insert(
        CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(if embedded {
            EMBEDDED_CSP
        } else {
            STANDALONE_CSP
        }),
    );

    headers.insert(
        HeaderName::from_static("x-dns-prefetch-control"),
        HeaderValue::from_static("off"),
    );

    response
}
