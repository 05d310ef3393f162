//! Shopify Admin API access (OAuth install + REST pass-through).
//!
//! # Architecture
//!
//! - OAuth authorization-code flow for installing the app on a shop
//! - Admin REST API calls made with the per-session access token
//! - Responses are relayed as raw bytes; the app never interprets Shopify's
//!   field schemas
//!
//! # Example
//!
//! ```rust,ignore
//! use playmakers_app::shopify::{ProxyRequest, ShopifyClient};
//!
//! let client = ShopifyClient::new(&config.shopify)?;
//!
//! // Start the install
//! let url = client.authorization_url(&shop, &config.shopify.redirect_uri, &scopes, &state);
//!
//! // Relay a REST call
//! let response = client.forward(&shop, &token, &ProxyRequest::get(ResourcePath::products())).await?;
//! ```

mod client;

pub use client::ShopifyClient;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode};
use playmakers_core::{AccessToken, ResourcePath, ShopDomain};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when talking to Shopify.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP transport failed (connect error, timeout, broken body).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Shopify answered with a non-2xx status.
    #[error("Shopify returned {status}: {body}")]
    Status {
        /// Upstream status code.
        status: StatusCode,
        /// Upstream response body (truncated for logging).
        body: String,
    },

    /// The upstream URL could not be built.
    #[error("Invalid upstream URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ShopifyError {
    /// Whether the failure was a request timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_timeout())
    }
}

/// Token returned by the OAuth code exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthToken {
    /// The access token for API calls
    pub access_token: AccessToken,
    /// Granted scopes (comma-separated)
    pub scope: String,
    /// Unix timestamp when token was obtained
    pub obtained_at: i64,
    /// Shop the token belongs to
    pub shop: ShopDomain,
}

/// A REST call to relay to Shopify.
///
/// Derived from the incoming request; never persisted.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    /// HTTP verb of the incoming request.
    pub method: Method,
    /// Target resource, without the `.json` suffix.
    pub resource: ResourcePath,
    /// Raw query string, forwarded verbatim.
    pub query: Option<String>,
    /// JSON request body, forwarded verbatim.
    pub body: Option<Bytes>,
}

impl ProxyRequest {
    /// A body-less GET of `resource`.
    #[must_use]
    pub const fn get(resource: ResourcePath) -> Self {
        Self {
            method: Method::GET,
            resource,
            query: None,
            body: None,
        }
    }

    /// Attach a query string.
    #[must_use]
    pub fn with_query(mut self, query: Option<String>) -> Self {
        self.query = query.filter(|q| !q.is_empty());
        self
    }
}

/// Shopify's response to a relayed call, passed back unchanged.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    /// Upstream status code (2xx or not).
    pub status: StatusCode,
    /// Relayed upstream headers (content type, pagination, call limit).
    pub headers: HeaderMap,
    /// Upstream body bytes.
    pub body: Bytes,
}
