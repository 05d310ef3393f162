//! Shopify OAuth and Admin REST client.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderMap, HeaderName, Method};
use playmakers_core::{AccessToken, ResourcePath, ShopDomain};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Deserialize;
use tracing::instrument;
use url::Url;

use crate::config::ShopifyConfig;

use super::{OAuthToken, ProxyRequest, ShopifyError, UpstreamResponse};

/// Header carrying the Admin API access token.
const ACCESS_TOKEN_HEADER: &str = "x-shopify-access-token";

/// Upstream headers relayed back to the browser.
const RELAYED_HEADERS: &[&str] = &["content-type", "link", "x-shopify-shop-api-call-limit"];

/// One try plus one retry on a transient transport error.
const MAX_ATTEMPTS: u32 = 2;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest upstream error body kept in `ShopifyError::Status`.
const MAX_ERROR_BODY: usize = 512;

/// Shopify OAuth + Admin REST client.
///
/// Cheaply cloneable; all clones share one connection pool.
#[derive(Clone)]
pub struct ShopifyClient {
    inner: Arc<ShopifyClientInner>,
}

struct ShopifyClientInner {
    client: reqwest::Client,
    api_key: String,
    api_secret: String,
    api_version: String,
    /// Overrides `https://<shop>` for server-to-server calls
    api_origin: Option<Url>,
}

/// OAuth token response from Shopify.
#[derive(Debug, Deserialize)]
struct OAuthTokenResponse {
    access_token: String,
    #[serde(default)]
    scope: String,
}

impl ShopifyClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Http` if the HTTP client cannot be built.
    pub fn new(config: &ShopifyConfig) -> Result<Self, ShopifyError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(config.request_timeout))
            .build()?;

        Ok(Self {
            inner: Arc::new(ShopifyClientInner {
                client,
                api_key: config.api_key.clone(),
                api_secret: config.api_secret().to_string(),
                api_version: config.api_version.clone(),
                api_origin: config.api_origin.clone(),
            }),
        })
    }

    /// Get the app API key (OAuth client ID).
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.inner.api_key
    }

    // =========================================================================
    // OAuth Flow
    // =========================================================================

    /// Generate the OAuth authorization URL for `shop`.
    ///
    /// This URL is opened by the merchant's browser, so it always points at
    /// the shop itself, never at the API origin override.
    #[must_use]
    pub fn authorization_url(
        &self,
        shop: &ShopDomain,
        redirect_uri: &str,
        scopes: &[String],
        state: &str,
    ) -> String {
        let scope = scopes.join(",");
        format!(
            "https://{}/admin/oauth/authorize?client_id={}&scope={}&redirect_uri={}&state={}",
            shop,
            urlencoding::encode(&self.inner.api_key),
            urlencoding::encode(&scope),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(state)
        )
    }

    /// Exchange an authorization code for an access token.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Status` if Shopify rejects the exchange.
    /// Returns `ShopifyError::Http` if the HTTP request fails.
    #[instrument(skip(self, code), fields(shop = %shop))]
    pub async fn exchange_code(
        &self,
        shop: &ShopDomain,
        code: &str,
    ) -> Result<OAuthToken, ShopifyError> {
        let url = self.origin(shop)?.join("admin/oauth/access_token")?;

        let params = [
            ("client_id", self.inner.api_key.as_str()),
            ("client_secret", self.inner.api_secret.as_str()),
            ("code", code),
        ];

        let response = send_with_retry(&Method::POST, || {
            self.inner
                .client
                .post(url.clone())
                .header(ACCEPT, "application/json")
                .form(&params)
        })
        .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ShopifyError::Status {
                status,
                body: truncate(text),
            });
        }

        let token_response: OAuthTokenResponse = response.json().await?;

        Ok(OAuthToken {
            access_token: AccessToken::new(token_response.access_token),
            scope: token_response.scope,
            obtained_at: chrono::Utc::now().timestamp(),
            shop: shop.clone(),
        })
    }

    // =========================================================================
    // REST pass-through
    // =========================================================================

    /// Relay `request` to the shop's Admin REST API.
    ///
    /// Any HTTP status Shopify answers with, including 4xx/5xx, is returned
    /// as `Ok` so callers can relay it verbatim. `PATCH` is sent as `PUT`,
    /// the verb Shopify REST uses for updates.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Http` if the transport fails after the retry.
    #[instrument(
        skip(self, token, request),
        fields(shop = %shop, method = %request.method, resource = %request.resource)
    )]
    pub async fn forward(
        &self,
        shop: &ShopDomain,
        token: &AccessToken,
        request: &ProxyRequest,
    ) -> Result<UpstreamResponse, ShopifyError> {
        let url = self.resource_url(shop, &request.resource, request.query.as_deref())?;
        let method = upstream_method(&request.method);

        let response = send_with_retry(&method, || {
            let builder = self
                .inner
                .client
                .request(method.clone(), url.clone())
                .header(ACCESS_TOKEN_HEADER, token.expose())
                .header(ACCEPT, "application/json");
            match &request.body {
                Some(body) => builder
                    .header(CONTENT_TYPE, "application/json")
                    .body(body.clone()),
                None => builder,
            }
        })
        .await?;

        let status = response.status();
        let mut headers = HeaderMap::new();
        for name in RELAYED_HEADERS {
            if let Some(value) = response.headers().get(*name) {
                headers.insert(HeaderName::from_static(*name), value.clone());
            }
        }
        let body = response.bytes().await?;

        if status.is_success() {
            tracing::debug!(status = status.as_u16(), "Shopify call succeeded");
        } else {
            tracing::warn!(status = status.as_u16(), "Shopify call returned an error status");
        }

        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }

    /// Build `<origin>/admin/api/<version>/<resource>.json[?query]`.
    fn resource_url(
        &self,
        shop: &ShopDomain,
        resource: &ResourcePath,
        query: Option<&str>,
    ) -> Result<Url, ShopifyError> {
        let mut url = self.origin(shop)?.join(&format!(
            "admin/api/{}/{}",
            self.inner.api_version,
            resource.to_json_path()
        ))?;
        url.set_query(query);
        Ok(url)
    }

    fn origin(&self, shop: &ShopDomain) -> Result<Url, ShopifyError> {
        match &self.inner.api_origin {
            Some(origin) => Ok(origin.clone()),
            None => Ok(Url::parse(&format!("https://{shop}/"))?),
        }
    }
}

/// Send a request, retrying once on a transient transport error.
///
/// HTTP error statuses are never retried.
async fn send_with_retry<F>(method: &Method, build: F) -> Result<reqwest::Response, reqwest::Error>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut attempt = 1;
    loop {
        match build().send().await {
            Ok(response) => return Ok(response),
            Err(e) if attempt < MAX_ATTEMPTS && is_transient(&e, method) => {
                tracing::warn!(attempt, error = %e, "Transient Shopify transport error, retrying");
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Shopify REST has no PATCH; updates are PUT.
fn upstream_method(method: &Method) -> Method {
    if *method == Method::PATCH {
        Method::PUT
    } else {
        method.clone()
    }
}

/// Connect failures never reached Shopify and are always safe to retry;
/// timeouts are retried only for idempotent verbs.
fn is_transient(error: &reqwest::Error, method: &Method) -> bool {
    error.is_connect() || (error.is_timeout() && method.is_idempotent())
}

fn truncate(mut text: String) -> String {
    if text.len() > MAX_ERROR_BODY {
        let mut end = MAX_ERROR_BODY;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
    }
    text
}
