//! Shopify Admin REST pass-through.
//!
//! Requests under `/shopify/<resource>.json` are replayed against the
//! shop's Admin API with the session's access token. Shopify's status,
//! relayed headers and body come back unchanged, errors included.

use axum::{
    body::Bytes,
    extract::{FromRequest, Path, RawQuery, Request, State},
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
};
use playmakers_core::ResourcePath;

use crate::error::{AppError, Result};
use crate::middleware::RequireShop;
use crate::models::ShopSession;
use crate::shopify::{ProxyRequest, UpstreamResponse};
use crate::state::AppState;

impl IntoResponse for UpstreamResponse {
    fn into_response(self) -> Response {
        (self.status, self.headers, self.body).into_response()
    }
}

/// Builds the [`ProxyRequest`] from the incoming request.
///
/// Rejects paths that are not a plain `/shopify/<resource>.json` with 404,
/// non-empty bodies without a JSON content type with 415 and bodies that do
/// not parse as JSON with 400.
impl<S> FromRequest<S> for ProxyRequest
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let method = req.method().clone();
        let query = req.uri().query().map(str::to_owned);
        let resource = ResourcePath::from_proxy_path(req.uri().path())
            .map_err(|e| AppError::NotFound(e.to_string()))?;
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());

        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        let body = if body.is_empty() {
            None
        } else {
            // Cross-site "simple" requests cannot send a JSON content type
            // without a CORS preflight
            if !content_type.as_deref().is_some_and(is_json_content_type) {
                return Err(AppError::UnsupportedMediaType(
                    content_type.unwrap_or_else(|| "missing content type".to_string()),
                ));
            }
            serde_json::from_slice::<serde::de::IgnoredAny>(&body)
                .map_err(|e| AppError::BadRequest(format!("invalid JSON body: {e}")))?;
            Some(body)
        };

        Ok(Self {
            method,
            resource,
            query: None,
            body,
        }
        .with_query(query))
    }
}

/// Whether `value` is `application/json` or an `application/*+json` type,
/// ignoring parameters such as `charset`.
fn is_json_content_type(value: &str) -> bool {
    let essence = value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    essence == "application/json"
        || essence
            .strip_prefix("application/")
            .is_some_and(|subtype| subtype.ends_with("+json"))
}

/// GET /shopify/products.json
pub async fn list_products(
    State(state): State<AppState>,
    RequireShop(shop): RequireShop,
    RawQuery(query): RawQuery,
) -> Result<Response> {
    relay(
        &state,
        &shop,
        ProxyRequest::get(ResourcePath::products()).with_query(query),
    )
    .await
}

/// GET /shopify/products/{product_id}/metafields.json
pub async fn product_metafields(
    State(state): State<AppState>,
    RequireShop(shop): RequireShop,
    Path(product_id): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Response> {
    let resource = ResourcePath::product_metafields(&product_id)
        .map_err(|e| AppError::NotFound(e.to_string()))?;

    relay(&state, &shop, ProxyRequest::get(resource).with_query(query)).await
}

/// Any verb on /shopify/{resource}.json
pub async fn forward(
    State(state): State<AppState>,
    RequireShop(shop): RequireShop,
    request: ProxyRequest,
) -> Result<Response> {
    relay(&state, &shop, request).await
}

#[tracing::instrument(
    skip(state, shop, request),
    fields(shop = %shop.shop, method = %request.method, resource = %request.resource.as_str())
)]
async fn relay(state: &AppState, shop: &ShopSession, request: ProxyRequest) -> Result<Response> {
    let upstream = state
        .shopify()
        .forward(&shop.shop, &shop.access_token, &request)
        .await?;

    if !upstream.status.is_success() {
        tracing::info!(status = %upstream.status, "Shopify returned an error status");
    }

    Ok(upstream.into_response())
}
