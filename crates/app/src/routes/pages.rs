//! Server-rendered pages.
//!
//! Feature pages share one layout and receive their settings twice: as
//! template fields for the markup and as a JSON block the page scripts read.

use askama::Template;
use axum::{
    extract::{Query, State},
    response::Html,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::middleware::RequireShop;
use crate::models::ShopSession;
use crate::state::AppState;

/// Landing page template.
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub esdk: bool,
}

/// Login page template.
#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub error_message: Option<&'static str>,
    pub default_shop: Option<String>,
}

/// Market analysis page.
#[derive(Template)]
#[template(path = "products/product_watch.html")]
pub struct ProductWatchTemplate {
    pub page: PageContext,
}

/// Stock sync page.
#[derive(Template)]
#[template(path = "products/product_sync.html")]
pub struct ProductSyncTemplate {
    pub page: PageContext,
}

/// Metafield settings page, shared by both features.
#[derive(Template)]
#[template(path = "products/product_metafields.html")]
pub struct ProductMetafieldsTemplate {
    pub page: PageContext,
}

/// The feature pages behind the auth guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Watch,
    WatchConfig,
    Sync,
    SyncConfig,
}

impl Page {
    /// Page title.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Watch => "Marktanalyse",
            Self::WatchConfig => "Marktanalyse - Einstellungen",
            Self::Sync => "Bestandssyncro",
            Self::SyncConfig => "Bestandssyncro - Einstellungen",
        }
    }

    /// Target of the page's back/settings link.
    #[must_use]
    pub const fn back_url(self) -> &'static str {
        match self {
            Self::Watch => "/products/watch/config",
            Self::WatchConfig => "/products/watch",
            Self::Sync => "/products/sync/config",
            Self::SyncConfig => "/products/sync",
        }
    }

    /// Render the page with `context`.
    ///
    /// # Errors
    ///
    /// Returns an error if the template fails to render.
    pub fn render(self, page: PageContext) -> askama::Result<String> {
        match self {
            Self::Watch => ProductWatchTemplate { page }.render(),
            Self::Sync => ProductSyncTemplate { page }.render(),
            Self::WatchConfig | Self::SyncConfig => ProductMetafieldsTemplate { page }.render(),
        }
    }
}

/// Values every feature page renders.
#[derive(Debug, Clone)]
pub struct PageContext {
    pub esdk: bool,
    pub api_key: String,
    pub shop_url: String,
    pub title: String,
    pub back_url: String,
    pub namespace: String,
    /// [`EmbeddedConfig`] as JSON, safe to place inside a `<script>` element.
    pub config_json: String,
}

/// The JSON block the page scripts read their settings from.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbeddedConfig<'a> {
    esdk: bool,
    api_key: &'a str,
    shop_url: &'a str,
    title: &'a str,
    back_url: &'a str,
    namespace: &'a str,
}

impl PageContext {
    /// Build the context for `page`.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded config cannot be serialized.
    pub fn new(state: &AppState, shop: Option<&ShopSession>, page: Page) -> Result<Self> {
        let config = state.config();
        let namespace = match page {
            Page::Watch | Page::WatchConfig => &config.shopify.namespaces.watch,
            Page::Sync | Page::SyncConfig => &config.shopify.namespaces.sync,
        };
        let shop_url = shop
            .map(|s| s.shop.to_string())
            .or_else(|| config.shopify.default_shop.as_ref().map(ToString::to_string))
            .unwrap_or_default();

        let embedded = EmbeddedConfig {
            esdk: config.embedded_sdk,
            api_key: state.shopify().api_key(),
            shop_url: &shop_url,
            title: page.title(),
            back_url: page.back_url(),
            namespace: namespace.as_str(),
        };
        let config_json = script_safe_json(&embedded)
            .map_err(|e| AppError::Internal(format!("Failed to serialize page config: {e}")))?;

        Ok(Self {
            esdk: config.embedded_sdk,
            api_key: state.shopify().api_key().to_string(),
            title: page.title().to_string(),
            back_url: page.back_url().to_string(),
            namespace: namespace.to_string(),
            shop_url,
            config_json,
        })
    }
}

/// Serialize `value` so it cannot terminate the surrounding `<script>`.
fn script_safe_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    Ok(serde_json::to_string(value)?
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026"))
}

/// Render a feature page for the authenticated shop.
#[tracing::instrument(skip(state, shop), fields(shop = %shop.shop))]
async fn feature_page(state: &AppState, shop: &ShopSession, page: Page) -> Result<Html<String>> {
    let context = PageContext::new(state, Some(shop), page)?;
    Ok(Html(page.render(context)?))
}

/// GET /
pub async fn index(State(state): State<AppState>) -> Result<Html<String>> {
    let template = IndexTemplate {
        esdk: state.config().embedded_sdk,
    };
    Ok(Html(template.render()?))
}

/// Query parameters of the login page.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub error: Option<String>,
}

/// GET /login
pub async fn login(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
) -> Result<Html<String>> {
    let template = LoginTemplate {
        error_message: query.error.as_deref().map(error_message),
        default_shop: state
            .config()
            .shopify
            .default_shop
            .as_ref()
            .map(|s| s.handle().to_string()),
    };
    Ok(Html(template.render()?))
}

/// Human-readable message for a login error code.
fn error_message(code: &str) -> &'static str {
    match code {
        "access_denied" => "Die Installation wurde abgelehnt.",
        "invalid_hmac" | "invalid_state" | "shop_mismatch" => {
            "Die Anmeldung konnte nicht bestätigt werden. Bitte erneut versuchen."
        }
        "invalid_shop" => "Ungültige Shop-Adresse.",
        "missing_shop" => "Bitte eine Shop-Adresse angeben.",
        "token_exchange" => "Shopify hat die Anmeldung nicht bestätigt. Bitte erneut versuchen.",
        "login_required" => "Bitte zuerst anmelden.",
        _ => "Die Anmeldung ist fehlgeschlagen. Bitte erneut versuchen.",
    }
}

/// GET /products/watch
pub async fn watch(
    State(state): State<AppState>,
    RequireShop(shop): RequireShop,
) -> Result<Html<String>> {
    feature_page(&state, &shop, Page::Watch).await
}

/// GET /products/watch/config
pub async fn watch_config(
    State(state): State<AppState>,
    RequireShop(shop): RequireShop,
) -> Result<Html<String>> {
    feature_page(&state, &shop, Page::WatchConfig).await
}

/// GET /products/sync
pub async fn sync(
    State(state): State<AppState>,
    RequireShop(shop): RequireShop,
) -> Result<Html<String>> {
    feature_page(&state, &shop, Page::Sync).await
}

/// GET /products/sync/config
pub async fn sync_config(
    State(state): State<AppState>,
    RequireShop(shop): RequireShop,
) -> Result<Html<String>> {
    feature_page(&state, &shop, Page::SyncConfig).await
}
