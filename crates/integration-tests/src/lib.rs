//! Integration test harness for the Playmakers app.
//!
//! Drives the real router in-process with `tower::ServiceExt::oneshot`,
//! keeps the session cookie between requests like a browser would, and
//! points every Shopify call at a `mockito` server.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p playmakers-integration-tests
//! ```

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{
        Method, Request, Response, StatusCode,
        header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
    },
};
use hmac::{Hmac, Mac};
use playmakers_app::config::{AppConfig, Environment, Namespaces, ShopifyConfig};
use playmakers_app::state::AppState;
use playmakers_core::{AccessToken, ShopDomain};
use secrecy::SecretString;
use sha2::Sha256;
use tower::ServiceExt;
use tower_sessions::MemoryStore;
use url::Url;

/// App API key used by every test config.
pub const API_KEY: &str = "test-api-key";

/// Shared secret the callback HMAC is keyed with.
pub const API_SECRET: &str = "Zq8vN2xLk4Rt7Wm1Pb6Yc3Hd9Fs5Jg0A";

/// Shop every test installs into.
pub const SHOP: &str = "playmakers-test.myshopify.com";

/// Access token the mocked exchange returns.
pub const TOKEN: &str = "shpat_0123456789abcdef";

/// Test configuration pointing all upstream calls at `api_origin`.
#[must_use]
pub fn test_config(api_origin: &str) -> AppConfig {
    AppConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        environment: Environment::Production,
        embedded_sdk: false,
        session_secret: SecretString::from("kT4wQ9zR2mX7vB1nC8jL5hF3gD6sA0pY".to_string()),
        database_url: None,
        static_dir: PathBuf::from("public"),
        shopify: ShopifyConfig {
            api_key: API_KEY.to_string(),
            api_secret: SecretString::from(API_SECRET.to_string()),
            scopes: vec!["read_products".to_string(), "write_products".to_string()],
            redirect_uri: "http://localhost:3000/auth_token".to_string(),
            default_shop: None,
            default_access_token: None,
            api_version: "2025-01".to_string(),
            api_origin: Some(Url::parse(api_origin).unwrap()),
            request_timeout: Duration::from_secs(2),
            namespaces: Namespaces::default(),
        },
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// Configuration for development mode seeded with [`SHOP`] / [`TOKEN`].
#[must_use]
pub fn development_config(api_origin: &str) -> AppConfig {
    let mut config = test_config(api_origin);
    config.environment = Environment::Development;
    config.shopify.default_shop = Some(ShopDomain::parse(SHOP).unwrap());
    config.shopify.default_access_token = Some(AccessToken::from(TOKEN));
    config
}

/// HMAC-sign `pairs` the way Shopify signs an OAuth callback and return the
/// full query string including `hmac`.
#[must_use]
pub fn signed_query(pairs: &[(&str, &str)]) -> String {
    let mut sorted: Vec<_> = pairs.to_vec();
    sorted.sort_unstable();
    let message = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut mac = Hmac::<Sha256>::new_from_slice(API_SECRET.as_bytes()).unwrap();
    mac.update(message.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    let mut query = url::form_urlencoded::Serializer::new(String::new());
    for (k, v) in pairs {
        query.append_pair(k, v);
    }
    query.append_pair("hmac", &signature);
    query.finish()
}

/// An in-process app plus a one-cookie jar.
pub struct TestApp {
    router: Router,
    cookie: Option<String>,
}

impl TestApp {
    /// Build the app with an in-memory session store.
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        let state = AppState::new(config).unwrap();
        Self {
            router: playmakers_app::app(state, MemoryStore::default()),
            cookie: None,
        }
    }

    /// Send `request`, attaching and updating the session cookie.
    pub async fn send(&mut self, mut request: Request<Body>) -> Response<Body> {
        if let Some(cookie) = &self.cookie {
            request
                .headers_mut()
                .insert(COOKIE, cookie.parse().unwrap());
        }

        let response = self.router.clone().oneshot(request).await.unwrap();

        if let Some(set_cookie) = response.headers().get(SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            self.cookie = Some(pair.to_string());
        }

        response
    }

    /// GET `uri`.
    pub async fn get(&mut self, uri: &str) -> Response<Body> {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    /// Send `method` to `uri` with a JSON `body`.
    pub async fn send_json(&mut self, method: Method, uri: &str, body: &str) -> Response<Body> {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Start the OAuth flow for [`SHOP`] and return the issued `state`.
    pub async fn start_auth(&mut self) -> String {
        let response = self.get(&format!("/auth?shop={SHOP}")).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let authorize = Url::parse(location(&response)).unwrap();
        authorize
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .unwrap()
    }

    /// Complete a full install against `server`, leaving the session logged in.
    pub async fn login(&mut self, server: &mut mockito::ServerGuard) {
        let exchange = mock_token_exchange(server).await;
        let state = self.start_auth().await;

        let query = signed_query(&[
            ("code", "auth-code"),
            ("shop", SHOP),
            ("state", &state),
            ("timestamp", "1700000000"),
        ]);
        let response = self.get(&format!("/auth_token?{query}")).await;

        assert_eq!(location(&response), "/");
        exchange.assert_async().await;
    }
}

/// Mock a successful `/admin/oauth/access_token` exchange.
pub async fn mock_token_exchange(server: &mut mockito::ServerGuard) -> mockito::Mock {
    server
        .mock("POST", "/admin/oauth/access_token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            serde_json::json!({ "access_token": TOKEN, "scope": "read_products,write_products" })
                .to_string(),
        )
        .expect(1)
        .create_async()
        .await
}

/// An upstream that accepts connections and never answers.
///
/// Returns its origin and a counter of accepted connections, one per
/// attempt the client makes.
pub async fn hanging_upstream() -> (String, Arc<AtomicUsize>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&accepted);
    tokio::spawn(async move {
        // Held open so the client waits for its own timeout
        let mut open = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            open.push(stream);
        }
    });

    (format!("http://{addr}"), accepted)
}

/// The `Location` header of a redirect.
#[must_use]
pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

/// Collect the response body as a string.
pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
