//! OAuth install flow: `/auth` and the `/auth_token` callback.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use playmakers_integration_tests::{
    API_KEY, SHOP, TestApp, location, mock_token_exchange, signed_query, test_config,
};
use url::Url;

#[tokio::test]
async fn test_start_auth_redirects_to_shopify_consent() {
    let server = mockito::Server::new_async().await;
    let mut app = TestApp::new(test_config(&server.url()));

    let response = app.get(&format!("/auth?shop={SHOP}")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let url = Url::parse(location(&response)).unwrap();
    assert_eq!(url.host_str(), Some(SHOP));
    assert_eq!(url.path(), "/admin/oauth/authorize");

    let param = |name: &str| {
        url.query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    };
    assert_eq!(param("client_id").as_deref(), Some(API_KEY));
    assert_eq!(
        param("scope").as_deref(),
        Some("read_products,write_products")
    );
    assert_eq!(
        param("redirect_uri").as_deref(),
        Some("http://localhost:3000/auth_token")
    );
    assert_eq!(param("state").unwrap().len(), 32);
}

#[tokio::test]
async fn test_start_auth_accepts_bare_handle() {
    let server = mockito::Server::new_async().await;
    let mut app = TestApp::new(test_config(&server.url()));

    let response = app.get("/auth?shop=playmakers-test").await;
    let url = Url::parse(location(&response)).unwrap();
    assert_eq!(url.host_str(), Some(SHOP));
}

#[tokio::test]
async fn test_start_auth_without_shop_goes_to_login() {
    let server = mockito::Server::new_async().await;
    let mut app = TestApp::new(test_config(&server.url()));

    let response = app.get("/auth").await;
    assert_eq!(location(&response), "/login?error=missing_shop");
}

#[tokio::test]
async fn test_start_auth_rejects_foreign_domain() {
    let server = mockito::Server::new_async().await;
    let mut app = TestApp::new(test_config(&server.url()));

    let response = app.get("/auth?shop=evil.example.com").await;
    assert_eq!(location(&response), "/login?error=invalid_shop");
}

#[tokio::test]
async fn test_successful_install_opens_protected_pages() {
    let mut server = mockito::Server::new_async().await;
    let mut app = TestApp::new(test_config(&server.url()));

    let response = app.get("/products/watch").await;
    assert_eq!(location(&response), "/login?error=login_required");

    app.login(&mut server).await;

    let response = app.get("/products/watch").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_state_mismatch_is_rejected_without_exchange() {
    let mut server = mockito::Server::new_async().await;
    let exchange = server
        .mock("POST", "/admin/oauth/access_token")
        .expect(0)
        .create_async()
        .await;
    let mut app = TestApp::new(test_config(&server.url()));

    let _state = app.start_auth().await;
    let query = signed_query(&[
        ("code", "auth-code"),
        ("shop", SHOP),
        ("state", "not-the-issued-state"),
        ("timestamp", "1700000000"),
    ]);
    let response = app.get(&format!("/auth_token?{query}")).await;

    assert_eq!(location(&response), "/login?error=invalid_state");
    exchange.assert_async().await;

    let response = app.get("/products/watch").await;
    assert_eq!(location(&response), "/login?error=login_required");
}

#[tokio::test]
async fn test_callback_without_started_flow_is_rejected() {
    let server = mockito::Server::new_async().await;
    let mut app = TestApp::new(test_config(&server.url()));

    let query = signed_query(&[
        ("code", "auth-code"),
        ("shop", SHOP),
        ("state", "anything"),
        ("timestamp", "1700000000"),
    ]);
    let response = app.get(&format!("/auth_token?{query}")).await;

    assert_eq!(location(&response), "/login?error=invalid_state");
}

#[tokio::test]
async fn test_state_is_single_use() {
    let mut server = mockito::Server::new_async().await;
    let mut app = TestApp::new(test_config(&server.url()));
    let exchange = mock_token_exchange(&mut server).await;

    let state = app.start_auth().await;
    let query = signed_query(&[
        ("code", "auth-code"),
        ("shop", SHOP),
        ("state", &state),
        ("timestamp", "1700000000"),
    ]);

    let response = app.get(&format!("/auth_token?{query}")).await;
    assert_eq!(location(&response), "/");

    let replay = app.get(&format!("/auth_token?{query}")).await;
    assert_eq!(location(&replay), "/login?error=invalid_state");
    exchange.assert_async().await;
}

#[tokio::test]
async fn test_tampered_callback_fails_hmac() {
    let server = mockito::Server::new_async().await;
    let mut app = TestApp::new(test_config(&server.url()));

    let state = app.start_auth().await;
    let query = signed_query(&[
        ("code", "auth-code"),
        ("shop", SHOP),
        ("state", &state),
        ("timestamp", "1700000000"),
    ])
    .replace("auth-code", "other-code");
    let response = app.get(&format!("/auth_token?{query}")).await;

    assert_eq!(location(&response), "/login?error=invalid_hmac");
}

#[tokio::test]
async fn test_callback_for_other_shop_is_rejected() {
    let server = mockito::Server::new_async().await;
    let mut app = TestApp::new(test_config(&server.url()));

    let state = app.start_auth().await;
    let query = signed_query(&[
        ("code", "auth-code"),
        ("shop", "someone-else.myshopify.com"),
        ("state", &state),
        ("timestamp", "1700000000"),
    ]);
    let response = app.get(&format!("/auth_token?{query}")).await;

    assert_eq!(location(&response), "/login?error=shop_mismatch");
}

#[tokio::test]
async fn test_denied_install_goes_to_login() {
    let server = mockito::Server::new_async().await;
    let mut app = TestApp::new(test_config(&server.url()));

    let _state = app.start_auth().await;
    let query = signed_query(&[
        ("error", "access_denied"),
        ("error_description", "declined"),
        ("shop", SHOP),
    ]);
    let response = app.get(&format!("/auth_token?{query}")).await;

    assert_eq!(location(&response), "/login?error=access_denied");
}

#[tokio::test]
async fn test_unsigned_denial_keeps_pending_flow() {
    let mut server = mockito::Server::new_async().await;
    let exchange = mock_token_exchange(&mut server).await;
    let mut app = TestApp::new(test_config(&server.url()));

    let state = app.start_auth().await;
    let response = app.get("/auth_token?error=access_denied").await;
    assert_eq!(location(&response), "/login?error=invalid_hmac");

    let query = signed_query(&[
        ("code", "auth-code"),
        ("shop", SHOP),
        ("state", &state),
        ("timestamp", "1700000000"),
    ]);
    let response = app.get(&format!("/auth_token?{query}")).await;

    assert_eq!(location(&response), "/");
    exchange.assert_async().await;
}

#[tokio::test]
async fn test_rejected_exchange_goes_to_login() {
    let mut server = mockito::Server::new_async().await;
    let exchange = server
        .mock("POST", "/admin/oauth/access_token")
        .with_status(400)
        .with_body(r#"{"error":"invalid_request"}"#)
        .expect(1)
        .create_async()
        .await;
    let mut app = TestApp::new(test_config(&server.url()));

    let state = app.start_auth().await;
    let query = signed_query(&[
        ("code", "expired-code"),
        ("shop", SHOP),
        ("state", &state),
        ("timestamp", "1700000000"),
    ]);
    let response = app.get(&format!("/auth_token?{query}")).await;

    assert_eq!(location(&response), "/login?error=token_exchange");
    exchange.assert_async().await;

    let response = app.get("/products/sync").await;
    assert_eq!(location(&response), "/login?error=login_required");
}
