//! Admin REST pass-through.

#![allow(clippy::unwrap_used)]

use std::sync::atomic::Ordering;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header::CONTENT_TYPE},
};
use mockito::Matcher;
use playmakers_integration_tests::{
    TOKEN, TestApp, body_string, development_config, hanging_upstream, test_config,
};

#[tokio::test]
async fn test_list_products_forwards_token_and_query() {
    let mut server = mockito::Server::new_async().await;
    let mut app = TestApp::new(test_config(&server.url()));
    app.login(&mut server).await;

    let upstream = server
        .mock("GET", "/admin/api/2025-01/products.json")
        .match_header("x-shopify-access-token", TOKEN)
        .match_query(Matcher::UrlEncoded("limit".into(), "5".into()))
        .with_status(200)
        .with_header("content-type", "application/json; charset=utf-8")
        .with_header("link", r#"<https://x/products.json?page_info=abc>; rel="next""#)
        .with_body(r#"{"products":[{"id":1,"title":"Ball"}]}"#)
        .expect(1)
        .create_async()
        .await;

    let response = app.get("/shopify/products.json?limit=5").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json; charset=utf-8"
    );
    assert!(response.headers().contains_key("link"));
    assert_eq!(
        body_string(response).await,
        r#"{"products":[{"id":1,"title":"Ball"}]}"#
    );
    upstream.assert_async().await;
}

#[tokio::test]
async fn test_upstream_404_is_relayed_without_retry() {
    let mut server = mockito::Server::new_async().await;
    let mut app = TestApp::new(test_config(&server.url()));
    app.login(&mut server).await;

    let upstream = server
        .mock("GET", "/admin/api/2025-01/products/999/metafields.json")
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(r#"{"errors":"Not Found"}"#)
        .expect(1)
        .create_async()
        .await;

    let response = app.get("/shopify/products/999/metafields.json").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_string(response).await, r#"{"errors":"Not Found"}"#);
    upstream.assert_async().await;
}

#[tokio::test]
async fn test_post_body_is_forwarded_verbatim() {
    let mut server = mockito::Server::new_async().await;
    let mut app = TestApp::new(test_config(&server.url()));
    app.login(&mut server).await;

    let upstream = server
        .mock("POST", "/admin/api/2025-01/custom_resource.json")
        .match_header("x-shopify-access-token", TOKEN)
        .match_body(r#"{"value":1}"#)
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"custom_resource":{"id":7,"value":1}}"#)
        .expect(1)
        .create_async()
        .await;

    let response = app
        .send_json(Method::POST, "/shopify/custom_resource.json", r#"{"value":1}"#)
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        body_string(response).await,
        r#"{"custom_resource":{"id":7,"value":1}}"#
    );
    upstream.assert_async().await;
}

#[tokio::test]
async fn test_write_verbs_on_shortcut_routes_reach_shopify() {
    let mut server = mockito::Server::new_async().await;
    let mut app = TestApp::new(test_config(&server.url()));
    app.login(&mut server).await;

    let create = server
        .mock("POST", "/admin/api/2025-01/products/42/metafields.json")
        .match_body(r#"{"metafield":{"key":"source"}}"#)
        .with_status(201)
        .expect(1)
        .create_async()
        .await;
    let delete = server
        .mock("DELETE", "/admin/api/2025-01/products/42/metafields/9.json")
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let response = app
        .send_json(
            Method::POST,
            "/shopify/products/42/metafields.json",
            r#"{"metafield":{"key":"source"}}"#,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .send_json(Method::DELETE, "/shopify/products/42/metafields/9.json", "")
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    create.assert_async().await;
    delete.assert_async().await;
}

#[tokio::test]
async fn test_patch_is_sent_as_put() {
    let mut server = mockito::Server::new_async().await;
    let mut app = TestApp::new(test_config(&server.url()));
    app.login(&mut server).await;

    let upstream = server
        .mock("PUT", "/admin/api/2025-01/products/1.json")
        .match_body(r#"{"product":{"id":1,"title":"Neu"}}"#)
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let response = app
        .send_json(
            Method::PATCH,
            "/shopify/products/1.json",
            r#"{"product":{"id":1,"title":"Neu"}}"#,
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    upstream.assert_async().await;
}

#[tokio::test]
async fn test_invalid_json_body_is_rejected() {
    let mut server = mockito::Server::new_async().await;
    let mut app = TestApp::new(test_config(&server.url()));
    app.login(&mut server).await;

    let upstream = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let response = app
        .send_json(Method::POST, "/shopify/custom_resource.json", "{not json")
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    upstream.assert_async().await;
}

#[tokio::test]
async fn test_malformed_resource_paths_are_not_found() {
    let mut server = mockito::Server::new_async().await;
    let mut app = TestApp::new(test_config(&server.url()));
    app.login(&mut server).await;

    let upstream = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    for path in [
        "/shopify/products",
        "/shopify/products.xml.json",
        "/shopify/products/..%2F..%2Foauth.json",
        "/shopify/products//1.json",
    ] {
        let response = app.get(path).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");
    }

    upstream.assert_async().await;
}

#[tokio::test]
async fn test_unreachable_shopify_is_bad_gateway() {
    // Nothing listens on port 1
    let mut app = TestApp::new(development_config("http://127.0.0.1:1"));

    let response = app.get("/shopify/products.json").await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_string(response).await, "External service error");
}

#[tokio::test]
async fn test_body_without_json_content_type_is_rejected() {
    let mut server = mockito::Server::new_async().await;
    let mut app = TestApp::new(test_config(&server.url()));
    app.login(&mut server).await;

    let upstream = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    // A cross-site form or fetch can send these without a CORS preflight
    for content_type in [
        Some("text/plain"),
        Some("application/x-www-form-urlencoded"),
        None,
    ] {
        let mut request = Request::builder()
            .method(Method::POST)
            .uri("/shopify/products.json");
        if let Some(content_type) = content_type {
            request = request.header(CONTENT_TYPE, content_type);
        }
        let request = request
            .body(Body::from(r#"{"product":{"title":"Fremd"}}"#))
            .unwrap();

        let response = app.send(request).await;
        assert_eq!(
            response.status(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "{content_type:?}"
        );
    }

    upstream.assert_async().await;
}

#[tokio::test]
async fn test_json_content_type_with_charset_is_forwarded() {
    let mut server = mockito::Server::new_async().await;
    let mut app = TestApp::new(test_config(&server.url()));
    app.login(&mut server).await;

    let upstream = server
        .mock("POST", "/admin/api/2025-01/products.json")
        .match_body(r#"{"product":{"title":"Ball"}}"#)
        .with_status(201)
        .expect(1)
        .create_async()
        .await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/shopify/products.json")
        .header(CONTENT_TYPE, "application/json; charset=utf-8")
        .body(Body::from(r#"{"product":{"title":"Ball"}}"#))
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    upstream.assert_async().await;
}

#[tokio::test]
async fn test_timed_out_get_is_retried_once_then_gateway_timeout() {
    let (origin, attempts) = hanging_upstream().await;
    let mut config = development_config(&origin);
    config.shopify.request_timeout = Duration::from_millis(300);
    let mut app = TestApp::new(config);

    let response = app.get("/shopify/products.json").await;

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_timed_out_post_is_not_retried() {
    let (origin, attempts) = hanging_upstream().await;
    let mut config = development_config(&origin);
    config.shopify.request_timeout = Duration::from_millis(300);
    let mut app = TestApp::new(config);

    let response = app
        .send_json(Method::POST, "/shopify/custom_resource.json", r#"{"value":1}"#)
        .await;

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}
