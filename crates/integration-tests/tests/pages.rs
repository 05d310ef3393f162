//! Server-rendered pages.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use playmakers_integration_tests::{SHOP, TestApp, body_string, development_config, test_config};

#[tokio::test]
async fn test_watch_page_embeds_config_with_esdk() {
    let mut config = development_config("http://127.0.0.1:1");
    config.embedded_sdk = true;
    let mut app = TestApp::new(config);

    let response = app.get("/products/watch").await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_string(response).await;
    assert!(html.contains(r#""esdk":true"#));
    assert!(html.contains(r#""apiKey":"test-api-key""#));
    assert!(html.contains(&format!(r#""shopUrl":"{SHOP}""#)));
    assert!(html.contains(r#""title":"Marktanalyse""#));
    assert!(html.contains(r#""backUrl":"/products/watch/config""#));
    assert!(html.contains(r#""namespace":"playmakers-watch""#));
    assert!(html.contains("app-bridge.js"));
}

#[tokio::test]
async fn test_standalone_pages_skip_app_bridge() {
    let mut app = TestApp::new(development_config("http://127.0.0.1:1"));

    let html = body_string(app.get("/products/sync").await).await;
    assert!(html.contains(r#""esdk":false"#));
    assert!(html.contains(r#""namespace":"playmakers-sync""#));
    assert!(!html.contains("app-bridge.js"));
}

#[tokio::test]
async fn test_config_pages_link_back() {
    let mut app = TestApp::new(development_config("http://127.0.0.1:1"));

    let html = body_string(app.get("/products/sync/config").await).await;
    assert!(html.contains("Bestandssyncro - Einstellungen"));
    assert!(html.contains(r#""backUrl":"/products/sync""#));

    let html = body_string(app.get("/products/watch/config").await).await;
    assert!(html.contains("Marktanalyse - Einstellungen"));
    assert!(html.contains(r#""namespace":"playmakers-watch""#));
}

#[tokio::test]
async fn test_login_page_shows_error() {
    let mut app = TestApp::new(test_config("http://127.0.0.1:1"));

    let html = body_string(app.get("/login?error=missing_shop").await).await;
    assert!(html.contains("Bitte eine Shop-Adresse angeben."));

    let html = body_string(app.get("/login").await).await;
    assert!(!html.contains("role=\"alert\""));
}

#[tokio::test]
async fn test_guard_redirect_explains_login() {
    let mut app = TestApp::new(test_config("http://127.0.0.1:1"));

    let response = app.get("/products/watch").await;
    let target = playmakers_integration_tests::location(&response).to_string();
    assert_eq!(target, "/login?error=login_required");

    let html = body_string(app.get(&target).await).await;
    assert!(html.contains("Bitte zuerst anmelden."));
}
