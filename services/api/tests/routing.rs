mod support;

use axum::http::{Method, StatusCode};
use serde_json::json;

use support::TestApp;

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "service": "grocery-api"}));
}

#[tokio::test]
async fn test_unknown_route_is_not_implemented() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/unknown", None).await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    assert_eq!(body, json!({"error": "Not implemented"}));

    let (status, _) = app.regular(Method::GET, "/shops/products/extra", None).await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
}

#[tokio::test]
async fn test_unsupported_method_is_not_implemented() {
    let app = TestApp::new().await;

    let (status, body) = app.send(Method::PUT, "/account", None, None).await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    assert_eq!(body["error"], "Not implemented");

    let (status, _) = app.send(Method::GET, "/login", None, None).await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);

    for uri in ["/account", "/receipts", "/shops", "/products"] {
        let (status, body) = app.send(Method::PUT, uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_IMPLEMENTED, "anonymous PUT {uri}");
        assert_eq!(body["error"], "Not implemented");

        let (status, _) = app.regular(Method::PUT, uri, None).await;
        assert_eq!(status, StatusCode::NOT_IMPLEMENTED, "regular PUT {uri}");
    }

    let (status, _) = app.regular(Method::PATCH, "/receipts", None).await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    let (status, _) = app
        .regular(Method::POST, &format!("/receipts/{}", app.receipts[0].id), None)
        .await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    assert_eq!(app.store.receipt_count().await, 3);
}

#[tokio::test]
async fn test_supported_admin_method_still_checks_role() {
    let app = TestApp::new().await;

    let (status, body) = app
        .regular(Method::DELETE, "/receipts?shop=Alcampo", None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Role not valid");

    let (status, body) = app.send(Method::DELETE, "/shops?name=Alcampo", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Please authenticate");
    assert_eq!(app.store.receipt_count().await, 3);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = TestApp::new().await;

    for uri in ["/account", "/products-all", "/shops-all", "/receipts"] {
        let (status, body) = app.get(uri, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["error"], "Please authenticate");
    }
}

#[tokio::test]
async fn test_invalid_token_is_rejected() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/account", Some("not-a-token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Please authenticate");

    let foreign = grocery_api::jwt::JwtService::new(grocery_api::jwt::JwtConfig {
        secret: "some-other-secret".to_string(),
        access_token_expiry: 7200,
    })
    .generate_access_token("adminuser")
    .unwrap();
    let (status, _) = app.get("/account", Some(&foreign)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes_check_token_before_role() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(Method::DELETE, "/products?barcode=712345760891", None, None)
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Please authenticate");
    assert_eq!(app.store.receipt_count().await, 3);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = TestApp::new().await;

    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/login")
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let response = tower::ServiceExt::oneshot(app.router.clone(), request)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
