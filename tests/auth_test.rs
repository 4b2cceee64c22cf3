mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use serde_json::json;

#[tokio::test]
async fn customer_routes_require_a_bearer_token() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/customers", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .request(Method::GET, "/api/customers", None, Some("not-a-jwt"))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let (status, _) = app.call(Method::GET, "/api/customers", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn token_endpoint_issues_working_tokens() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/token",
            Some(json!({ "client_id": app.client_id, "client_secret": app.client_secret })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["token_type"], "Bearer");
    assert!(body["expires_in"].as_i64().unwrap() > 0);

    let token = body["access_token"].as_str().unwrap();
    let response = app
        .request(Method::GET, "/api/customers/count", None, Some(token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn token_endpoint_rejects_bad_credentials() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/token",
            Some(json!({ "client_id": app.client_id, "client_secret": "wrong" })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .request(
            Method::POST,
            "/api/token",
            Some(json!({ "client_id": "unknown", "client_secret": app.client_secret })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .request(Method::POST, "/api/token", Some(json!({ "client_id": 5 })), None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn restricted_clients_are_forbidden() {
    let app = TestApp::with_config(|cfg, client_id| {
        cfg.api.restricted_client_ids = Some(format!("someone-else, {client_id}"));
    })
    .await;

    let (status, _) = app.call(Method::GET, "/api/customers", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // a token alone is not enough, but the token endpoint still answers
    let response = app
        .request(
            Method::POST,
            "/api/token",
            Some(json!({ "client_id": app.client_id, "client_secret": app.client_secret })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn disabled_api_refuses_everything_but_health() {
    let app = TestApp::with_config(|cfg, _| cfg.api.enable_api = false).await;

    let (status, _) = app.call(Method::GET, "/api/customers", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let response = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let app = TestApp::new().await;
    let response = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let response = app
        .request(Method::GET, "/api/customers/999", None, Some(app.token()))
        .await;
    let request_id = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .expect("request id header");
    let body = response_json(response).await;
    assert_eq!(body["request_id"], request_id.as_str());
}

#[tokio::test]
async fn swagger_ui_can_be_switched_off() {
    let app = TestApp::new().await;
    let response = app
        .request(Method::GET, "/api-docs/openapi.json", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let app = TestApp::with_config(|cfg, _| cfg.api.allow_requests_from_swagger = false).await;
    let response = app
        .request(Method::GET, "/api-docs/openapi.json", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
