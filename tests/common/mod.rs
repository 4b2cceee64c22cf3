#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use customer_api::{
    auth::{AuthConfig, AuthService, ClientService},
    config::AppConfig,
    db, AppState,
};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use tower::ServiceExt;

pub const JWT_SECRET: &str =
    "integration-test-secret-0123456789-abcdefghijklmnopqrstuvwxyz-ABCDEFGHIJ";

/// Helper harness for spinning up the router backed by an in-memory SQLite
/// database with one registered API client.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub client_id: String,
    pub client_secret: String,
    token: String,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|_, _| {}).await
    }

    /// `customize` receives the config and the registered client id before
    /// the router is built.
    pub async fn with_config(customize: impl FnOnce(&mut AppConfig, &str)) -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            JWT_SECRET.to_string(),
            3600,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");
        let db = Arc::new(pool);

        let registered = ClientService::new(db.clone(), Vec::new())
            .insert_client("integration tests")
            .await
            .expect("failed to register test client");

        customize(&mut cfg, &registered.client.client_id);

        let token = AuthService::new(AuthConfig::from_app_config(&cfg), db.clone())
            .issue_token(&registered.client)
            .expect("failed to issue test token")
            .access_token;

        let state = AppState::new(db, cfg);
        let router = customer_api::build_router(state.clone());

        Self {
            router,
            state,
            client_id: registered.client.client_id,
            client_secret: registered.client_secret,
            token,
        }
    }

    pub fn db(&self) -> Arc<DatabaseConnection> {
        self.state.db.clone()
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let body = body.map(|json| serde_json::to_vec(&json).expect("serializable body"));
        self.request_raw(method, uri, body, token).await
    }

    pub async fn request_raw(
        &self,
        method: Method,
        uri: &str,
        body: Option<Vec<u8>>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = match body {
            Some(bytes) => {
                builder = builder.header("content-type", "application/json");
                Body::from(bytes)
            }
            None => Body::empty(),
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Convenience helper for authenticated JSON requests.
    pub async fn request_authenticated(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        self.request(method, uri, body, Some(self.token())).await
    }

    /// Authenticated request; returns status and parsed JSON body.
    pub async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let response = self.request_authenticated(method, uri, body).await;
        let status = response.status();
        (status, response_json(response).await)
    }

    /// Creates a Registered customer and returns its DTO.
    pub async fn create_customer(&self, email: &str, extra: Value) -> Value {
        let mut customer = json!({ "email": email, "role_ids": [3] });
        if let (Some(target), Value::Object(fields)) = (customer.as_object_mut(), extra) {
            target.extend(fields);
        }
        let (status, body) = self
            .call(
                Method::POST,
                "/api/customers",
                Some(json!({ "customer": customer })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create failed: {body}");
        body["customers"][0].clone()
    }
}

pub async fn response_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).expect("response body is not JSON")
}
