//! Customer API library
//!
//! REST endpoints for customer records backed by sea-orm, with JWT client
//! authentication and field-filtered JSON output.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod dto;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod json;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    routing::get,
    Router,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::auth::{AuthRouterExt, AuthService};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
    pub auth: Arc<AuthService>,
}

impl AppState {
    /// Wires services and the auth service around an open connection.
    pub fn new(db: Arc<DatabaseConnection>, config: config::AppConfig) -> Self {
        let services = handlers::AppServices::new(db.clone(), &config);
        let auth = Arc::new(AuthService::new(
            auth::AuthConfig::from_app_config(&config),
            db.clone(),
        ));
        Self {
            db,
            config,
            services,
            auth,
        }
    }
}

/// `/api` routes: token issuance plus the customer controller behind
/// authentication and the restricted-client filter.
pub fn api_routes(state: &AppState) -> Router<AppState> {
    let customers = handlers::customers::customers_routes()
        .with_client_restrictions(state.services.clients.clone());

    Router::new()
        .merge(auth::auth_routes().with_state(state.auth.clone()))
        .merge(customers)
        .layer(middleware::from_fn_with_state(
            state.config.api.enable_api,
            auth::api_enabled_middleware,
        ))
}

/// The complete application router, state applied.
pub fn build_router(state: AppState) -> Router {
    let mut app = Router::<AppState>::new()
        .route("/", get(|| async { "customer-api up" }))
        .nest("/health", handlers::health::health_routes())
        .nest("/api", api_routes(&state));

    if state.config.api.allow_requests_from_swagger {
        app = app.merge(openapi::swagger_ui());
    }

    app
        // HTTP tracing layer for consistent request/response telemetry
        .layer(tracing::configure_http_tracing())
        .layer(middleware::from_fn_with_state(
            state.config.api.enable_logging,
            middleware_helpers::request_logging_middleware,
        ))
        // Inject AuthService into request extensions for auth middleware
        .layer(middleware::from_fn_with_state(
            state.auth.clone(),
            inject_auth_service,
        ))
        // Ensure every request carries a request id for traceability
        .layer(middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}

async fn inject_auth_service(
    State(auth): State<Arc<AuthService>>,
    mut req: Request,
    next: Next,
) -> axum::response::Response {
    req.extensions_mut().insert(auth);
    next.run(req).await
}
