//! Request logging for the API surface, enabled with `api.enable_logging`.
//!
//! Each request produces one structured `api_request` event; 401 and 403
//! answers additionally produce an `access_denied` warning.

use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use std::time::Instant;
use tracing::{info, warn};

use super::request_id::REQUEST_ID_HEADER;

/// One logged API request
#[derive(Debug, Clone, Serialize)]
pub struct RequestLogEntry {
    pub request_id: Option<String>,
    pub method: String,
    pub path: String,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    pub status_code: u16,
    pub duration_ms: u64,
    pub action_category: ActionCategory,
    pub resource_id: Option<i32>,
}

/// Categories of logged actions
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionCategory {
    Authentication,
    DataRead,
    DataWrite,
    DataDelete,
    System,
}

pub async fn request_logging_middleware(
    State(enabled): State<bool>,
    req: Request,
    next: Next,
) -> Response {
    if !enabled {
        return next.run(req).await;
    }

    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let request_id = header_string(&req, REQUEST_ID_HEADER);
    let client_ip = header_string(&req, "x-forwarded-for")
        .map(|raw| raw.split(',').next().unwrap_or_default().trim().to_string())
        .or_else(|| header_string(&req, "x-real-ip"));
    let user_agent = header_string(&req, "user-agent");

    let response = next.run(req).await;

    let entry = RequestLogEntry {
        request_id,
        method: method.to_string(),
        action_category: categorize_action(&method, &path),
        resource_id: extract_customer_id(&path),
        path,
        client_ip,
        user_agent,
        status_code: response.status().as_u16(),
        duration_ms: start.elapsed().as_millis() as u64,
    };

    info!(
        request_id = ?entry.request_id,
        method = %entry.method,
        path = %entry.path,
        client_ip = ?entry.client_ip,
        user_agent = ?entry.user_agent,
        status_code = entry.status_code,
        duration_ms = entry.duration_ms,
        action_category = ?entry.action_category,
        resource_id = ?entry.resource_id,
        "api_request"
    );

    if entry.status_code == 401 || entry.status_code == 403 {
        warn!(
            request_id = ?entry.request_id,
            path = %entry.path,
            client_ip = ?entry.client_ip,
            status_code = entry.status_code,
            "access_denied"
        );
    }

    response
}

fn header_string(req: &Request, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

fn categorize_action(method: &Method, path: &str) -> ActionCategory {
    if path.ends_with("/token") {
        return ActionCategory::Authentication;
    }
    if path.starts_with("/health") || path.starts_with("/swagger-ui") {
        return ActionCategory::System;
    }

    match *method {
        Method::GET | Method::HEAD => ActionCategory::DataRead,
        Method::POST | Method::PUT | Method::PATCH => ActionCategory::DataWrite,
        Method::DELETE => ActionCategory::DataDelete,
        _ => ActionCategory::System,
    }
}

/// `/api/customers/{id}` -> `Some(id)`
fn extract_customer_id(path: &str) -> Option<i32> {
    let mut parts = path.split('/').filter(|s| !s.is_empty());
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some("api"), Some("customers"), Some(id), None) => id.parse().ok(),
        _ => None,
    }
}
