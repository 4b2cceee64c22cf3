use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use validator::{ValidationErrors, ValidationErrorsKind};

fn current_request_id() -> Option<String> {
    crate::tracing::current_request_id().map(|rid| rid.as_str().to_string())
}

/// Field name to list of messages, ordered for stable output.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Body of every error response: `{"errors": {"<key>": ["<message>"]}}`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "errors": { "limit": ["Invalid limit parameter"] },
    "request_id": "0b5e1c3a-8f7e-4a59-9b5e-5a1f0f3c2d11"
}))]
pub struct ErrorsRootObject {
    pub errors: FieldErrors,
    /// Request identifier echoed from `x-request-id`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ErrorsRootObject {
    pub fn new(errors: FieldErrors) -> Self {
        Self {
            errors,
            request_id: current_request_id(),
        }
    }

    pub fn single(key: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(key.into(), vec![message.into()]);
        Self::new(errors)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::error::DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Hash error: {0}")]
    HashError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::SerializationError(err.to_string())
    }
}

impl ServiceError {
    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::DatabaseError(_)
            | Self::HashError(_)
            | Self::SerializationError(_)
            | Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Key used in the `errors` object of the response body.
    pub fn error_key(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::ValidationError(_) => "validation",
            Self::BadRequest(_) => "bad_request",
            Self::Conflict(_) => "conflict",
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::DatabaseError(_)
            | Self::HashError(_)
            | Self::SerializationError(_)
            | Self::InternalError(_) => "internal_server_error",
        }
    }

    /// Returns the error message suitable for HTTP responses.
    /// Internal errors return generic messages to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::HashError(_) | Self::SerializationError(_) | Self::InternalError(_) => {
                "Internal server error".to_string()
            }
            Self::NotFound(msg)
            | Self::ValidationError(msg)
            | Self::BadRequest(msg)
            | Self::Conflict(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorsRootObject::single(self.error_key(), self.response_message());
        (status, Json(body)).into_response()
    }
}

/// Errors returned by the HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Service error: {0}")]
    ServiceError(#[from] ServiceError),

    /// A single keyed error with an explicit status.
    #[error("{key}: {message}")]
    Field {
        status: StatusCode,
        key: String,
        message: String,
    },

    /// Per-field validation failures, answered with 422.
    #[error("Validation failed for {} field(s)", .0.len())]
    Validation(FieldErrors),
}

impl ApiError {
    pub fn field(status: StatusCode, key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Field {
            status,
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn bad_request(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::field(StatusCode::BAD_REQUEST, key, message)
    }

    pub fn not_found(key: impl Into<String>) -> Self {
        Self::field(StatusCode::NOT_FOUND, key, "not found")
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ServiceError(err) => err.status_code(),
            ApiError::Field { status, .. } => *status,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        flatten_validation_errors(&errors, None, &mut fields);
        ApiError::Validation(fields)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::ServiceError(err) => err.into_response(),
            ApiError::Field {
                status,
                key,
                message,
            } => (status, Json(ErrorsRootObject::single(key, message))).into_response(),
            ApiError::Validation(fields) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ErrorsRootObject::new(fields)),
            )
                .into_response(),
        }
    }
}

/// Flattens nested validator output into dotted field paths
/// (`billing_address.email`, `addresses[1].city`).
pub fn flatten_validation_errors(
    errors: &ValidationErrors,
    prefix: Option<&str>,
    out: &mut FieldErrors,
) {
    for (field, kind) in errors.errors() {
        let path = match prefix {
            Some(prefix) => format!("{prefix}.{field}"),
            None => field.to_string(),
        };
        match kind {
            ValidationErrorsKind::Field(items) => {
                let messages = out.entry(path).or_default();
                for item in items {
                    let message = item
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid ({})", field, item.code));
                    messages.push(message);
                }
            }
            ValidationErrorsKind::Struct(nested) => {
                flatten_validation_errors(nested, Some(&path), out);
            }
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    flatten_validation_errors(nested, Some(&format!("{path}[{index}]")), out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn service_error_response_includes_request_id() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("req-123"), async {
                ServiceError::NotFound("missing".into()).into_response()
            })
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let payload: ErrorsRootObject = serde_json::from_slice(&body).unwrap();
        assert_eq!(payload.request_id.as_deref(), Some("req-123"));
        assert_eq!(payload.errors["not_found"], vec!["missing".to_string()]);
    }

    #[tokio::test]
    async fn field_error_uses_given_key_and_status() {
        let response = ApiError::bad_request("limit", "Invalid limit parameter").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let payload: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            payload,
            serde_json::json!({"errors": {"limit": ["Invalid limit parameter"]}})
        );
    }

    #[test]
    fn service_error_status_code_mapping() {
        assert_eq!(
            ServiceError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::ValidationError("x".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ServiceError::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ServiceError::Forbidden("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ServiceError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::InternalError("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn service_error_response_message_hides_internal_details() {
        assert_eq!(
            ServiceError::HashError("sensitive".into()).response_message(),
            "Internal server error"
        );
        assert_eq!(
            ServiceError::DatabaseError(sea_orm::DbErr::Custom("table missing".into()))
                .response_message(),
            "Database error"
        );
        assert_eq!(
            ServiceError::NotFound("customer not found".into()).response_message(),
            "customer not found"
        );
    }
}
