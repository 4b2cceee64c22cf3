/*!
 * # Authentication and Authorization
 *
 * API clients exchange their credentials for a short-lived HS256 bearer
 * token at `POST /api/token`. Protected routes validate the token, expose
 * the caller as an [`AuthUser`] request extension and refuse clients listed
 * in `api.restricted_client_ids`.
 */

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tracing::{debug, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{config::AppConfig, entities::api_client, errors::ServiceError};

mod clients;

pub use clients::{hash_client_secret, ClientService, NewClient};

/// Claim structure for JWT tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,       // Subject (database id of the client)
    pub client_id: String, // Public client identifier
    pub jti: String,       // JWT ID
    pub iat: i64,          // Issued at
    pub exp: i64,          // Expiration
    pub nbf: i64,          // Not valid before
    pub iss: String,       // Issuer
    pub aud: String,       // Audience
}

/// Authenticated caller extracted from the bearer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub client_id: String,
    pub token_id: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            client_id: claims.client_id,
            token_id: claims.jti,
        }
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub access_token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(
        jwt_secret: String,
        jwt_issuer: String,
        jwt_audience: String,
        access_token_expiration: Duration,
    ) -> Self {
        Self {
            jwt_secret,
            jwt_issuer,
            jwt_audience,
            access_token_expiration,
        }
    }

    pub fn from_app_config(cfg: &AppConfig) -> Self {
        Self::new(
            cfg.jwt_secret.clone(),
            cfg.auth_issuer.clone(),
            cfg.auth_audience.clone(),
            Duration::from_secs(cfg.jwt_expiration as u64),
        )
    }
}

/// Issues and validates access tokens
#[derive(Debug, Clone)]
pub struct AuthService {
    pub config: AuthConfig,
    db: Arc<DatabaseConnection>,
}

impl AuthService {
    pub fn new(config: AuthConfig, db: Arc<DatabaseConnection>) -> Self {
        Self { config, db }
    }

    /// Checks client credentials. Unknown, disabled and mismatching clients
    /// all fail the same way.
    pub async fn authenticate_client(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<api_client::Model, AuthError> {
        let client = api_client::Entity::find()
            .filter(api_client::Column::ClientId.eq(client_id))
            .one(&*self.db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?
            .ok_or(AuthError::InvalidCredentials)?;

        if !client.enabled || client.client_secret_hash != hash_client_secret(client_secret) {
            debug!(client_id, "Client authentication rejected");
            return Err(AuthError::InvalidCredentials);
        }
        Ok(client)
    }

    /// Generate an access token for a client
    pub fn issue_token(&self, client: &api_client::Model) -> Result<TokenResponse, AuthError> {
        let now = Utc::now();
        let exp = now
            + ChronoDuration::from_std(self.config.access_token_expiration)
                .map_err(|_| AuthError::InternalError("Invalid token duration".to_string()))?;

        let claims = Claims {
            sub: client.id.to_string(),
            client_id: client.client_id.clone(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            nbf: now.timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        let access_token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))?;

        Ok(TokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.access_token_expiration.as_secs() as i64,
        })
    }

    /// Validate a JWT token and extract the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.config.jwt_issuer.as_str()]);
        validation.set_audience(&[self.config.jwt_audience.as_str()]);
        validation.validate_nbf = true;

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })
    }
}

/// Client credentials exchanged for a token
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenRequest {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    /// Lifetime in seconds
    pub expires_in: i64,
}

/// Authentication error types
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authentication")]
    MissingAuth,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error("Client is not allowed to use this API")]
    RestrictedClient,

    #[error("The API is disabled")]
    ApiDisabled,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingAuth => {
                ServiceError::Unauthorized("Authentication required".to_string())
            }
            AuthError::InvalidCredentials => {
                ServiceError::Unauthorized("Invalid client credentials".to_string())
            }
            AuthError::InvalidToken => {
                ServiceError::Unauthorized("Invalid authentication token".to_string())
            }
            AuthError::TokenExpired => ServiceError::Unauthorized("Token has expired".to_string()),
            AuthError::RestrictedClient => {
                ServiceError::Forbidden("Client is not allowed to use this API".to_string())
            }
            AuthError::ApiDisabled => ServiceError::Forbidden("The API is disabled".to_string()),
            AuthError::InvalidRequest(msg) => ServiceError::BadRequest(msg),
            AuthError::TokenCreation(msg) | AuthError::InternalError(msg) => {
                ServiceError::InternalError(msg)
            }
            AuthError::DatabaseError(msg) => ServiceError::InternalError(msg),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ServiceError::from(self).into_response()
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() {
        Some(token.trim())
    } else {
        None
    }
}

/// Authentication middleware that validates the bearer token and stores the
/// caller as an [`AuthUser`] extension. Expects `Arc<AuthService>` in the
/// request extensions.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let Some(auth_service) = request.extensions().get::<Arc<AuthService>>().cloned() else {
        return AuthError::InternalError("Authentication service not available".to_string())
            .into_response();
    };

    let user = match bearer_token(request.headers()) {
        Some(token) => auth_service.validate_token(token).map(AuthUser::from),
        None => Err(AuthError::MissingAuth),
    };

    match user {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => {
            debug!(error = %e, "Request rejected by authentication");
            e.into_response()
        }
    }
}

/// Refuses callers whose client id is on the restricted list
pub async fn restricted_client_middleware(
    State(clients): State<Arc<ClientService>>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or(AuthError::MissingAuth)?;

    if clients.user_has_restricted_access(user) {
        warn!(client_id = %user.client_id, "Restricted client refused");
        return Err(AuthError::RestrictedClient);
    }
    Ok(next.run(request).await)
}

/// Answers 403 for every request while `api.enable_api` is off
pub async fn api_enabled_middleware(
    State(enabled): State<bool>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    if !enabled {
        return Err(AuthError::ApiDisabled);
    }
    Ok(next.run(request).await)
}

/// Authentication routes
pub fn auth_routes() -> axum::Router<Arc<AuthService>> {
    axum::Router::new()
        .route("/token", axum::routing::post(token_handler))
        .layer(DefaultBodyLimit::max(1024 * 16))
}

/// Client credentials grant
#[utoipa::path(
    post,
    path = "/api/token",
    tag = "auth",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Malformed request", body = crate::errors::ErrorsRootObject),
        (status = 401, description = "Invalid client credentials", body = crate::errors::ErrorsRootObject),
    )
)]
pub async fn token_handler(
    State(auth_service): State<Arc<AuthService>>,
    payload: Result<Json<TokenRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, AuthError> {
    let Json(request) = payload.map_err(|e| AuthError::InvalidRequest(e.body_text()))?;
    let client = auth_service
        .authenticate_client(&request.client_id, &request.client_secret)
        .await?;
    Ok(Json(auth_service.issue_token(&client)?))
}

/// Extension methods for Router to add auth middleware
pub trait AuthRouterExt {
    fn with_auth(self) -> Self;
    fn with_client_restrictions(self, clients: Arc<ClientService>) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(auth_middleware))
    }

    fn with_client_restrictions(self, clients: Arc<ClientService>) -> Self {
        self.layer(axum::middleware::from_fn_with_state(
            clients,
            restricted_client_middleware,
        ))
        .with_auth()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use axum::http::{HeaderValue, StatusCode};

    const SECRET: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    fn service(db: Arc<DatabaseConnection>) -> AuthService {
        AuthService::new(
            AuthConfig::new(
                SECRET.to_string(),
                "customer-api".to_string(),
                "customer-api-clients".to_string(),
                Duration::from_secs(600),
            ),
            db,
        )
    }

    fn client() -> api_client::Model {
        api_client::Model {
            id: 7,
            client_id: "client-7".into(),
            client_secret_hash: hash_client_secret("s3cret"),
            name: "Test".into(),
            enabled: true,
            created_on_utc: Utc::now(),
        }
    }

    #[tokio::test]
    async fn issued_tokens_validate() {
        let auth = service(crate::services::test_support::memory_db().await);
        let token = auth.issue_token(&client()).unwrap();
        assert_eq!(token.token_type, "Bearer");
        assert_eq!(token.expires_in, 600);

        let claims = auth.validate_token(&token.access_token).unwrap();
        assert_eq!(claims.client_id, "client-7");
        assert_eq!(claims.sub, "7");
        assert_eq!(claims.aud, "customer-api-clients");
    }

    #[tokio::test]
    async fn tokens_for_another_audience_are_rejected() {
        let db = crate::services::test_support::memory_db().await;
        let issuer = service(db.clone());
        let mut other = service(db);
        other.config.jwt_audience = "someone-else".into();

        let token = issuer.issue_token(&client()).unwrap();
        assert_matches!(
            other.validate_token(&token.access_token),
            Err(AuthError::InvalidToken)
        );
        assert_matches!(issuer.validate_token("garbage"), Err(AuthError::InvalidToken));
    }

    #[test]
    fn bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers), Some("abc"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn auth_errors_map_to_statuses() {
        assert_eq!(
            ServiceError::from(AuthError::MissingAuth).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ServiceError::from(AuthError::RestrictedClient).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ServiceError::from(AuthError::ApiDisabled).status_code(),
            StatusCode::FORBIDDEN
        );
    }
}
