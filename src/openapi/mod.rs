use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

/// Registers the `bearer_auth` scheme referenced by the customer routes.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Token from `POST /api/token`"))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Customer API",
        version = "1.0.0",
        description = r#"
# Customer API

REST endpoints for managing customer records: list, fetch, count, search,
create, update and delete.

## Authentication

Exchange API client credentials for a bearer token at `POST /api/token`, then
send it with every request:

```
Authorization: Bearer <token>
```

## Field selection

`GET` endpoints accept `fields=email,first_name` to trim each returned
customer to the listed properties.

## Errors

Every failure answers with

```json
{ "errors": { "limit": ["Invalid limit parameter"] } }
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "customers", description = "Customer management endpoints"),
        (name = "auth", description = "Token issuance"),
        (name = "health", description = "Health check endpoints")
    ),
    paths(
        crate::handlers::customers::get_customers,
        crate::handlers::customers::get_customers_count,
        crate::handlers::customers::search_customers,
        crate::handlers::customers::get_customer_by_id,
        crate::handlers::customers::create_customer,
        crate::handlers::customers::update_customer,
        crate::handlers::customers::delete_customer,

        crate::auth::token_handler,

        crate::handlers::health::liveness_check,
        crate::handlers::health::readiness_check,
    ),
    components(
        schemas(
            crate::dto::CustomerDto,
            crate::dto::AddressDto,
            crate::dto::CustomerPayload,
            crate::dto::CustomersRootObject,
            crate::dto::CustomersCountRootObject,
            crate::auth::TokenRequest,
            crate::auth::TokenResponse,
            crate::errors::ErrorsRootObject
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_customer_routes() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("Customer API"));
        assert!(json.contains("/api/customers/{id}"));
        assert!(json.contains("/api/customers/search"));
        assert!(json.contains("/api/token"));
        assert!(json.contains("bearer_auth"));
    }
}
