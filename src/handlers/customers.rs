use std::collections::HashSet;

use axum::{
    body::Bytes,
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::Json,
    routing::get,
    Extension, Router,
};
use chrono::{SecondsFormat, Utc};
use sea_orm::Set;
use serde_json::Value;
use tracing::{info, instrument, warn};
use validator::Validate;

use super::common::{path_id, query_params, RawJson};
use crate::{
    auth::AuthUser,
    dto::{
        AddressDto, CustomerDto, CustomerFieldsParameters, CustomerPayload,
        CustomersCountRootObject, CustomersParameters, CustomersRootObject,
        CustomersSearchParameters, Delta,
    },
    entities::{
        customer,
        customer_password::{self, PasswordFormat},
    },
    errors::{flatten_validation_errors, ApiError, FieldErrors},
    json,
    services::{
        factory::Factory,
        generic_attributes::{keys, CUSTOMER_KEY_GROUP},
        localization::activity,
    },
    AppState,
};

pub const MIN_LIMIT: i32 = 1;
pub const MAX_LIMIT: i32 = 250;

/// JSON root of create and update payloads.
const CUSTOMER_ROOT: &str = "customer";

/// Attributes are shared across stores.
const ALL_STORES: i32 = 0;

pub fn customers_routes() -> Router<AppState> {
    Router::new()
        .route("/customers", get(get_customers).post(create_customer))
        .route("/customers/count", get(get_customers_count))
        .route("/customers/search", get(search_customers))
        .route(
            "/customers/:id",
            get(get_customer_by_id)
                .put(update_customer)
                .delete(delete_customer),
        )
}

/// List customers
#[utoipa::path(
    get,
    path = "/api/customers",
    tag = "customers",
    params(CustomersParameters),
    responses(
        (status = 200, description = "Customers page", body = CustomersRootObject),
        (status = 400, description = "Invalid limit or page", body = crate::errors::ErrorsRootObject),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorsRootObject),
        (status = 403, description = "Restricted client", body = crate::errors::ErrorsRootObject),
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, query))]
pub async fn get_customers(
    State(state): State<AppState>,
    query: Result<Query<CustomersParameters>, QueryRejection>,
) -> Result<RawJson, ApiError> {
    let params = query_params(query)?;
    if params.limit < MIN_LIMIT || params.limit > MAX_LIMIT {
        return Err(ApiError::bad_request("limit", "Invalid limit parameter"));
    }
    if params.page < 1 {
        return Err(ApiError::bad_request("page", "Invalid request parameters"));
    }

    let customers = state
        .services
        .customer_api
        .get_customers_dtos(
            params.created_at_min,
            params.created_at_max,
            params.limit,
            params.page,
            params.since_id,
        )
        .await?;

    let root = CustomersRootObject { customers };
    Ok(RawJson(json::serialize(&root, &params.fields)?))
}

/// Count customers
#[utoipa::path(
    get,
    path = "/api/customers/count",
    tag = "customers",
    responses(
        (status = 200, description = "Number of live customers", body = CustomersCountRootObject),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorsRootObject),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_customers_count(
    State(state): State<AppState>,
) -> Result<Json<CustomersCountRootObject>, ApiError> {
    let count = state.services.customer_api.get_customers_count().await?;
    Ok(Json(CustomersCountRootObject { count }))
}

/// Search customers
#[utoipa::path(
    get,
    path = "/api/customers/search",
    tag = "customers",
    params(CustomersSearchParameters),
    responses(
        (status = 200, description = "Matching customers", body = CustomersRootObject),
        (status = 400, description = "Invalid limit or page", body = crate::errors::ErrorsRootObject),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorsRootObject),
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, query))]
pub async fn search_customers(
    State(state): State<AppState>,
    query: Result<Query<CustomersSearchParameters>, QueryRejection>,
) -> Result<RawJson, ApiError> {
    let params = query_params(query)?;
    if params.limit <= MIN_LIMIT || params.limit > MAX_LIMIT {
        return Err(ApiError::bad_request("limit", "Invalid limit parameter"));
    }
    if params.page <= 0 {
        return Err(ApiError::bad_request("page", "Invalid page parameter"));
    }

    let customers = state
        .services
        .customer_api
        .search(&params.query, &params.order, params.page, params.limit)
        .await?;

    let root = CustomersRootObject { customers };
    Ok(RawJson(json::serialize(&root, &params.fields)?))
}

/// Get a customer by id
#[utoipa::path(
    get,
    path = "/api/customers/{id}",
    tag = "customers",
    params(
        ("id" = i32, Path, description = "Customer id"),
        CustomerFieldsParameters,
    ),
    responses(
        (status = 200, description = "The customer", body = CustomersRootObject),
        (status = 400, description = "Invalid id", body = crate::errors::ErrorsRootObject),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorsRootObject),
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, path, query))]
pub async fn get_customer_by_id(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
    query: Result<Query<CustomerFieldsParameters>, QueryRejection>,
) -> Result<RawJson, ApiError> {
    let id = path_id(path)?;
    let params = query_params(query)?;
    if id <= 0 {
        return Err(ApiError::bad_request("id", "invalid id"));
    }

    let customer = state
        .services
        .customer_api
        .get_customer_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("customer"))?;

    let root = CustomersRootObject::single(customer);
    Ok(RawJson(json::serialize(&root, &params.fields)?))
}

/// Create a customer
#[utoipa::path(
    post,
    path = "/api/customers",
    tag = "customers",
    request_body = CustomerPayload,
    responses(
        (status = 200, description = "Customer created", body = CustomersRootObject),
        (status = 400, description = "Malformed payload", body = crate::errors::ErrorsRootObject),
        (status = 409, description = "Email already registered", body = crate::errors::ErrorsRootObject),
        (status = 422, description = "Validation failed", body = crate::errors::ErrorsRootObject),
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, user, body), fields(client_id = %user.client_id))]
pub async fn create_customer(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    body: Bytes,
) -> Result<Json<CustomersRootObject>, ApiError> {
    let delta = Delta::<CustomerDto>::from_json(&body, CUSTOMER_ROOT)?;
    validate_customer(&state, &delta, true).await?;
    let dto = delta.dto();
    let services = &state.services;

    if let Some(email) = dto.email.as_deref() {
        if let Some(existing) = services.customers.get_customer_by_email(email).await? {
            if !existing.deleted {
                return Err(ApiError::field(
                    StatusCode::CONFLICT,
                    "email",
                    "Email is already registered",
                ));
            }
        }
    }

    let mut customer = services.customer_factory.initialize();
    delta.merge(&mut customer);
    // the id is needed before addresses can be mapped
    let mut customer = services.customers.insert_customer(customer).await?;

    if let Some(billing) = &dto.billing_address {
        customer.billing_address_id =
            Some(insert_mapped_address(&state, customer.id, billing).await?);
    }
    if let Some(shipping) = &dto.shipping_address {
        customer.shipping_address_id =
            Some(insert_mapped_address(&state, customer.id, shipping).await?);
    }

    let customer = services.customers.update_customer(customer).await?;
    save_customer_details(&state, &delta, customer.id).await?;

    if !dto.role_ids.is_empty() {
        set_customer_roles(&state, customer.id, &dto.role_ids).await?;
    }

    let mut result = services.customer_api.prepare_customer_dto(&customer).await?;
    if dto.first_name.is_some() {
        result.first_name = dto.first_name.clone();
    }
    if dto.last_name.is_some() {
        result.last_name = dto.last_name.clone();
    }
    if dto.language_id.is_some() {
        result.language_id = dto.language_id.clone();
    }

    log_activity(&state, activity::ADD_NEW_CUSTOMER, customer.id, &user).await?;
    info!(customer_id = customer.id, "Customer created");
    Ok(Json(CustomersRootObject::single(result)))
}

/// Update a customer
#[utoipa::path(
    put,
    path = "/api/customers/{id}",
    tag = "customers",
    params(("id" = i32, Path, description = "Customer id")),
    request_body(content = CustomerPayload, description = "Only the keys sent change"),
    responses(
        (status = 200, description = "Customer updated", body = CustomersRootObject),
        (status = 400, description = "Invalid id or payload", body = crate::errors::ErrorsRootObject),
        (status = 404, description = "Customer or address not found", body = crate::errors::ErrorsRootObject),
        (status = 422, description = "Validation failed", body = crate::errors::ErrorsRootObject),
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, user, path, body), fields(client_id = %user.client_id))]
pub async fn update_customer(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<i32>, PathRejection>,
    body: Bytes,
) -> Result<Json<CustomersRootObject>, ApiError> {
    let id = path_id(path)?;
    let mut delta = Delta::<CustomerDto>::from_json(&body, CUSTOMER_ROOT)?;
    delta.dto_mut().id = id;
    validate_customer(&state, &delta, false).await?;
    if id <= 0 {
        return Err(ApiError::bad_request("id", "invalid id"));
    }

    let services = &state.services;
    let mut customer = services
        .customer_api
        .get_customer_entity_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("customer"))?;

    delta.merge(&mut customer);
    let dto = delta.dto();

    if !dto.role_ids.is_empty() {
        set_customer_roles(&state, customer.id, &dto.role_ids).await?;
    }

    // a synced address list decides billing and shipping on its own
    let (billing, shipping) = if dto.addresses.is_empty() {
        (dto.billing_address.as_ref(), dto.shipping_address.as_ref())
    } else {
        sync_addresses(&state, &mut customer, &dto.addresses).await?;
        (None, None)
    };

    ensure_mapped_address(&state, &mut customer, AddressSlot::Billing, billing).await?;
    ensure_mapped_address(&state, &mut customer, AddressSlot::Shipping, shipping).await?;

    let customer = services.customers.update_customer(customer).await?;
    save_customer_details(&state, &delta, customer.id).await?;

    let result = services.customer_api.prepare_customer_dto(&customer).await?;

    log_activity(&state, activity::UPDATE_CUSTOMER, customer.id, &user).await?;
    info!(customer_id = customer.id, "Customer updated");
    Ok(Json(CustomersRootObject::single(result)))
}

/// Delete a customer
#[utoipa::path(
    delete,
    path = "/api/customers/{id}",
    tag = "customers",
    params(("id" = i32, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Customer deleted, empty object"),
        (status = 400, description = "Invalid id or system account", body = crate::errors::ErrorsRootObject),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorsRootObject),
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, user, path), fields(client_id = %user.client_id))]
pub async fn delete_customer(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let id = path_id(path)?;
    if id <= 0 {
        return Err(ApiError::bad_request("id", "invalid id"));
    }

    let services = &state.services;
    let customer = services
        .customer_api
        .get_customer_entity_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("customer"))?;

    let email = customer.email.clone();
    services
        .customers
        .delete_customer(customer, state.config.customer.suffix_deleted_customers)
        .await?;

    if let Some(email) = email.as_deref() {
        for store in services.stores.get_all_stores().await? {
            if let Some(subscription) = services
                .newsletter
                .get_subscription_by_email_and_store_id(email, store.id)
                .await?
            {
                services.newsletter.delete_subscription(subscription).await?;
            }
        }
    }

    log_activity(&state, activity::DELETE_CUSTOMER, id, &user).await?;
    info!(customer_id = id, "Customer deleted");
    Ok(Json(serde_json::json!({})))
}

/// Field validation plus the role checks that need the database.
async fn validate_customer(
    state: &AppState,
    delta: &Delta<CustomerDto>,
    creating: bool,
) -> Result<(), ApiError> {
    let dto = delta.dto();
    let mut errors = FieldErrors::new();

    if let Err(validation) = dto.validate() {
        flatten_validation_errors(&validation, None, &mut errors);
    }

    if creating && dto.email.as_deref().map_or(true, |e| e.trim().is_empty()) {
        errors
            .entry("email".to_string())
            .or_default()
            .push("Email is required".to_string());
    }

    if creating && dto.role_ids.is_empty() {
        errors
            .entry("role_ids".to_string())
            .or_default()
            .push("At least one role is required".to_string());
    } else if delta.is_present("role_ids") && !dto.role_ids.is_empty() {
        let messages = state
            .services
            .customer_roles
            .validate_role_ids(&dto.role_ids)
            .await?;
        if !messages.is_empty() {
            errors
                .entry("role_ids".to_string())
                .or_default()
                .extend(messages);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(errors))
    }
}

/// Inserts `address` and maps it to the customer, returning its id.
async fn insert_mapped_address(
    state: &AppState,
    customer_id: i32,
    address: &AddressDto,
) -> Result<i32, ApiError> {
    let mut entity = address.to_entity();
    entity.id = 0;
    let saved = state.services.addresses.insert_address(entity).await?;
    state
        .services
        .customers
        .insert_customer_address(customer_id, saved.id)
        .await?;
    Ok(saved.id)
}

/// Inserts new addresses, merges mapped ones and maps existing unmapped
/// ones. Billing becomes the first address, shipping the last.
async fn sync_addresses(
    state: &AppState,
    customer: &mut customer::Model,
    addresses: &[AddressDto],
) -> Result<(), ApiError> {
    let services = &state.services;
    let mapped = services
        .customers
        .get_addresses_by_customer_id(customer.id)
        .await?;
    let mut ids = Vec::with_capacity(addresses.len());

    for passed in addresses {
        if passed.id == 0 {
            ids.push(insert_mapped_address(state, customer.id, passed).await?);
            continue;
        }

        if let Some(current) = mapped.iter().find(|a| a.id == passed.id) {
            let mut current = current.clone();
            passed.merge_into_entity(&mut current);
            services.addresses.update_address(current).await?;
        } else {
            let existing = services
                .addresses
                .get_address_by_id(passed.id)
                .await?
                .ok_or_else(|| ApiError::not_found("address"))?;
            services
                .customers
                .insert_customer_address(customer.id, existing.id)
                .await?;
        }
        ids.push(passed.id);
    }

    customer.billing_address_id = ids.first().copied();
    customer.shipping_address_id = ids.last().copied();
    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum AddressSlot {
    Billing,
    Shipping,
}

impl AddressSlot {
    fn id(self, customer: &customer::Model) -> Option<i32> {
        match self {
            AddressSlot::Billing => customer.billing_address_id,
            AddressSlot::Shipping => customer.shipping_address_id,
        }
    }

    fn set(self, customer: &mut customer::Model, id: i32) {
        match self {
            AddressSlot::Billing => customer.billing_address_id = Some(id),
            AddressSlot::Shipping => customer.shipping_address_id = Some(id),
        }
    }
}

/// Keeps the billing or shipping address inside the customer's address
/// mapping, then applies an explicit id from the payload.
async fn ensure_mapped_address(
    state: &AppState,
    customer: &mut customer::Model,
    slot: AddressSlot,
    passed: Option<&AddressDto>,
) -> Result<(), ApiError> {
    let services = &state.services;
    let current = match slot {
        AddressSlot::Billing => services.customers.get_customer_billing_address(customer).await?,
        AddressSlot::Shipping => {
            services
                .customers
                .get_customer_shipping_address(customer)
                .await?
        }
    };

    if current.is_none() {
        let existing = match slot.id(customer) {
            Some(id) => services.addresses.get_address_by_id(id).await?,
            None => None,
        };
        match (existing, passed) {
            (Some(address), _) => {
                services
                    .customers
                    .insert_customer_address(customer.id, address.id)
                    .await?;
            }
            (None, Some(address)) if address.id == 0 => {
                let id = insert_mapped_address(state, customer.id, address).await?;
                slot.set(customer, id);
            }
            _ => {}
        }
    }

    if let Some(address) = passed.filter(|a| a.id > 0) {
        if services.addresses.get_address_by_id(address.id).await?.is_none() {
            return Err(ApiError::not_found("address"));
        }
        services
            .customers
            .insert_customer_address(customer.id, address.id)
            .await?;
        slot.set(customer, address.id);
    }
    Ok(())
}

/// Adds the requested roles and removes every other role the customer holds.
/// Roles without a system name are left alone.
async fn set_customer_roles(
    state: &AppState,
    customer_id: i32,
    role_ids: &[i32],
) -> Result<(), ApiError> {
    let customers = &state.services.customers;
    let wanted: HashSet<i32> = role_ids.iter().copied().collect();
    let held: HashSet<i32> = customers
        .get_customer_role_ids(customer_id)
        .await?
        .into_iter()
        .collect();

    for role in customers.get_all_customer_roles(true).await? {
        if role.system_name.as_deref().map_or(true, str::is_empty) {
            continue;
        }
        match (wanted.contains(&role.id), held.contains(&role.id)) {
            (true, false) => customers.add_customer_role_mapping(customer_id, role.id).await?,
            (false, true) => {
                customers
                    .remove_customer_role_mapping(customer_id, role.id)
                    .await?
            }
            _ => {}
        }
    }
    Ok(())
}

/// Generic attributes, language and password.
async fn save_customer_details(
    state: &AppState,
    delta: &Delta<CustomerDto>,
    customer_id: i32,
) -> Result<(), ApiError> {
    let services = &state.services;
    let dto = delta.dto();

    let date_of_birth = dto
        .date_of_birth
        .map(|d| d.to_rfc3339_opts(SecondsFormat::Secs, true));
    let texts = [
        (keys::FIRST_NAME, dto.first_name.as_deref()),
        (keys::LAST_NAME, dto.last_name.as_deref()),
        (keys::GENDER, dto.gender.as_deref()),
        (keys::DATE_OF_BIRTH, date_of_birth.as_deref()),
    ];
    // absent and null both leave the stored value alone
    for (key, value) in texts {
        if let Some(value) = value {
            services
                .attributes
                .save_attribute(customer_id, CUSTOMER_KEY_GROUP, key, value, ALL_STORES)
                .await?;
        }
    }

    let language_id = dto
        .language_id
        .as_deref()
        .and_then(|id| id.trim().parse::<i32>().ok());
    if let Some(language_id) = language_id {
        if services.languages.get_language_by_id(language_id).await?.is_some() {
            services
                .attributes
                .save_attribute(
                    customer_id,
                    CUSTOMER_KEY_GROUP,
                    keys::LANGUAGE_ID,
                    &language_id.to_string(),
                    ALL_STORES,
                )
                .await?;
        } else {
            warn!(customer_id, language_id, "Ignoring unknown language");
        }
    }

    if let Some(password) = dto.new_password() {
        add_password(state, customer_id, password).await?;
    }
    Ok(())
}

/// Stores a new current password in the configured format.
async fn add_password(state: &AppState, customer_id: i32, password: &str) -> Result<(), ApiError> {
    let settings = &state.config.customer;
    let format = settings.default_password_format;
    let (stored, salt) = match format {
        PasswordFormat::Clear => (password.to_string(), None),
        PasswordFormat::Hashed => {
            let encryption = &state.services.encryption;
            let salt = encryption.create_salt_key(settings.password_salt_size);
            let hash = encryption.create_password_hash(
                password,
                &salt,
                settings.hashed_password_format,
            )?;
            (hash, Some(salt))
        }
    };

    state
        .services
        .customers
        .insert_customer_password(customer_password::ActiveModel {
            customer_id: Set(customer_id),
            password: Set(stored),
            password_format: Set(format),
            password_salt: Set(salt),
            created_on_utc: Set(Utc::now()),
            ..Default::default()
        })
        .await?;
    Ok(())
}

async fn log_activity(
    state: &AppState,
    keyword: &str,
    customer_id: i32,
    user: &AuthUser,
) -> Result<(), ApiError> {
    let services = &state.services;
    let comment = services
        .localization
        .format_resource(&activity::resource_name(keyword), &[&customer_id]);
    services
        .activity
        .insert_activity(keyword, &comment, Some(customer_id), Some(&user.client_id))
        .await?;
    Ok(())
}
