use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::{AddressDto, MergeInto};
use crate::entities::customer;

pub const DEFAULT_LIMIT: i32 = 50;
pub const DEFAULT_PAGE: i32 = 1;
pub const DEFAULT_SINCE_ID: i32 = 0;
pub const DEFAULT_ORDER: &str = "Id";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct CustomerDto {
    #[serde(default)]
    pub id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_guid: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 1000))]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(email(message = "Invalid email"))]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Accepted as a string or a number
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub language_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_tax_exempt: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_system_account: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on_utc: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login_date_utc: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activity_date_utc: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registered_in_store_id: Option<i32>,
    #[serde(default)]
    pub role_ids: Vec<i32>,
    /// Write-only
    #[serde(default, skip_serializing)]
    #[validate(length(max = 128, message = "Password must be at most 128 characters"))]
    pub password: Option<String>,
    #[serde(default)]
    #[validate]
    pub addresses: Vec<AddressDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate]
    pub billing_address: Option<AddressDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate]
    pub shipping_address: Option<AddressDto>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Text(text)) => Ok(Some(text)),
        Some(Raw::Int(n)) => Ok(Some(n.to_string())),
        Some(Raw::Float(n)) if n.fract() == 0.0 => Ok(Some((n as i64).to_string())),
        Some(Raw::Float(n)) => Err(de::Error::custom(format!("invalid language id {n}"))),
    }
}

impl CustomerDto {
    /// The entity fields of a customer, without addresses, roles or
    /// generic attributes.
    pub fn from_entity(model: &customer::Model) -> Self {
        Self {
            id: model.id,
            customer_guid: Some(model.customer_guid),
            username: model.username.clone(),
            email: model.email.clone(),
            admin_comment: model.admin_comment.clone(),
            is_tax_exempt: Some(model.is_tax_exempt),
            active: Some(model.active),
            deleted: Some(model.deleted),
            is_system_account: Some(model.is_system_account),
            system_name: model.system_name.clone(),
            last_ip_address: model.last_ip_address.clone(),
            created_on_utc: Some(model.created_on_utc),
            last_login_date_utc: model.last_login_date_utc,
            last_activity_date_utc: Some(model.last_activity_date_utc),
            registered_in_store_id: Some(model.registered_in_store_id),
            ..Default::default()
        }
    }

    /// Non-blank password, if one was sent.
    pub fn new_password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.trim().is_empty())
    }
}

impl MergeInto<customer::Model> for CustomerDto {
    fn merge_into(&self, present: &HashSet<String>, target: &mut customer::Model) {
        // nullable columns take the sent value, `null` included
        macro_rules! nullable {
            ($($field:ident),+ $(,)?) => {
                $(if present.contains(stringify!($field)) {
                    target.$field = self.$field.clone();
                })+
            };
        }
        // `null` is ignored for required columns
        macro_rules! required {
            ($($field:ident),+ $(,)?) => {
                $(if present.contains(stringify!($field)) {
                    if let Some(value) = self.$field.clone() {
                        target.$field = value;
                    }
                })+
            };
        }

        nullable!(
            username,
            email,
            admin_comment,
            system_name,
            last_ip_address,
            last_login_date_utc,
        );
        required!(
            is_tax_exempt,
            active,
            deleted,
            is_system_account,
            last_activity_date_utc,
            registered_in_store_id,
        );
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CustomersRootObject {
    pub customers: Vec<CustomerDto>,
}

impl CustomersRootObject {
    pub fn single(customer: CustomerDto) -> Self {
        Self {
            customers: vec![customer],
        }
    }
}

/// Body of create and update requests.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomerPayload {
    pub customer: CustomerDto,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomersCountRootObject {
    pub count: u64,
}

fn default_limit() -> i32 {
    DEFAULT_LIMIT
}

fn default_page() -> i32 {
    DEFAULT_PAGE
}

fn default_since_id() -> i32 {
    DEFAULT_SINCE_ID
}

fn default_order() -> String {
    DEFAULT_ORDER.to_string()
}

/// Query string of `GET /api/customers`.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CustomersParameters {
    /// Page size, 1 to 250
    #[serde(default = "default_limit")]
    pub limit: i32,
    #[serde(default = "default_page")]
    pub page: i32,
    /// Only customers with a greater id
    #[serde(default = "default_since_id")]
    pub since_id: i32,
    pub created_at_min: Option<DateTime<Utc>>,
    pub created_at_max: Option<DateTime<Utc>>,
    /// Comma separated property names
    #[serde(default)]
    pub fields: String,
}

/// Query string of `GET /api/customers/search`.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CustomersSearchParameters {
    /// `field:value` pairs, e.g. `first_name:John email:gmail`
    #[serde(default)]
    pub query: String,
    /// Column name with an optional ` desc` suffix
    #[serde(default = "default_order")]
    pub order: String,
    #[serde(default = "default_page")]
    pub page: i32,
    #[serde(default = "default_limit")]
    pub limit: i32,
    #[serde(default)]
    pub fields: String,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CustomerFieldsParameters {
    #[serde(default)]
    pub fields: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::factory::{CustomerFactory, Factory};
    use validator::Validate;

    #[test]
    fn language_id_accepts_numbers_and_strings() {
        let dto: CustomerDto = serde_json::from_str(r#"{"language_id": 2}"#).unwrap();
        assert_eq!(dto.language_id.as_deref(), Some("2"));
        let dto: CustomerDto = serde_json::from_str(r#"{"language_id": "en"}"#).unwrap();
        assert_eq!(dto.language_id.as_deref(), Some("en"));
        let dto: CustomerDto = serde_json::from_str(r#"{"language_id": null}"#).unwrap();
        assert_eq!(dto.language_id, None);
    }

    #[test]
    fn password_is_never_serialized() {
        let dto = CustomerDto {
            id: 1,
            password: Some("secret".into()),
            ..Default::default()
        };
        let json = serde_json::to_string(&dto).unwrap();
        assert!(!json.contains("secret"));
        assert!(!json.contains("password"));
    }

    #[test]
    fn nested_address_validation_is_reported() {
        let dto: CustomerDto = serde_json::from_str(
            r#"{"email": "bad", "billing_address": {"email": "also-bad"}}"#,
        )
        .unwrap();
        let errors = dto.validate().unwrap_err();
        let fields = errors.errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("billing_address"));
    }

    #[test]
    fn merge_changes_only_present_keys() {
        let mut entity = CustomerFactory.initialize();
        entity.email = Some("old@example.com".into());
        entity.username = Some("old".into());
        entity.admin_comment = Some("vip".into());

        let dto = CustomerDto {
            email: Some("new@example.com".into()),
            username: Some("ignored".into()),
            admin_comment: None,
            active: None,
            ..Default::default()
        };
        let present: HashSet<String> = ["email", "admin_comment", "active"]
            .into_iter()
            .map(String::from)
            .collect();
        dto.merge_into(&present, &mut entity);

        assert_eq!(entity.email.as_deref(), Some("new@example.com"));
        assert_eq!(entity.username.as_deref(), Some("old"));
        assert_eq!(entity.admin_comment, None);
        assert!(entity.active);
    }
}
