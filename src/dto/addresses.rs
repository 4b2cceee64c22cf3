use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::entities::address;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct AddressDto {
    #[serde(default)]
    pub id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 1000))]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 1000))]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(email(message = "Invalid email"))]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_id: Option<i32>,
    /// Country name, filled on output
    #[serde(rename = "country", default, skip_serializing_if = "Option::is_none")]
    pub country_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_province_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fax_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on_utc: Option<DateTime<Utc>>,
}

impl AddressDto {
    /// New entity from the payload. `created_on_utc` is left for the
    /// address service to stamp when absent.
    pub fn to_entity(&self) -> address::Model {
        let mut entity = address::Model {
            id: self.id,
            created_on_utc: self.created_on_utc.unwrap_or_default(),
            ..Default::default()
        };
        self.merge_into_entity(&mut entity);
        entity
    }

    /// Copies every provided field onto `entity`.
    pub fn merge_into_entity(&self, entity: &mut address::Model) {
        macro_rules! copy_some {
            ($($field:ident),+ $(,)?) => {
                $(if let Some(value) = &self.$field {
                    entity.$field = Some(value.clone());
                })+
            };
        }
        copy_some!(
            first_name,
            last_name,
            email,
            company,
            country_id,
            state_province_id,
            city,
            address1,
            address2,
            zip_postal_code,
            phone_number,
            fax_number,
        );
    }
}

impl From<address::Model> for AddressDto {
    fn from(model: address::Model) -> Self {
        Self {
            id: model.id,
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
            company: model.company,
            country_id: model.country_id,
            country_name: None,
            state_province_id: model.state_province_id,
            city: model.city,
            address1: model.address1,
            address2: model.address2,
            zip_postal_code: model.zip_postal_code,
            phone_number: model.phone_number,
            fax_number: model.fax_number,
            created_on_utc: Some(model.created_on_utc),
        }
    }
}
