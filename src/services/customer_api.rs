use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, Order, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select,
};
use tracing::{debug, instrument};

use crate::{
    dto::{AddressDto, CustomerDto},
    entities::{address, customer},
    errors::ServiceError,
    services::{
        customers::CustomerService,
        directory::CountryService,
        generic_attributes::{keys, GenericAttributeService, CUSTOMER_KEY_GROUP},
    },
};

static SEARCH_TERM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w+):").expect("valid search term pattern"));

/// Splits `first_name:John email:gmail` into `(field, value)` pairs. Field
/// names lose their underscores and are lower-cased; empty values are
/// dropped.
pub fn parse_search_query(query: &str) -> Vec<(String, String)> {
    let matches: Vec<_> = SEARCH_TERM.captures_iter(query).collect();
    let mut terms = Vec::with_capacity(matches.len());

    for (i, caps) in matches.iter().enumerate() {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let value_end = matches
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(query.len());
        let value = query[whole.end()..value_end].trim();
        if value.is_empty() {
            continue;
        }
        terms.push((
            name.as_str().replace('_', "").to_ascii_lowercase(),
            value.to_string(),
        ));
    }
    terms
}

/// Column and direction for an `order` parameter such as `Email desc`.
/// Unknown columns sort by id.
pub fn parse_order(order: &str) -> (customer::Column, Order) {
    let mut parts = order.split_whitespace();
    let column = match parts
        .next()
        .map(|c| c.replace('_', "").to_ascii_lowercase())
        .as_deref()
    {
        Some("email") => customer::Column::Email,
        Some("username") => customer::Column::Username,
        Some("createdonutc") => customer::Column::CreatedOnUtc,
        _ => customer::Column::Id,
    };
    let direction = match parts.next() {
        Some(dir) if dir.eq_ignore_ascii_case("desc") => Order::Desc,
        _ => Order::Asc,
    };
    (column, direction)
}

/// Read side of the customer API: listing, counting, search and DTO
/// assembly.
#[derive(Clone)]
pub struct CustomerApiService {
    db: Arc<DatabaseConnection>,
    customers: Arc<CustomerService>,
    attributes: Arc<GenericAttributeService>,
    countries: Arc<CountryService>,
}

impl CustomerApiService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        customers: Arc<CustomerService>,
        attributes: Arc<GenericAttributeService>,
        countries: Arc<CountryService>,
    ) -> Self {
        Self {
            db,
            customers,
            attributes,
            countries,
        }
    }

    fn visible_customers() -> Select<customer::Entity> {
        customer::Entity::find()
            .filter(customer::Column::Deleted.eq(false))
            .filter(customer::Column::IsSystemAccount.eq(false))
    }

    fn offset(page: i32, limit: i32) -> u64 {
        (page.max(1) as u64 - 1) * limit.max(0) as u64
    }

    #[instrument(skip(self))]
    pub async fn get_customers_dtos(
        &self,
        created_at_min: Option<DateTime<Utc>>,
        created_at_max: Option<DateTime<Utc>>,
        limit: i32,
        page: i32,
        since_id: i32,
    ) -> Result<Vec<CustomerDto>, ServiceError> {
        let mut query = Self::visible_customers();
        if since_id > 0 {
            query = query.filter(customer::Column::Id.gt(since_id));
        }
        if let Some(min) = created_at_min {
            query = query.filter(customer::Column::CreatedOnUtc.gte(min));
        }
        if let Some(max) = created_at_max {
            query = query.filter(customer::Column::CreatedOnUtc.lte(max));
        }

        let models = query
            .order_by_asc(customer::Column::Id)
            .offset(Self::offset(page, limit))
            .limit(limit.max(0) as u64)
            .all(&*self.db)
            .await?;
        self.prepare_customer_dtos(models).await
    }

    #[instrument(skip(self))]
    pub async fn get_customers_count(&self) -> Result<u64, ServiceError> {
        Ok(Self::visible_customers().count(&*self.db).await?)
    }

    /// A customer that has not been deleted.
    #[instrument(skip(self))]
    pub async fn get_customer_entity_by_id(
        &self,
        id: i32,
    ) -> Result<Option<customer::Model>, ServiceError> {
        Ok(self
            .customers
            .get_customer_by_id(id)
            .await?
            .filter(|c| !c.deleted))
    }

    pub async fn get_customer_by_id(&self, id: i32) -> Result<Option<CustomerDto>, ServiceError> {
        match self.get_customer_entity_by_id(id).await? {
            Some(model) => Ok(Some(self.prepare_customer_dto(&model).await?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    pub async fn search(
        &self,
        query: &str,
        order: &str,
        page: i32,
        limit: i32,
    ) -> Result<Vec<CustomerDto>, ServiceError> {
        let terms = parse_search_query(query);
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let mut condition = Condition::all();
        let mut attribute_ids: Option<Vec<i32>> = None;
        for (field, value) in &terms {
            let column = match field.as_str() {
                "email" => customer::Column::Email,
                "username" => customer::Column::Username,
                "admincomment" => customer::Column::AdminComment,
                "systemname" => customer::Column::SystemName,
                "lastipaddress" => customer::Column::LastIpAddress,
                "firstname" | "lastname" => {
                    let key = if field == "firstname" {
                        keys::FIRST_NAME
                    } else {
                        keys::LAST_NAME
                    };
                    let ids = self
                        .attributes
                        .find_entity_ids(CUSTOMER_KEY_GROUP, key, value)
                        .await?;
                    attribute_ids = Some(match attribute_ids {
                        Some(prev) => prev.into_iter().filter(|id| ids.contains(id)).collect(),
                        None => ids,
                    });
                    continue;
                }
                other => {
                    debug!(field = other, "Ignoring unknown search field");
                    continue;
                }
            };
            condition = condition.add(column.contains(value.as_str()));
        }

        if let Some(ids) = attribute_ids {
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            condition = condition.add(customer::Column::Id.is_in(ids));
        }

        let (column, direction) = parse_order(order);
        let models = Self::visible_customers()
            .filter(condition)
            .order_by(column, direction)
            .offset(Self::offset(page, limit))
            .limit(limit.max(0) as u64)
            .all(&*self.db)
            .await?;
        self.prepare_customer_dtos(models).await
    }

    async fn prepare_customer_dtos(
        &self,
        models: Vec<customer::Model>,
    ) -> Result<Vec<CustomerDto>, ServiceError> {
        let mut dtos = Vec::with_capacity(models.len());
        for model in &models {
            dtos.push(self.prepare_customer_dto(model).await?);
        }
        Ok(dtos)
    }

    /// Full DTO: entity fields, mapped addresses with country names,
    /// billing and shipping address, role ids and generic attributes.
    #[instrument(skip(self, model), fields(customer_id = model.id))]
    pub async fn prepare_customer_dto(
        &self,
        model: &customer::Model,
    ) -> Result<CustomerDto, ServiceError> {
        let mut dto = CustomerDto::from_entity(model);
        let mut country_names = HashMap::new();

        for address in self.customers.get_addresses_by_customer_id(model.id).await? {
            let address = self.address_dto(address, &mut country_names).await?;
            dto.addresses.push(address);
        }
        if let Some(billing) = self.customers.get_customer_billing_address(model).await? {
            dto.billing_address = Some(self.address_dto(billing, &mut country_names).await?);
        }
        if let Some(shipping) = self.customers.get_customer_shipping_address(model).await? {
            dto.shipping_address = Some(self.address_dto(shipping, &mut country_names).await?);
        }

        dto.role_ids = self.customers.get_customer_role_ids(model.id).await?;
        self.fill_attributes(&mut dto).await?;
        Ok(dto)
    }

    /// Copies the stored generic attributes onto `dto`.
    pub async fn fill_attributes(&self, dto: &mut CustomerDto) -> Result<(), ServiceError> {
        let attributes = self
            .attributes
            .get_attributes_for_entity(dto.id, CUSTOMER_KEY_GROUP)
            .await?;
        for attr in attributes {
            match attr.key.as_str() {
                keys::FIRST_NAME => dto.first_name = Some(attr.value),
                keys::LAST_NAME => dto.last_name = Some(attr.value),
                keys::LANGUAGE_ID => dto.language_id = Some(attr.value),
                keys::GENDER => dto.gender = Some(attr.value),
                keys::DATE_OF_BIRTH => {
                    dto.date_of_birth = DateTime::parse_from_rfc3339(&attr.value)
                        .ok()
                        .map(|d| d.with_timezone(&Utc));
                }
                _ => {}
            }
        }
        Ok(())
    }

    async fn address_dto(
        &self,
        address: address::Model,
        country_names: &mut HashMap<i32, Option<String>>,
    ) -> Result<AddressDto, ServiceError> {
        let country_id = address.country_id;
        let mut dto = AddressDto::from(address);
        if let Some(country_id) = country_id {
            if !country_names.contains_key(&country_id) {
                let name = self
                    .countries
                    .get_country_by_id(country_id)
                    .await?
                    .map(|c| c.name);
                country_names.insert(country_id, name);
            }
            dto.country_name = country_names.get(&country_id).cloned().flatten();
        }
        Ok(dto)
    }
}
