use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use tracing::{debug, instrument};

use crate::{entities::generic_attribute, errors::ServiceError};

/// Key group for attributes attached to customers.
pub const CUSTOMER_KEY_GROUP: &str = "Customer";

/// Customer attribute keys.
pub mod keys {
    pub const FIRST_NAME: &str = "FirstName";
    pub const LAST_NAME: &str = "LastName";
    pub const LANGUAGE_ID: &str = "LanguageId";
    pub const GENDER: &str = "Gender";
    pub const DATE_OF_BIRTH: &str = "DateOfBirth";
}

/// Key/value storage for fields that have no column on the entity.
#[derive(Clone)]
pub struct GenericAttributeService {
    db: Arc<DatabaseConnection>,
}

impl GenericAttributeService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn get_attributes_for_entity(
        &self,
        entity_id: i32,
        key_group: &str,
    ) -> Result<Vec<generic_attribute::Model>, ServiceError> {
        Ok(generic_attribute::Entity::find()
            .filter(generic_attribute::Column::EntityId.eq(entity_id))
            .filter(generic_attribute::Column::KeyGroup.eq(key_group))
            .order_by_asc(generic_attribute::Column::Id)
            .all(&*self.db)
            .await?)
    }

    /// Value stored under `key` for the entity and store, if any.
    pub async fn get_attribute(
        &self,
        entity_id: i32,
        key_group: &str,
        key: &str,
        store_id: i32,
    ) -> Result<Option<String>, ServiceError> {
        Ok(self
            .get_attributes_for_entity(entity_id, key_group)
            .await?
            .into_iter()
            .find(|attr| attr.key.eq_ignore_ascii_case(key) && attr.store_id == store_id)
            .map(|attr| attr.value))
    }

    /// Upsert. An empty `value` removes the attribute.
    #[instrument(skip(self, value))]
    pub async fn save_attribute(
        &self,
        entity_id: i32,
        key_group: &str,
        key: &str,
        value: &str,
        store_id: i32,
    ) -> Result<(), ServiceError> {
        let existing = self
            .get_attributes_for_entity(entity_id, key_group)
            .await?
            .into_iter()
            .find(|attr| attr.key.eq_ignore_ascii_case(key) && attr.store_id == store_id);

        match existing {
            Some(attr) if value.is_empty() => {
                generic_attribute::Entity::delete_by_id(attr.id)
                    .exec(&*self.db)
                    .await?;
                debug!(entity_id, key, "Generic attribute removed");
            }
            Some(attr) => {
                let mut active: generic_attribute::ActiveModel = attr.into();
                active.value = Set(value.to_string());
                active.created_or_updated_date_utc = Set(Utc::now());
                active.update(&*self.db).await?;
            }
            None if value.is_empty() => {}
            None => {
                generic_attribute::ActiveModel {
                    entity_id: Set(entity_id),
                    key_group: Set(key_group.to_string()),
                    key: Set(key.to_string()),
                    value: Set(value.to_string()),
                    store_id: Set(store_id),
                    created_or_updated_date_utc: Set(Utc::now()),
                    ..Default::default()
                }
                .insert(&*self.db)
                .await?;
            }
        }
        Ok(())
    }

    /// Ids of entities whose attribute `key` equals `value` exactly.
    #[instrument(skip(self))]
    pub async fn find_entity_ids(
        &self,
        key_group: &str,
        key: &str,
        value: &str,
    ) -> Result<Vec<i32>, ServiceError> {
        Ok(generic_attribute::Entity::find()
            .select_only()
            .column(generic_attribute::Column::EntityId)
            .filter(generic_attribute::Column::KeyGroup.eq(key_group))
            .filter(generic_attribute::Column::Key.eq(key))
            .filter(generic_attribute::Column::Value.eq(value))
            .distinct()
            .into_tuple::<i32>()
            .all(&*self.db)
            .await?)
    }
}
