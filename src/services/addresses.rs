use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, NotSet};
use tracing::{info, instrument};

use crate::{entities::address, errors::ServiceError};

#[derive(Clone)]
pub struct AddressService {
    db: Arc<DatabaseConnection>,
}

impl AddressService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Inserts a new address. `created_on_utc` is stamped when unset.
    #[instrument(skip(self, address))]
    pub async fn insert_address(
        &self,
        mut address: address::Model,
    ) -> Result<address::Model, ServiceError> {
        if address.created_on_utc.timestamp() == 0 {
            address.created_on_utc = Utc::now();
        }
        let mut active: address::ActiveModel = address.into();
        active = active.reset_all();
        active.id = NotSet;
        let saved = active.insert(&*self.db).await?;
        info!(address_id = saved.id, "Address inserted");
        Ok(saved)
    }

    #[instrument(skip(self))]
    pub async fn get_address_by_id(
        &self,
        id: i32,
    ) -> Result<Option<address::Model>, ServiceError> {
        if id <= 0 {
            return Ok(None);
        }
        Ok(address::Entity::find_by_id(id).one(&*self.db).await?)
    }

    #[instrument(skip(self, address), fields(address_id = address.id))]
    pub async fn update_address(
        &self,
        address: address::Model,
    ) -> Result<address::Model, ServiceError> {
        let active = address::ActiveModel::from(address).reset_all();
        Ok(active.update(&*self.db).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::memory_db;

    #[tokio::test]
    async fn insert_stamps_creation_time_and_update_persists() {
        let svc = AddressService::new(memory_db().await);

        let saved = svc
            .insert_address(address::Model {
                id: 99,
                city: Some("Berlin".into()),
                country_id: Some(4),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_ne!(saved.id, 0);
        assert!(saved.created_on_utc.timestamp() > 0);

        let mut changed = saved.clone();
        changed.city = Some("Hamburg".into());
        svc.update_address(changed).await.unwrap();

        let loaded = svc.get_address_by_id(saved.id).await.unwrap().unwrap();
        assert_eq!(loaded.city.as_deref(), Some("Hamburg"));
        assert_eq!(loaded.country_id, Some(4));
        assert!(svc.get_address_by_id(-1).await.unwrap().is_none());
    }
}
