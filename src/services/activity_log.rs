use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::{info, instrument};

use crate::{entities::activity_log, errors::ServiceError};

pub const CUSTOMER_ENTITY_NAME: &str = "Customer";

/// Audit trail of mutations performed through the API.
#[derive(Clone)]
pub struct CustomerActivityService {
    db: Arc<DatabaseConnection>,
}

impl CustomerActivityService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Records `system_keyword` against the customer `entity_id`.
    #[instrument(skip(self, comment))]
    pub async fn insert_activity(
        &self,
        system_keyword: &str,
        comment: &str,
        entity_id: Option<i32>,
        client_id: Option<&str>,
    ) -> Result<activity_log::Model, ServiceError> {
        let saved = activity_log::ActiveModel {
            system_keyword: Set(system_keyword.to_string()),
            comment: Set(comment.to_string()),
            entity_id: Set(entity_id),
            entity_name: Set(entity_id.map(|_| CUSTOMER_ENTITY_NAME.to_string())),
            client_id: Set(client_id.map(str::to_string)),
            ip_address: Set(None),
            created_on_utc: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;
        info!(activity_id = saved.id, keyword = system_keyword, "Activity recorded");
        Ok(saved)
    }

    #[instrument(skip(self))]
    pub async fn get_activities_for_entity(
        &self,
        entity_id: i32,
    ) -> Result<Vec<activity_log::Model>, ServiceError> {
        Ok(activity_log::Entity::find()
            .filter(activity_log::Column::EntityId.eq(entity_id))
            .filter(activity_log::Column::EntityName.eq(CUSTOMER_ENTITY_NAME))
            .order_by_asc(activity_log::Column::Id)
            .all(&*self.db)
            .await?)
    }
}
