use std::sync::Arc;

use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};
use tracing::instrument;

use crate::{entities::store, errors::ServiceError};

#[derive(Clone)]
pub struct StoreService {
    db: Arc<DatabaseConnection>,
}

impl StoreService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn get_all_stores(&self) -> Result<Vec<store::Model>, ServiceError> {
        Ok(store::Entity::find()
            .order_by_asc(store::Column::Id)
            .all(&*self.db)
            .await?)
    }
}
