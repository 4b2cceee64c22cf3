use std::sync::Arc;

use sea_orm::{DatabaseConnection, EntityTrait};
use tracing::instrument;

use crate::{entities::country, errors::ServiceError};

#[derive(Clone)]
pub struct CountryService {
    db: Arc<DatabaseConnection>,
}

impl CountryService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn get_country_by_id(
        &self,
        id: i32,
    ) -> Result<Option<country::Model>, ServiceError> {
        if id <= 0 {
            return Ok(None);
        }
        Ok(country::Entity::find_by_id(id).one(&*self.db).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::memory_db;

    #[tokio::test]
    async fn seeded_countries_resolve_by_id() {
        let svc = CountryService::new(memory_db().await);
        let us = svc.get_country_by_id(1).await.unwrap().unwrap();
        assert_eq!(us.two_letter_iso_code, "US");
        assert!(svc.get_country_by_id(0).await.unwrap().is_none());
        assert!(svc.get_country_by_id(10_000).await.unwrap().is_none());
    }
}
