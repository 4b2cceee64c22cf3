use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, Set,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{entities::newsletter_subscription, errors::ServiceError};

#[derive(Clone)]
pub struct NewsLetterSubscriptionService {
    db: Arc<DatabaseConnection>,
}

impl NewsLetterSubscriptionService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn get_subscription_by_email_and_store_id(
        &self,
        email: &str,
        store_id: i32,
    ) -> Result<Option<newsletter_subscription::Model>, ServiceError> {
        Ok(newsletter_subscription::Entity::find()
            .filter(newsletter_subscription::Column::Email.eq(email.trim()))
            .filter(newsletter_subscription::Column::StoreId.eq(store_id))
            .one(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn insert_subscription(
        &self,
        email: &str,
        store_id: i32,
        active: bool,
    ) -> Result<newsletter_subscription::Model, ServiceError> {
        let saved = newsletter_subscription::ActiveModel {
            subscription_guid: Set(Uuid::new_v4()),
            email: Set(email.trim().to_string()),
            active: Set(active),
            store_id: Set(store_id),
            created_on_utc: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;
        Ok(saved)
    }

    #[instrument(skip(self, subscription), fields(subscription_id = subscription.id))]
    pub async fn delete_subscription(
        &self,
        subscription: newsletter_subscription::Model,
    ) -> Result<(), ServiceError> {
        subscription.delete(&*self.db).await?;
        info!("Newsletter subscription removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::memory_db;

    #[tokio::test]
    async fn subscriptions_are_scoped_by_store() {
        let svc = NewsLetterSubscriptionService::new(memory_db().await);
        svc.insert_subscription("news@example.com", 1, true)
            .await
            .unwrap();

        assert!(svc
            .get_subscription_by_email_and_store_id("news@example.com", 2)
            .await
            .unwrap()
            .is_none());
        let found = svc
            .get_subscription_by_email_and_store_id("news@example.com", 1)
            .await
            .unwrap()
            .unwrap();

        svc.delete_subscription(found).await.unwrap();
        assert!(svc
            .get_subscription_by_email_and_store_id("news@example.com", 1)
            .await
            .unwrap()
            .is_none());
    }
}
