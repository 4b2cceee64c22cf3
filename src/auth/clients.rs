use std::sync::Arc;

use chrono::Utc;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use sha2::{Digest, Sha256};
use tracing::{info, instrument};
use uuid::Uuid;

use super::AuthUser;
use crate::{entities::api_client, errors::ServiceError};

const CLIENT_SECRET_LENGTH: usize = 40;

/// SHA-256 hex digest stored in place of a client secret.
pub fn hash_client_secret(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

/// A freshly registered client with its plain-text secret. The secret is
/// only available here.
#[derive(Debug, Clone)]
pub struct NewClient {
    pub client: api_client::Model,
    pub client_secret: String,
}

/// API client registry plus the restricted-access check.
#[derive(Clone)]
pub struct ClientService {
    db: Arc<DatabaseConnection>,
    restricted_client_ids: Vec<String>,
}

impl ClientService {
    pub fn new(db: Arc<DatabaseConnection>, restricted_client_ids: Vec<String>) -> Self {
        Self {
            db,
            restricted_client_ids,
        }
    }

    #[instrument(skip(self))]
    pub async fn get_all_clients(&self) -> Result<Vec<api_client::Model>, ServiceError> {
        Ok(api_client::Entity::find()
            .order_by_asc(api_client::Column::Id)
            .all(&*self.db)
            .await?)
    }

    /// Registers a client with a generated id and secret.
    #[instrument(skip(self))]
    pub async fn insert_client(&self, name: &str) -> Result<NewClient, ServiceError> {
        let client_secret: String = thread_rng()
            .sample_iter(&Alphanumeric)
            .take(CLIENT_SECRET_LENGTH)
            .map(char::from)
            .collect();

        let client = api_client::ActiveModel {
            client_id: Set(Uuid::new_v4().to_string()),
            client_secret_hash: Set(hash_client_secret(&client_secret)),
            name: Set(name.to_string()),
            enabled: Set(true),
            created_on_utc: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(client_id = %client.client_id, "API client registered");
        Ok(NewClient {
            client,
            client_secret,
        })
    }

    #[instrument(skip(self, client), fields(client_id = %client.client_id))]
    pub async fn update_client(
        &self,
        client: api_client::Model,
    ) -> Result<api_client::Model, ServiceError> {
        let active = api_client::ActiveModel::from(client).reset_all();
        Ok(active.update(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_client(&self, id: i32) -> Result<(), ServiceError> {
        let result = api_client::Entity::delete_by_id(id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("API client {id} not found")));
        }
        info!(id, "API client removed");
        Ok(())
    }

    pub async fn find_client_by_id(
        &self,
        id: i32,
    ) -> Result<Option<api_client::Model>, ServiceError> {
        Ok(api_client::Entity::find_by_id(id).one(&*self.db).await?)
    }

    pub async fn find_client_by_client_id(
        &self,
        client_id: &str,
    ) -> Result<Option<api_client::Model>, ServiceError> {
        Ok(api_client::Entity::find()
            .filter(api_client::Column::ClientId.eq(client_id))
            .one(&*self.db)
            .await?)
    }

    /// True when the caller's client id is on the restricted list.
    pub fn user_has_restricted_access(&self, user: &AuthUser) -> bool {
        self.restricted_client_ids
            .iter()
            .any(|id| id == &user.client_id)
    }
}
