use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Audit trail entry written by the controller after each mutation.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "activity_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub system_keyword: String,
    pub comment: String,
    #[sea_orm(nullable)]
    pub entity_id: Option<i32>,
    #[sea_orm(nullable)]
    pub entity_name: Option<String>,
    /// API client that performed the action
    #[sea_orm(nullable)]
    pub client_id: Option<String>,
    #[sea_orm(nullable)]
    pub ip_address: Option<String>,
    pub created_on_utc: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
