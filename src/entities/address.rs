use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "addresses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(nullable)]
    pub first_name: Option<String>,
    #[sea_orm(nullable)]
    pub last_name: Option<String>,
    #[sea_orm(nullable)]
    pub email: Option<String>,
    #[sea_orm(nullable)]
    pub company: Option<String>,
    #[sea_orm(nullable)]
    pub country_id: Option<i32>,
    #[sea_orm(nullable)]
    pub state_province_id: Option<i32>,
    #[sea_orm(nullable)]
    pub city: Option<String>,
    #[sea_orm(nullable)]
    pub address1: Option<String>,
    #[sea_orm(nullable)]
    pub address2: Option<String>,
    #[sea_orm(nullable)]
    pub zip_postal_code: Option<String>,
    #[sea_orm(nullable)]
    pub phone_number: Option<String>,
    #[sea_orm(nullable)]
    pub fax_number: Option<String>,
    pub created_on_utc: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::customer_address::Entity")]
    CustomerAddresses,
    #[sea_orm(
        belongs_to = "super::country::Entity",
        from = "Column::CountryId",
        to = "super::country::Column::Id"
    )]
    Country,
}

impl Related<super::customer_address::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CustomerAddresses.def()
    }
}

impl Related<super::country::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Country.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
