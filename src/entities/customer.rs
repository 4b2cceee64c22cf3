use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Customer record. Soft-deleted rows keep `deleted = true`.
#[derive(Clone, Debug, Default, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "customers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub customer_guid: Uuid,
    #[sea_orm(nullable)]
    pub username: Option<String>,
    #[sea_orm(nullable)]
    pub email: Option<String>,
    #[sea_orm(nullable)]
    pub admin_comment: Option<String>,
    pub is_tax_exempt: bool,
    pub active: bool,
    pub deleted: bool,
    pub is_system_account: bool,
    #[sea_orm(nullable)]
    pub system_name: Option<String>,
    #[sea_orm(nullable)]
    pub last_ip_address: Option<String>,
    pub created_on_utc: DateTime<Utc>,
    #[sea_orm(nullable)]
    pub last_login_date_utc: Option<DateTime<Utc>>,
    pub last_activity_date_utc: DateTime<Utc>,
    pub registered_in_store_id: i32,
    #[sea_orm(nullable)]
    pub billing_address_id: Option<i32>,
    #[sea_orm(nullable)]
    pub shipping_address_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::customer_address::Entity")]
    CustomerAddresses,
    #[sea_orm(has_many = "super::customer_role_mapping::Entity")]
    RoleMappings,
    #[sea_orm(has_many = "super::customer_password::Entity")]
    Passwords,
}

impl Related<super::customer_address::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CustomerAddresses.def()
    }
}

impl Related<super::customer_role_mapping::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RoleMappings.def()
    }
}

impl Related<super::customer_password::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Passwords.def()
    }
}

impl Related<super::address::Entity> for Entity {
    fn to() -> RelationDef {
        super::customer_address::Relation::Address.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::customer_address::Relation::Customer.def().rev())
    }
}

impl Related<super::customer_role::Entity> for Entity {
    fn to() -> RelationDef {
        super::customer_role_mapping::Relation::CustomerRole.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::customer_role_mapping::Relation::Customer.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
