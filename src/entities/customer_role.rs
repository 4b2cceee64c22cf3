use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// System names of the seeded roles.
pub mod system_names {
    pub const ADMINISTRATORS: &str = "Administrators";
    pub const FORUM_MODERATORS: &str = "ForumModerators";
    pub const REGISTERED: &str = "Registered";
    pub const GUESTS: &str = "Guests";
    pub const VENDORS: &str = "Vendors";
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "customer_roles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(nullable)]
    pub system_name: Option<String>,
    pub active: bool,
    pub is_system_role: bool,
}

impl Model {
    pub fn has_system_name(&self, name: &str) -> bool {
        self.system_name.as_deref() == Some(name)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::customer_role_mapping::Entity")]
    RoleMappings,
}

impl Related<super::customer_role_mapping::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RoleMappings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
