use std::sync::Arc;

use sea_orm::{
    sea_query::{Expr, Func},
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, NotSet,
    QueryFilter, QueryOrder, Set,
};
use tracing::{info, instrument};

use crate::{
    entities::{
        address, customer, customer_address, customer_password, customer_role,
        customer_role_mapping,
    },
    errors::ServiceError,
};

pub const DELETED_SUFFIX: &str = "-DELETED";

/// Customer persistence: the entity itself plus its address, role and
/// password associations.
#[derive(Clone)]
pub struct CustomerService {
    db: Arc<DatabaseConnection>,
}

impl CustomerService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn get_customer_by_id(&self, id: i32) -> Result<Option<customer::Model>, ServiceError> {
        if id <= 0 {
            return Ok(None);
        }
        Ok(customer::Entity::find_by_id(id).one(&*self.db).await?)
    }

    /// First customer with this email, compared case-insensitively. Live
    /// records win over soft-deleted ones.
    #[instrument(skip(self))]
    pub async fn get_customer_by_email(
        &self,
        email: &str,
    ) -> Result<Option<customer::Model>, ServiceError> {
        if email.trim().is_empty() {
            return Ok(None);
        }
        Ok(customer::Entity::find()
            .filter(
                Expr::expr(Func::lower(Expr::col(customer::Column::Email)))
                    .eq(email.trim().to_lowercase()),
            )
            .order_by_asc(customer::Column::Deleted)
            .order_by_asc(customer::Column::Id)
            .one(&*self.db)
            .await?)
    }

    /// Inserts `customer`, ignoring its id.
    #[instrument(skip(self, customer))]
    pub async fn insert_customer(
        &self,
        customer: customer::Model,
    ) -> Result<customer::Model, ServiceError> {
        let mut active: customer::ActiveModel = customer.into();
        active = active.reset_all();
        active.id = NotSet;
        let saved = active.insert(&*self.db).await?;
        info!(customer_id = saved.id, "Customer inserted");
        Ok(saved)
    }

    /// Writes every column of `customer` back to its row.
    #[instrument(skip(self, customer), fields(customer_id = customer.id))]
    pub async fn update_customer(
        &self,
        customer: customer::Model,
    ) -> Result<customer::Model, ServiceError> {
        let active = customer::ActiveModel::from(customer).reset_all();
        Ok(active.update(&*self.db).await?)
    }

    /// Soft delete. With `suffix_deleted` the email and username are
    /// suffixed so they can be registered again.
    #[instrument(skip(self, customer), fields(customer_id = customer.id))]
    pub async fn delete_customer(
        &self,
        mut customer: customer::Model,
        suffix_deleted: bool,
    ) -> Result<customer::Model, ServiceError> {
        if customer.is_system_account {
            return Err(ServiceError::BadRequest(format!(
                "System customer account ({}) could not be deleted",
                customer.system_name.as_deref().unwrap_or_default()
            )));
        }

        customer.deleted = true;
        if suffix_deleted {
            if let Some(email) = customer.email.as_mut() {
                email.push_str(DELETED_SUFFIX);
            }
            if let Some(username) = customer.username.as_mut() {
                username.push_str(DELETED_SUFFIX);
            }
        }

        let saved = self.update_customer(customer).await?;
        info!(customer_id = saved.id, "Customer soft-deleted");
        Ok(saved)
    }

    #[instrument(skip(self))]
    pub async fn get_addresses_by_customer_id(
        &self,
        customer_id: i32,
    ) -> Result<Vec<address::Model>, ServiceError> {
        let Some(customer) = customer::Entity::find_by_id(customer_id)
            .one(&*self.db)
            .await?
        else {
            return Ok(Vec::new());
        };
        Ok(customer
            .find_related(address::Entity)
            .order_by_asc(address::Column::Id)
            .all(&*self.db)
            .await?)
    }

    /// The address only when it is mapped to the customer.
    #[instrument(skip(self))]
    pub async fn get_customer_address(
        &self,
        customer_id: i32,
        address_id: i32,
    ) -> Result<Option<address::Model>, ServiceError> {
        if customer_id <= 0 || address_id <= 0 {
            return Ok(None);
        }
        let mapped = customer_address::Entity::find_by_id((customer_id, address_id))
            .one(&*self.db)
            .await?;
        if mapped.is_none() {
            return Ok(None);
        }
        Ok(address::Entity::find_by_id(address_id).one(&*self.db).await?)
    }

    pub async fn get_customer_billing_address(
        &self,
        customer: &customer::Model,
    ) -> Result<Option<address::Model>, ServiceError> {
        match customer.billing_address_id {
            Some(id) => self.get_customer_address(customer.id, id).await,
            None => Ok(None),
        }
    }

    pub async fn get_customer_shipping_address(
        &self,
        customer: &customer::Model,
    ) -> Result<Option<address::Model>, ServiceError> {
        match customer.shipping_address_id {
            Some(id) => self.get_customer_address(customer.id, id).await,
            None => Ok(None),
        }
    }

    /// Maps the address to the customer. A no-op when already mapped.
    #[instrument(skip(self))]
    pub async fn insert_customer_address(
        &self,
        customer_id: i32,
        address_id: i32,
    ) -> Result<(), ServiceError> {
        let existing = customer_address::Entity::find_by_id((customer_id, address_id))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Ok(());
        }

        customer_address::ActiveModel {
            customer_id: Set(customer_id),
            address_id: Set(address_id),
        }
        .insert(&*self.db)
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_all_customer_roles(
        &self,
        show_hidden: bool,
    ) -> Result<Vec<customer_role::Model>, ServiceError> {
        let mut query = customer_role::Entity::find().order_by_asc(customer_role::Column::Id);
        if !show_hidden {
            query = query.filter(customer_role::Column::Active.eq(true));
        }
        Ok(query.all(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn get_customer_roles(
        &self,
        customer_id: i32,
    ) -> Result<Vec<customer_role::Model>, ServiceError> {
        Ok(customer_role::Entity::find()
            .inner_join(customer_role_mapping::Entity)
            .filter(customer_role_mapping::Column::CustomerId.eq(customer_id))
            .order_by_asc(customer_role::Column::Id)
            .all(&*self.db)
            .await?)
    }

    pub async fn get_customer_role_ids(&self, customer_id: i32) -> Result<Vec<i32>, ServiceError> {
        Ok(self
            .get_customer_roles(customer_id)
            .await?
            .into_iter()
            .map(|role| role.id)
            .collect())
    }

    /// Whether the customer holds the role with the given system name.
    #[instrument(skip(self))]
    pub async fn is_in_customer_role(
        &self,
        customer_id: i32,
        role_system_name: &str,
    ) -> Result<bool, ServiceError> {
        Ok(self
            .get_customer_roles(customer_id)
            .await?
            .iter()
            .any(|role| role.has_system_name(role_system_name)))
    }

    #[instrument(skip(self))]
    pub async fn add_customer_role_mapping(
        &self,
        customer_id: i32,
        customer_role_id: i32,
    ) -> Result<(), ServiceError> {
        let existing =
            customer_role_mapping::Entity::find_by_id((customer_id, customer_role_id))
                .one(&*self.db)
                .await?;
        if existing.is_some() {
            return Ok(());
        }

        customer_role_mapping::ActiveModel {
            customer_id: Set(customer_id),
            customer_role_id: Set(customer_role_id),
        }
        .insert(&*self.db)
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn remove_customer_role_mapping(
        &self,
        customer_id: i32,
        customer_role_id: i32,
    ) -> Result<(), ServiceError> {
        customer_role_mapping::Entity::delete_by_id((customer_id, customer_role_id))
            .exec(&*self.db)
            .await?;
        Ok(())
    }

    #[instrument(skip(self, password))]
    pub async fn insert_customer_password(
        &self,
        password: customer_password::ActiveModel,
    ) -> Result<customer_password::Model, ServiceError> {
        let saved = password.insert(&*self.db).await?;
        info!(customer_id = saved.customer_id, "Customer password stored");
        Ok(saved)
    }

    /// The newest password row.
    #[instrument(skip(self))]
    pub async fn get_current_password(
        &self,
        customer_id: i32,
    ) -> Result<Option<customer_password::Model>, ServiceError> {
        Ok(customer_password::Entity::find()
            .filter(customer_password::Column::CustomerId.eq(customer_id))
            .order_by_desc(customer_password::Column::CreatedOnUtc)
            .order_by_desc(customer_password::Column::Id)
            .one(&*self.db)
            .await?)
    }
}
