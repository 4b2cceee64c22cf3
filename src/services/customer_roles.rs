use std::{collections::BTreeSet, sync::Arc};

use crate::{
    entities::customer_role::{self, system_names},
    errors::ServiceError,
    services::customers::CustomerService,
};

pub const INVALID_ROLE_IDS: &str = "Invalid role ids";
pub const GUESTS_AND_REGISTERED: &str =
    "The customer cannot be in both 'Guests' and 'Registered' customer roles";

/// Role checks shared by create and update.
#[derive(Clone)]
pub struct CustomerRolesHelper {
    customers: Arc<CustomerService>,
}

impl CustomerRolesHelper {
    pub fn new(customers: Arc<CustomerService>) -> Self {
        Self { customers }
    }

    /// Roles (hidden ones included) whose id is in `role_ids`.
    pub async fn get_valid_customer_roles(
        &self,
        role_ids: &[i32],
    ) -> Result<Vec<customer_role::Model>, ServiceError> {
        let wanted: BTreeSet<i32> = role_ids.iter().copied().collect();
        Ok(self
            .customers
            .get_all_customer_roles(true)
            .await?
            .into_iter()
            .filter(|role| wanted.contains(&role.id))
            .collect())
    }

    pub fn is_in_guests_and_registered_roles(roles: &[customer_role::Model]) -> bool {
        roles.iter().any(|r| r.has_system_name(system_names::GUESTS))
            && roles.iter().any(|r| r.has_system_name(system_names::REGISTERED))
    }

    /// Messages for the `role_ids` field; empty when the ids are acceptable.
    pub async fn validate_role_ids(&self, role_ids: &[i32]) -> Result<Vec<String>, ServiceError> {
        let mut messages = Vec::new();
        let distinct: BTreeSet<i32> = role_ids.iter().copied().collect();
        let roles = self.get_valid_customer_roles(role_ids).await?;

        if roles.len() != distinct.len() {
            messages.push(INVALID_ROLE_IDS.to_string());
        }
        if Self::is_in_guests_and_registered_roles(&roles) {
            messages.push(GUESTS_AND_REGISTERED.to_string());
        }
        Ok(messages)
    }
}
