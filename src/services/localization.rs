use std::{collections::HashMap, sync::Arc};

use once_cell::sync::Lazy;
use sea_orm::{DatabaseConnection, EntityTrait};
use tracing::instrument;

use crate::{entities::language, errors::ServiceError};

/// Activity log keywords and their resource names.
pub mod activity {
    pub const ADD_NEW_CUSTOMER: &str = "AddNewCustomer";
    pub const UPDATE_CUSTOMER: &str = "UpdateCustomer";
    pub const DELETE_CUSTOMER: &str = "DeleteCustomer";

    pub fn resource_name(keyword: &str) -> String {
        format!("ActivityLog.{keyword}")
    }
}

static RESOURCES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("ActivityLog.AddNewCustomer", "Added a new customer (ID = {0})"),
        ("ActivityLog.UpdateCustomer", "Edited a customer (ID = {0})"),
        ("ActivityLog.DeleteCustomer", "Deleted a customer (ID = {0})"),
    ])
});

#[derive(Clone)]
pub struct LanguageService {
    db: Arc<DatabaseConnection>,
}

impl LanguageService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn get_language_by_id(
        &self,
        id: i32,
    ) -> Result<Option<language::Model>, ServiceError> {
        if id <= 0 {
            return Ok(None);
        }
        Ok(language::Entity::find_by_id(id).one(&*self.db).await?)
    }
}

/// Resource strings. Unknown names resolve to themselves.
#[derive(Clone, Debug, Default)]
pub struct LocalizationService;

impl LocalizationService {
    pub fn new() -> Self {
        Self
    }

    pub fn get_resource(&self, name: &str) -> String {
        RESOURCES
            .get(name)
            .map(|value| value.to_string())
            .unwrap_or_else(|| name.to_string())
    }

    /// Resource with `{0}`, `{1}`... replaced by `args`.
    pub fn format_resource(&self, name: &str, args: &[&dyn std::fmt::Display]) -> String {
        args.iter()
            .enumerate()
            .fold(self.get_resource(name), |acc, (i, arg)| {
                acc.replace(&format!("{{{i}}}"), &arg.to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::memory_db;

    #[test]
    fn resources_format_with_arguments() {
        let svc = LocalizationService::new();
        assert_eq!(
            svc.format_resource(&activity::resource_name(activity::ADD_NEW_CUSTOMER), &[&42]),
            "Added a new customer (ID = 42)"
        );
        assert_eq!(svc.get_resource("Missing.Key"), "Missing.Key");
    }

    #[tokio::test]
    async fn english_is_seeded() {
        let svc = LanguageService::new(memory_db().await);
        let english = svc.get_language_by_id(1).await.unwrap().unwrap();
        assert_eq!(english.language_culture, "en-US");
        assert!(svc.get_language_by_id(2).await.unwrap().is_none());
    }
}
