use chrono::Utc;
use uuid::Uuid;

use crate::entities::customer;

/// Produces a fresh, unsaved entity with its defaults applied.
pub trait Factory<T> {
    fn initialize(&self) -> T;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct CustomerFactory;

impl Factory<customer::Model> for CustomerFactory {
    fn initialize(&self) -> customer::Model {
        let now = Utc::now();
        customer::Model {
            customer_guid: Uuid::new_v4(),
            created_on_utc: now,
            last_activity_date_utc: now,
            active: true,
            ..Default::default()
        }
    }
}
