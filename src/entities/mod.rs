//! sea-orm entities backing the customer API.

pub mod activity_log;
pub mod address;
pub mod api_client;
pub mod country;
pub mod customer;
pub mod customer_address;
pub mod customer_password;
pub mod customer_role;
pub mod customer_role_mapping;
pub mod generic_attribute;
pub mod language;
pub mod newsletter_subscription;
pub mod store;
