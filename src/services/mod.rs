// Customer records
pub mod customer_api;
pub mod customer_roles;
pub mod customers;

// Entity initialization
pub mod factory;

// Supporting platform services
pub mod activity_log;
pub mod addresses;
pub mod directory;
pub mod generic_attributes;
pub mod localization;
pub mod newsletter;
pub mod stores;

// Password hashing
pub mod encryption;

#[cfg(test)]
pub(crate) mod test_support;
