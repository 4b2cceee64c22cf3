pub mod common;
pub mod customers;
pub mod health;

use std::sync::Arc;

use crate::{
    auth::ClientService,
    config::AppConfig,
    db::DbPool,
    services::{
        activity_log::CustomerActivityService,
        addresses::AddressService,
        customer_api::CustomerApiService,
        customer_roles::CustomerRolesHelper,
        customers::CustomerService,
        directory::CountryService,
        encryption::EncryptionService,
        factory::CustomerFactory,
        generic_attributes::GenericAttributeService,
        localization::{LanguageService, LocalizationService},
        newsletter::NewsLetterSubscriptionService,
        stores::StoreService,
    },
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer used by the HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub customers: Arc<CustomerService>,
    pub customer_api: Arc<CustomerApiService>,
    pub customer_roles: Arc<CustomerRolesHelper>,
    pub customer_factory: CustomerFactory,
    pub addresses: Arc<AddressService>,
    pub attributes: Arc<GenericAttributeService>,
    pub countries: Arc<CountryService>,
    pub languages: Arc<LanguageService>,
    pub localization: Arc<LocalizationService>,
    pub stores: Arc<StoreService>,
    pub newsletter: Arc<NewsLetterSubscriptionService>,
    pub activity: Arc<CustomerActivityService>,
    pub encryption: Arc<EncryptionService>,
    pub clients: Arc<ClientService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, config: &AppConfig) -> Self {
        let customers = Arc::new(CustomerService::new(db_pool.clone()));
        let attributes = Arc::new(GenericAttributeService::new(db_pool.clone()));
        let countries = Arc::new(CountryService::new(db_pool.clone()));
        let customer_api = Arc::new(CustomerApiService::new(
            db_pool.clone(),
            customers.clone(),
            attributes.clone(),
            countries.clone(),
        ));

        Self {
            customer_roles: Arc::new(CustomerRolesHelper::new(customers.clone())),
            customer_factory: CustomerFactory,
            addresses: Arc::new(AddressService::new(db_pool.clone())),
            languages: Arc::new(LanguageService::new(db_pool.clone())),
            localization: Arc::new(LocalizationService::new()),
            stores: Arc::new(StoreService::new(db_pool.clone())),
            newsletter: Arc::new(NewsLetterSubscriptionService::new(db_pool.clone())),
            activity: Arc::new(CustomerActivityService::new(db_pool.clone())),
            encryption: Arc::new(EncryptionService::new()),
            clients: Arc::new(ClientService::new(
                db_pool,
                config.api.restricted_client_ids(),
            )),
            customers,
            customer_api,
            attributes,
            countries,
        }
    }
}
