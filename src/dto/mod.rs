//! Wire types of the customer API.

pub mod addresses;
pub mod customers;
pub mod delta;

pub use addresses::AddressDto;
pub use customers::{
    CustomerDto, CustomerFieldsParameters, CustomerPayload, CustomersCountRootObject,
    CustomersParameters,
    CustomersRootObject, CustomersSearchParameters,
};
pub use delta::{Delta, MergeInto};
