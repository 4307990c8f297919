//! Customer domain types.

use clove_core::{CustomerId, Membership};

/// A customer's single shipping address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub street: String,
    pub city: String,
}

/// A customer (domain type).
#[derive(Debug, Clone)]
pub struct Customer {
    pub id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub membership: Membership,
    pub address: Option<Address>,
}

/// Input for creating or replacing a customer.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: String,
    pub membership: Membership,
    pub address: Option<Address>,
}
