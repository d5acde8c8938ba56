use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Address, BankAccount, User};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AddressInput {
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: String,
    pub city: String,
    pub postcode: String,
    pub country: String,
}

/// Absent or blank fields leave the stored value untouched. A supplied
/// address replaces the current one.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ProfileInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub address: Option<AddressInput>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Profile {
    pub user: User,
    pub addresses: Vec<Address>,
    pub bank_account: Option<BankAccount>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BecomeSellerRequest {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub bank_account_number: String,
    pub swift_code: String,
    pub payment_type: String,
}
