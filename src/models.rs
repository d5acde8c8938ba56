use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{
    addresses, bank_accounts, cart_items, categories, order_items, orders, products,
    users::{self, UserRole},
};

/// Public view of a user; never carries the password hash or verification code.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Address {
    pub id: Uuid,
    pub address_line1: String,
    pub address_line2: String,
    pub city: String,
    pub postcode: String,
    pub country: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BankAccount {
    pub id: Uuid,
    pub account_number: String,
    pub swift_code: String,
    pub payment_type: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub image_url: Option<String>,
    pub parent_id: Option<Uuid>,
    pub display_order: i32,
}

/// Prices are minor currency units (cents).
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub category_id: Uuid,
    pub price: i64,
    pub stock: i32,
    pub seller_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub image_url: Option<String>,
    pub seller_id: Uuid,
    pub price: i64,
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    pub amount: i64,
    pub transaction_id: String,
    pub payment_id: String,
    pub order_ref_number: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub seller_id: Uuid,
    pub image_url: Option<String>,
    pub quantity: i32,
    pub price: i64,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            phone: model.phone,
            first_name: model.first_name,
            last_name: model.last_name,
            role: model.role,
            verified: model.verified,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<addresses::Model> for Address {
    fn from(model: addresses::Model) -> Self {
        Self {
            id: model.id,
            address_line1: model.address_line1,
            address_line2: model.address_line2,
            city: model.city,
            postcode: model.postcode,
            country: model.country,
        }
    }
}

impl From<bank_accounts::Model> for BankAccount {
    fn from(model: bank_accounts::Model) -> Self {
        Self {
            id: model.id,
            account_number: model.account_number,
            swift_code: model.swift_code,
            payment_type: model.payment_type,
        }
    }
}

impl From<categories::Model> for Category {
    fn from(model: categories::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            image_url: model.image_url,
            parent_id: model.parent_id,
            display_order: model.display_order,
        }
    }
}

impl From<products::Model> for Product {
    fn from(model: products::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            image_url: model.image_url,
            category_id: model.category_id,
            price: model.price,
            stock: model.stock,
            seller_id: model.seller_id,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<cart_items::Model> for CartItem {
    fn from(model: cart_items::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            name: model.name,
            image_url: model.image_url,
            seller_id: model.seller_id,
            price: model.price,
            quantity: model.quantity,
        }
    }
}

impl From<orders::Model> for Order {
    fn from(model: orders::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            status: model.status,
            amount: model.amount,
            transaction_id: model.transaction_id,
            payment_id: model.payment_id,
            order_ref_number: model.order_ref_number,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<order_items::Model> for OrderItem {
    fn from(model: order_items::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            name: model.name,
            seller_id: model.seller_id,
            image_url: model.image_url,
            quantity: model.quantity,
            price: model.price,
        }
    }
}
