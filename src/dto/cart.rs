use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::CartItem;

/// `qty` below 1 removes the line.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpsertCartRequest {
    pub product_id: Uuid,
    pub qty: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartList {
    pub items: Vec<CartItem>,
    pub total: i64,
}
