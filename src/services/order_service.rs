use chrono::Utc;
use rand::Rng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use sea_orm::sea_query::LockType;
use uuid::Uuid;

use crate::{
    dto::orders::{OrderList, OrderWithItems, SellerOrderItemList},
    entity::{
        cart_items::{Column as CartCol, Entity as CartItems},
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        payments::ActiveModel as PaymentActive,
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_seller},
    models::{Order, OrderItem},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, Pagination, SortOrder},
    services::cart_service::checked_total,
    state::AppState,
};

pub const ORDER_STATUS_PENDING: &str = "pending";
pub const PAYMENT_STATUS_PENDING: &str = "pending";
pub const CAPTURE_METHOD_MANUAL: &str = "manual";

/// Turns the caller's cart into an order. Everything happens in one
/// transaction; the user row lock serializes concurrent checkouts.
pub async fn place_order(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let txn = state.orm.begin().await?;

    Users::find_by_id(user.user_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::unauthorized("user no longer exists"))?;

    let lines = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .order_by_asc(CartCol::CreatedAt)
        .order_by_asc(CartCol::Id)
        .lock(LockType::Update)
        .all(&txn)
        .await?;

    if lines.is_empty() {
        return Err(AppError::validation("cart is empty"));
    }

    let amount = checked_total(lines.iter().map(|line| (line.price, line.quantity)))?;
    let line_ids: Vec<Uuid> = lines.iter().map(|line| line.id).collect();
    let transaction_id = placeholder_id("TXN");
    let payment_id = placeholder_id("PAY");
    let now = Utc::now();

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        status: Set(ORDER_STATUS_PENDING.to_string()),
        amount: Set(amount),
        transaction_id: Set(transaction_id.clone()),
        payment_id: Set(payment_id.clone()),
        order_ref_number: Set(order_ref_number()),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(lines.len());
    for line in lines {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            name: Set(line.name),
            seller_id: Set(line.seller_id),
            image_url: Set(line.image_url),
            quantity: Set(line.quantity),
            price: Set(line.price),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;
        items.push(OrderItem::from(item));
    }

    PaymentActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        capture_method: Set(CAPTURE_METHOD_MANUAL.to_string()),
        amount: Set(amount),
        transaction_id: Set(transaction_id),
        customer_id: Set(None),
        payment_id: Set(payment_id),
        status: Set(PAYMENT_STATUS_PENDING.to_string()),
        response: Set(None),
        created_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    // Only the lines read above; anything added meanwhile stays in the cart.
    CartItems::delete_many()
        .filter(CartCol::Id.is_in(line_ids))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!(
        order_id = %order.id,
        user_id = %user.user_id,
        amount = order.amount,
        ref_number = order.order_ref_number,
        "order placed"
    );

    Ok(ApiResponse::success(
        "order created successfully",
        OrderWithItems {
            order: order.into(),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

/// Someone else's order is reported as missing.
pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find_by_id(id)
        .filter(OrderCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let items = order
        .find_related(OrderItems)
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: order.into(),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_seller_order_items(
    state: &AppState,
    seller: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<SellerOrderItemList>> {
    ensure_seller(seller)?;
    let (page, limit, offset) = pagination.normalize();
    let finder = OrderItems::find()
        .filter(OrderItemCol::SellerId.eq(seller.user_id))
        .order_by_desc(OrderItemCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Seller orders",
        SellerOrderItemList { items },
        Some(meta),
    ))
}

pub async fn get_seller_order_item(
    state: &AppState,
    seller: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderItem>> {
    ensure_seller(seller)?;
    let item = OrderItems::find_by_id(id)
        .filter(OrderItemCol::SellerId.eq(seller.user_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(ApiResponse::success("OK", item.into(), Some(Meta::empty())))
}

fn placeholder_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().simple())
}

fn order_ref_number() -> i64 {
    rand::thread_rng().gen_range(10_000_000..=99_999_999)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_ids_carry_prefix_and_32_hex_digits() {
        let id = placeholder_id("TXN");
        let (prefix, hex) = id.split_once('-').expect("dash");
        assert_eq!(prefix, "TXN");
        assert_eq!(hex.len(), 32);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(placeholder_id("PAY"), placeholder_id("PAY"));
    }

    #[test]
    fn ref_numbers_have_eight_digits() {
        for _ in 0..500 {
            let n = order_ref_number();
            assert_eq!(n.to_string().len(), 8);
        }
    }
}
