use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    dto::cart::{CartList, UpsertCartRequest},
    entity::{
        cart_items::{ActiveModel as CartActive, Column as CartCol, Entity as CartItems},
        products::Entity as Products,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::CartItem,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn get_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartList>> {
    let cart = load_cart(state, user.user_id).await?;
    Ok(ApiResponse::success("Cart", cart, Some(Meta::empty())))
}

/// Sets the quantity of one cart line. A quantity below 1 removes the line.
pub async fn upsert_cart_item(
    state: &AppState,
    user: &AuthUser,
    payload: UpsertCartRequest,
) -> AppResult<ApiResponse<CartList>> {
    let existing = CartItems::find()
        .filter(
            Condition::all()
                .add(CartCol::UserId.eq(user.user_id))
                .add(CartCol::ProductId.eq(payload.product_id)),
        )
        .one(&state.orm)
        .await?;

    match existing {
        Some(line) if payload.qty < 1 => {
            CartItems::delete_by_id(line.id).exec(&state.orm).await?;
            tracing::debug!(user_id = %user.user_id, product_id = %payload.product_id, "cart line removed");
        }
        Some(line) => {
            ensure_cart_total_fits(state, user.user_id, line.product_id, line.price, payload.qty)
                .await?;
            let mut active: CartActive = line.into();
            active.quantity = Set(payload.qty);
            active.update(&state.orm).await?;
        }
        None if payload.qty < 1 => {}
        None => {
            let product = if payload.product_id.is_nil() {
                None
            } else {
                Products::find_by_id(payload.product_id)
                    .one(&state.orm)
                    .await?
            };
            let product = product
                .ok_or_else(|| AppError::validation("product not found to create cart item"))?;
            ensure_cart_total_fits(state, user.user_id, product.id, product.price, payload.qty)
                .await?;

            CartActive {
                id: Set(Uuid::new_v4()),
                user_id: Set(user.user_id),
                product_id: Set(product.id),
                name: Set(product.name),
                image_url: Set(product.image_url),
                seller_id: Set(product.seller_id),
                price: Set(product.price),
                quantity: Set(payload.qty),
                created_at: Set(Utc::now().into()),
            }
            .insert(&state.orm)
            .await?;
            tracing::debug!(user_id = %user.user_id, product_id = %product.id, "cart line added");
        }
    }

    let cart = load_cart(state, user.user_id).await?;
    Ok(ApiResponse::success(
        "cart updated successfully",
        cart,
        Some(Meta::empty()),
    ))
}

async fn load_cart(state: &AppState, user_id: Uuid) -> AppResult<CartList> {
    let items: Vec<CartItem> = CartItems::find()
        .filter(CartCol::UserId.eq(user_id))
        .order_by_asc(CartCol::CreatedAt)
        .order_by_asc(CartCol::Id)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(CartItem::from)
        .collect();

    let total = cart_total(&items)?;
    Ok(CartList { items, total })
}

/// Rejects a quantity change whose cart total would not fit in `i64` cents,
/// before anything is written.
async fn ensure_cart_total_fits(
    state: &AppState,
    user_id: Uuid,
    product_id: Uuid,
    price: i64,
    qty: i32,
) -> AppResult<()> {
    let others = CartItems::find()
        .filter(
            Condition::all()
                .add(CartCol::UserId.eq(user_id))
                .add(CartCol::ProductId.ne(product_id)),
        )
        .all(&state.orm)
        .await?;

    checked_total(
        others
            .iter()
            .map(|line| (line.price, line.quantity))
            .chain(std::iter::once((price, qty))),
    )?;
    Ok(())
}

pub(crate) fn cart_total(items: &[CartItem]) -> AppResult<i64> {
    checked_total(items.iter().map(|item| (item.price, item.quantity)))
}

/// Σ(price × quantity) over `(price, quantity)` pairs, refusing to overflow.
pub(crate) fn checked_total(lines: impl IntoIterator<Item = (i64, i32)>) -> AppResult<i64> {
    lines.into_iter().try_fold(0_i64, |total, (price, quantity)| {
        price
            .checked_mul(i64::from(quantity))
            .and_then(|line| total.checked_add(line))
            .ok_or_else(|| AppError::validation("cart total out of range"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(price: i64, quantity: i32) -> CartItem {
        CartItem {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            name: "item".into(),
            image_url: None,
            seller_id: Uuid::new_v4(),
            price,
            quantity,
        }
    }

    #[test]
    fn total_is_sum_of_price_times_quantity() {
        let items = vec![line(1000, 2), line(550, 1)];
        assert_eq!(cart_total(&items).unwrap(), 2550);
    }

    #[test]
    fn empty_cart_totals_zero() {
        assert_eq!(cart_total(&[]).unwrap(), 0);
    }

    #[test]
    fn oversized_line_is_rejected_instead_of_wrapping() {
        let items = vec![line(i64::MAX / 2 + 1, 2)];
        let err = cart_total(&items).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg == "cart total out of range"));
    }

    #[test]
    fn overflowing_sum_of_lines_is_rejected() {
        let err = checked_total([(i64::MAX - 10, 1), (11, 1)]).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(checked_total([(i64::MAX - 10, 1), (10, 1)]).unwrap(), i64::MAX);
    }
}
