mod common;

use axum_marketplace_api::{
    dto::{
        cart::UpsertCartRequest,
        products::{CreateProductRequest, UpdateProductRequest},
    },
    entity::{
        cart_items::{ActiveModel as CartActive, Column as CartCol, Entity as CartItems},
        payments::{Column as PaymentCol, Entity as Payments},
    },
    error::AppError,
    routes::params::{OrderListQuery, Pagination},
    services::{
        cart_service, order_service,
        product_service::{self, MAX_PRICE},
    },
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use uuid::Uuid;

fn upsert(product_id: Uuid, qty: i32) -> UpsertCartRequest {
    UpsertCartRequest { product_id, qty }
}

#[tokio::test]
async fn checkout_scenario_totals_snapshots_and_clears_cart() -> anyhow::Result<()> {
    let app = common::setup().await?;
    let state = &app.state;
    let seller = common::register_seller(state, "s@b.com").await?;
    let category = common::create_category(state, &seller, "Goods").await?;
    let p = common::create_product(state, &seller, category, "P", 1000).await?;
    let q = common::create_product(state, &seller, category, "Q", 550).await?;

    let buyer = common::register_buyer(state, "a@b.com").await?;
    cart_service::upsert_cart_item(state, &buyer, upsert(p.id, 2)).await?;
    let cart = cart_service::upsert_cart_item(state, &buyer, upsert(q.id, 1))
        .await?
        .data
        .expect("cart");
    assert_eq!(cart.items.len(), 2);
    assert_eq!(cart.total, 2550);

    let before = order_service::list_orders(state, &buyer, OrderListQuery::default())
        .await?
        .meta
        .and_then(|m| m.total)
        .unwrap_or_default();

    let placed = order_service::place_order(state, &buyer)
        .await?
        .data
        .expect("order");
    assert_eq!(placed.order.amount, 2550);
    assert_eq!(placed.order.status, "pending");
    assert_eq!(placed.order.user_id, buyer.user_id);
    assert!(placed.order.transaction_id.starts_with("TXN-"));
    assert!(placed.order.payment_id.starts_with("PAY-"));
    assert!((10_000_000..=99_999_999).contains(&placed.order.order_ref_number));

    let mut quantities: Vec<(String, i32)> = placed
        .items
        .iter()
        .map(|i| (i.name.clone(), i.quantity))
        .collect();
    quantities.sort();
    assert_eq!(quantities, [("P".to_string(), 2), ("Q".to_string(), 1)]);
    assert!(placed.items.iter().all(|i| i.seller_id == seller.user_id));

    let cart = cart_service::get_cart(state, &buyer).await?.data.expect("cart");
    assert!(cart.items.is_empty());
    assert_eq!(cart.total, 0);

    let after = order_service::list_orders(state, &buyer, OrderListQuery::default())
        .await?
        .meta
        .and_then(|m| m.total)
        .unwrap_or_default();
    assert_eq!(after, before + 1);

    let payment = Payments::find()
        .filter(PaymentCol::TransactionId.eq(placed.order.transaction_id.clone()))
        .one(&state.orm)
        .await?
        .expect("payment row");
    assert_eq!(payment.payment_id, placed.order.payment_id);
    assert_eq!(payment.amount, 2550);
    assert_eq!(payment.capture_method, "manual");
    assert_eq!(payment.status, "pending");

    let fetched = order_service::get_order(state, &buyer, placed.order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(fetched.items.len(), 2);
    assert_eq!(fetched.order.order_ref_number, placed.order.order_ref_number);
    Ok(())
}

#[tokio::test]
async fn order_uses_cart_snapshot_not_live_price() -> anyhow::Result<()> {
    let app = common::setup().await?;
    let state = &app.state;
    let seller = common::register_seller(state, "s@b.com").await?;
    let category = common::create_category(state, &seller, "Goods").await?;
    let product = common::create_product(state, &seller, category, "P", 1000).await?;

    let buyer = common::register_buyer(state, "a@b.com").await?;
    cart_service::upsert_cart_item(state, &buyer, upsert(product.id, 3)).await?;

    product_service::edit_product(
        state,
        &seller,
        product.id,
        UpdateProductRequest {
            name: Some("Renamed".to_string()),
            price: Some(5000),
            ..Default::default()
        },
    )
    .await?;

    let cart = cart_service::get_cart(state, &buyer).await?.data.expect("cart");
    assert_eq!(cart.items[0].price, 1000);
    assert_eq!(cart.items[0].name, "P");

    let placed = order_service::place_order(state, &buyer)
        .await?
        .data
        .expect("order");
    assert_eq!(placed.order.amount, 3000);
    assert_eq!(placed.items[0].price, 1000);
    assert_eq!(placed.items[0].name, "P");
    Ok(())
}

#[tokio::test]
async fn zero_quantity_removes_or_ignores() -> anyhow::Result<()> {
    let app = common::setup().await?;
    let state = &app.state;
    let seller = common::register_seller(state, "s@b.com").await?;
    let category = common::create_category(state, &seller, "Goods").await?;
    let product = common::create_product(state, &seller, category, "P", 1000).await?;
    let buyer = common::register_buyer(state, "a@b.com").await?;

    let cart = cart_service::upsert_cart_item(state, &buyer, upsert(product.id, 0))
        .await?
        .data
        .expect("cart");
    assert!(cart.items.is_empty());

    cart_service::upsert_cart_item(state, &buyer, upsert(product.id, 2)).await?;
    let cart = cart_service::upsert_cart_item(state, &buyer, upsert(product.id, 5))
        .await?
        .data
        .expect("cart");
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 5);
    assert_eq!(cart.total, 5000);

    let cart = cart_service::upsert_cart_item(state, &buyer, upsert(product.id, 0))
        .await?
        .data
        .expect("cart");
    assert!(cart.items.is_empty());
    Ok(())
}

#[tokio::test]
async fn unknown_product_cannot_enter_the_cart() -> anyhow::Result<()> {
    let app = common::setup().await?;
    let buyer = common::register_buyer(&app.state, "a@b.com").await?;

    for product_id in [Uuid::nil(), Uuid::new_v4()] {
        let err = cart_service::upsert_cart_item(&app.state, &buyer, upsert(product_id, 1))
            .await
            .unwrap_err();
        assert!(
            matches!(&err, AppError::Validation(msg) if msg == "product not found to create cart item"),
            "got {err:?}"
        );
    }
    Ok(())
}

#[tokio::test]
async fn empty_cart_cannot_be_ordered() -> anyhow::Result<()> {
    let app = common::setup().await?;
    let buyer = common::register_buyer(&app.state, "a@b.com").await?;

    let err = order_service::place_order(&app.state, &buyer)
        .await
        .unwrap_err();
    assert!(matches!(&err, AppError::Validation(msg) if msg == "cart is empty"));

    let orders = order_service::list_orders(&app.state, &buyer, OrderListQuery::default())
        .await?
        .data
        .expect("orders");
    assert!(orders.items.is_empty());
    Ok(())
}

#[tokio::test]
async fn orders_are_private_to_buyer_and_visible_to_seller() -> anyhow::Result<()> {
    let app = common::setup().await?;
    let state = &app.state;
    let seller = common::register_seller(state, "s@b.com").await?;
    let other_seller = common::register_seller(state, "o@b.com").await?;
    let category = common::create_category(state, &seller, "Goods").await?;
    let product = common::create_product(state, &seller, category, "P", 1000).await?;

    let buyer = common::register_buyer(state, "a@b.com").await?;
    let stranger = common::register_buyer(state, "x@b.com").await?;
    cart_service::upsert_cart_item(state, &buyer, upsert(product.id, 1)).await?;
    let placed = order_service::place_order(state, &buyer)
        .await?
        .data
        .expect("order");

    let err = order_service::get_order(state, &stranger, placed.order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    let lines = order_service::list_seller_order_items(state, &seller, Pagination::default())
        .await?
        .data
        .expect("lines");
    assert_eq!(lines.items.len(), 1);
    let line_id = lines.items[0].id;
    assert_eq!(lines.items[0].order_id, placed.order.id);

    order_service::get_seller_order_item(state, &seller, line_id).await?;
    let err = order_service::get_seller_order_item(state, &other_seller, line_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    let err = order_service::list_seller_order_items(state, &buyer, Pagination::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    // Deleting the product keeps the ordered snapshot.
    product_service::delete_product(state, &seller, product.id).await?;
    let fetched = order_service::get_order(state, &buyer, placed.order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(fetched.items[0].product_id, product.id);
    Ok(())
}

#[tokio::test]
async fn order_list_filters_by_status() -> anyhow::Result<()> {
    let app = common::setup().await?;
    let state = &app.state;
    let seller = common::register_seller(state, "s@b.com").await?;
    let category = common::create_category(state, &seller, "Goods").await?;
    let product = common::create_product(state, &seller, category, "P", 1000).await?;
    let buyer = common::register_buyer(state, "a@b.com").await?;

    for _ in 0..2 {
        cart_service::upsert_cart_item(state, &buyer, upsert(product.id, 1)).await?;
        order_service::place_order(state, &buyer).await?;
    }

    let pending = order_service::list_orders(
        state,
        &buyer,
        OrderListQuery {
            status: Some("pending".to_string()),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(pending.data.expect("orders").items.len(), 2);

    let shipped = order_service::list_orders(
        state,
        &buyer,
        OrderListQuery {
            status: Some("shipped".to_string()),
            ..Default::default()
        },
    )
    .await?;
    assert!(shipped.data.expect("orders").items.is_empty());
    Ok(())
}

#[tokio::test]
async fn simultaneous_checkouts_create_one_order() -> anyhow::Result<()> {
    let app = common::setup().await?;
    let state = &app.state;
    let seller = common::register_seller(state, "s@b.com").await?;
    let category = common::create_category(state, &seller, "Goods").await?;
    let product = common::create_product(state, &seller, category, "P", 1000).await?;
    let buyer = common::register_buyer(state, "a@b.com").await?;
    cart_service::upsert_cart_item(state, &buyer, upsert(product.id, 2)).await?;

    let (first, second) = tokio::join!(
        order_service::place_order(state, &buyer),
        order_service::place_order(state, &buyer),
    );

    let (placed, rejected) = match (first, second) {
        (Ok(placed), Err(err)) | (Err(err), Ok(placed)) => (placed, err),
        (first, second) => panic!("expected one success, got {first:?} and {second:?}"),
    };
    assert_eq!(placed.data.expect("order").order.amount, 2000);
    assert!(
        matches!(&rejected, AppError::Validation(msg) if msg == "cart is empty"),
        "got {rejected:?}"
    );

    let total = order_service::list_orders(state, &buyer, OrderListQuery::default())
        .await?
        .meta
        .and_then(|m| m.total);
    assert_eq!(total, Some(1));

    let cart = cart_service::get_cart(state, &buyer).await?.data.expect("cart");
    assert!(cart.items.is_empty());
    Ok(())
}

#[tokio::test]
async fn oversized_cart_is_refused_before_write() -> anyhow::Result<()> {
    let app = common::setup().await?;
    let state = &app.state;
    let seller = common::register_seller(state, "s@b.com").await?;
    let category = common::create_category(state, &seller, "Goods").await?;
    let product = common::create_product(state, &seller, category, "P", MAX_PRICE).await?;
    let buyer = common::register_buyer(state, "a@b.com").await?;

    let err = cart_service::upsert_cart_item(state, &buyer, upsert(product.id, i32::MAX))
        .await
        .unwrap_err();
    assert!(
        matches!(&err, AppError::Validation(msg) if msg == "cart total out of range"),
        "got {err:?}"
    );
    let cart = cart_service::get_cart(state, &buyer).await?.data.expect("cart");
    assert!(cart.items.is_empty());

    // A line that fits cannot be raised past the limit either.
    cart_service::upsert_cart_item(state, &buyer, upsert(product.id, 1)).await?;
    let err = cart_service::upsert_cart_item(state, &buyer, upsert(product.id, i32::MAX))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    let cart = cart_service::get_cart(state, &buyer).await?.data.expect("cart");
    assert_eq!(cart.items[0].quantity, 1);
    assert_eq!(cart.total, MAX_PRICE);
    Ok(())
}

#[tokio::test]
async fn price_above_cap_is_rejected() -> anyhow::Result<()> {
    let app = common::setup().await?;
    let state = &app.state;
    let seller = common::register_seller(state, "s@b.com").await?;
    let category = common::create_category(state, &seller, "Goods").await?;

    let err = product_service::create_product(
        state,
        &seller,
        CreateProductRequest {
            name: "Gold".to_string(),
            description: None,
            image_url: None,
            category_id: category,
            price: MAX_PRICE + 1,
            stock: 1,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)), "got {err:?}");
    Ok(())
}

#[tokio::test]
async fn overflowing_order_total_leaves_cart_untouched() -> anyhow::Result<()> {
    let app = common::setup().await?;
    let state = &app.state;
    let seller = common::register_seller(state, "s@b.com").await?;
    let category = common::create_category(state, &seller, "Goods").await?;
    let product = common::create_product(state, &seller, category, "P", 1000).await?;
    let buyer = common::register_buyer(state, "a@b.com").await?;

    // Rows written before the price cap existed can still hold huge prices.
    CartActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(buyer.user_id),
        product_id: Set(product.id),
        name: Set("P".to_string()),
        image_url: Set(None),
        seller_id: Set(seller.user_id),
        price: Set(i64::MAX / 2 + 1),
        quantity: Set(2),
        created_at: Set(chrono::Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    let err = order_service::place_order(state, &buyer).await.unwrap_err();
    assert!(
        matches!(&err, AppError::Validation(msg) if msg == "cart total out of range"),
        "got {err:?}"
    );

    let total = order_service::list_orders(state, &buyer, OrderListQuery::default())
        .await?
        .meta
        .and_then(|m| m.total);
    assert_eq!(total, Some(0));

    let lines = CartItems::find()
        .filter(CartCol::UserId.eq(buyer.user_id))
        .count(&state.orm)
        .await?;
    assert_eq!(lines, 1);
    Ok(())
}
