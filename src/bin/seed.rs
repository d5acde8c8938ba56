use std::sync::Arc;

use axum_marketplace_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    dto::{
        auth::{LoginRequest, RegisterRequest},
        catalog::CreateCategoryRequest,
        products::CreateProductRequest,
        users::BecomeSellerRequest,
    },
    error::AppError,
    middleware::auth::AuthUser,
    notification::LogSms,
    services::{auth_service::Authenticator, catalog_service, product_service, user_service},
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url, config.db_max_connections).await?;
    run_migrations(&orm).await?;

    let state = AppState {
        orm,
        auth: Arc::new(Authenticator::from_config(&config)),
        sms: Arc::new(LogSms),
    };

    let buyer = ensure_user(&state, "buyer@example.com", "buyer123", "+15550000001").await?;
    let mut seller = ensure_user(&state, "seller@example.com", "seller123", "+15550000002").await?;
    seller = ensure_seller(&state, seller).await?;

    let categories = [("Apparel", 1), ("Accessories", 2), ("Books", 3)];
    let mut category_ids = Vec::new();
    for (name, display_order) in categories {
        let created = catalog_service::create_category(
            &state,
            &seller,
            CreateCategoryRequest {
                name: name.to_string(),
                image_url: None,
                parent_id: None,
                display_order,
            },
        )
        .await?;
        if let Some(category) = created.data {
            category_ids.push(category.id);
        }
    }
    println!("Seeded {} categories", category_ids.len());

    let products = [
        ("Axum Hoodie", "Warm hoodie for Rustaceans", 5500, 50, 0),
        ("Ferris Mug", "Coffee tastes better with Ferris", 1200, 100, 1),
        ("Rust Sticker Pack", "Decorate your laptop", 500, 200, 1),
        ("E-book: Async Rust", "Learn async Rust patterns", 2500, 75, 2),
    ];
    for (name, description, price, stock, category) in products {
        let Some(&category_id) = category_ids.get(category) else {
            continue;
        };
        product_service::create_product(
            &state,
            &seller,
            CreateProductRequest {
                name: name.to_string(),
                description: Some(description.to_string()),
                image_url: None,
                category_id,
                price,
                stock,
            },
        )
        .await?;
    }
    println!("Seeded products");

    println!(
        "Seed completed. Seller ID: {}, Buyer ID: {}",
        seller.user_id, buyer.user_id
    );
    Ok(())
}

async fn ensure_user(
    state: &AppState,
    email: &str,
    password: &str,
    phone: &str,
) -> anyhow::Result<AuthUser> {
    let registered = user_service::register(
        state,
        RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            phone: phone.to_string(),
        },
    )
    .await;

    let token = match registered {
        Ok(resp) => resp.data.map(|d| d.token),
        Err(AppError::Conflict(_)) => {
            let resp = user_service::login(
                state,
                LoginRequest {
                    email: email.to_string(),
                    password: password.to_string(),
                },
            )
            .await?;
            resp.data.map(|d| d.token)
        }
        Err(err) => return Err(err.into()),
    };

    let token = token.ok_or_else(|| anyhow::anyhow!("no token issued for {email}"))?;
    println!("Ensured user {email}");
    Ok(state.auth.verify_token(&token)?)
}

async fn ensure_seller(state: &AppState, user: AuthUser) -> anyhow::Result<AuthUser> {
    let joined = user_service::become_seller(
        state,
        &user,
        BecomeSellerRequest {
            first_name: "Demo".to_string(),
            last_name: "Seller".to_string(),
            phone_number: "+15550000002".to_string(),
            bank_account_number: "000123456789".to_string(),
            swift_code: "DEMOUS33".to_string(),
            payment_type: "bank_transfer".to_string(),
        },
    )
    .await;

    match joined {
        Ok(resp) => {
            let token = resp
                .data
                .map(|d| d.token)
                .ok_or_else(|| anyhow::anyhow!("no seller token issued"))?;
            Ok(state.auth.verify_token(&token)?)
        }
        Err(AppError::Conflict(_)) => Ok(user),
        Err(err) => Err(err.into()),
    }
}
