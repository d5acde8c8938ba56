#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum_marketplace_api::{
    dto::{
        auth::RegisterRequest,
        catalog::CreateCategoryRequest,
        products::CreateProductRequest,
        users::BecomeSellerRequest,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    migration::Migrator,
    models::Product,
    notification::SmsSender,
    services::{auth_service::Authenticator, catalog_service, product_service, user_service},
    state::AppState,
};
use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

pub const TEST_SECRET: &str = "test-secret";

/// Records every message instead of sending it. Can be switched to fail.
#[derive(Default)]
pub struct RecordingSms {
    sent: Mutex<Vec<(String, String)>>,
    fail: Mutex<bool>,
}

impl RecordingSms {
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().expect("sms lock").clone()
    }

    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock().expect("sms lock") = fail;
    }

    /// Pulls the six digit code out of the last message.
    pub fn last_code(&self) -> Option<i32> {
        let sent = self.sent();
        let (_, message) = sent.last()?;
        message.rsplit(' ').next()?.parse().ok()
    }
}

#[async_trait]
impl SmsSender for RecordingSms {
    async fn send_sms(&self, phone: &str, message: &str) -> AppResult<()> {
        self.sent
            .lock()
            .expect("sms lock")
            .push((phone.to_string(), message.to_string()));
        if *self.fail.lock().expect("sms lock") {
            return Err(AppError::ExternalService("sms provider unavailable".into()));
        }
        Ok(())
    }
}

pub struct TestApp {
    pub state: AppState,
    pub sms: Arc<RecordingSms>,
}

pub async fn setup() -> anyhow::Result<TestApp> {
    let orm = Database::connect("sqlite::memory:").await?;
    Migrator::up(&orm, None).await?;

    let sms = Arc::new(RecordingSms::default());
    let state = AppState {
        orm,
        auth: Arc::new(Authenticator::new(TEST_SECRET, chrono::Duration::days(30))),
        sms: sms.clone(),
    };
    Ok(TestApp { state, sms })
}

pub fn identity(state: &AppState, token: &str) -> AuthUser {
    state.auth.verify_token(token).expect("valid token")
}

/// Registers a buyer and returns the identity carried by the issued token.
pub async fn register_buyer(state: &AppState, email: &str) -> anyhow::Result<AuthUser> {
    let resp = user_service::register(
        state,
        RegisterRequest {
            email: email.to_string(),
            password: "secret1".to_string(),
            phone: "+15550001111".to_string(),
        },
    )
    .await?;
    let token = resp.data.expect("register data").token;
    Ok(identity(state, &token))
}

pub async fn register_seller(state: &AppState, email: &str) -> anyhow::Result<AuthUser> {
    let buyer = register_buyer(state, email).await?;
    let resp = user_service::become_seller(
        state,
        &buyer,
        BecomeSellerRequest {
            first_name: "Sam".to_string(),
            last_name: "Seller".to_string(),
            phone_number: "+15550002222".to_string(),
            bank_account_number: "123456789".to_string(),
            swift_code: "TESTUS33".to_string(),
            payment_type: "bank_transfer".to_string(),
        },
    )
    .await?;
    let token = resp.data.expect("seller data").token;
    Ok(identity(state, &token))
}

pub async fn create_category(state: &AppState, seller: &AuthUser, name: &str) -> anyhow::Result<Uuid> {
    let resp = catalog_service::create_category(
        state,
        seller,
        CreateCategoryRequest {
            name: name.to_string(),
            image_url: None,
            parent_id: None,
            display_order: 0,
        },
    )
    .await?;
    Ok(resp.data.expect("category data").id)
}

pub async fn create_product(
    state: &AppState,
    seller: &AuthUser,
    category_id: Uuid,
    name: &str,
    price: i64,
) -> anyhow::Result<Product> {
    let resp = product_service::create_product(
        state,
        seller,
        CreateProductRequest {
            name: name.to_string(),
            description: Some(format!("{name} description")),
            image_url: None,
            category_id,
            price,
            stock: 10,
        },
    )
    .await?;
    Ok(resp.data.expect("product data"))
}
