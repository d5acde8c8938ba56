mod common;

use axum_marketplace_api::{
    dto::{
        auth::{LoginRequest, RegisterRequest},
        users::{AddressInput, BecomeSellerRequest, ProfileInput},
    },
    entity::{
        bank_accounts::{Column as BankCol, Entity as BankAccounts},
        users::UserRole,
    },
    error::AppError,
    services::user_service,
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

fn login_request(email: &str, password: &str) -> LoginRequest {
    LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
    }
}

#[tokio::test]
async fn register_then_login_issues_buyer_token() -> anyhow::Result<()> {
    let app = common::setup().await?;
    let state = &app.state;

    let registered = user_service::register(
        state,
        RegisterRequest {
            email: "A@B.com".to_string(),
            password: "secret1".to_string(),
            phone: "+15550001111".to_string(),
        },
    )
    .await?;
    let registered = registered.data.expect("register data");
    assert_eq!(registered.user.email, "a@b.com");
    assert_eq!(registered.user.role, UserRole::Buyer);
    assert!(!registered.user.verified);
    assert!(registered.token.starts_with("Bearer "));

    let login = user_service::login(state, login_request("a@b.com", "secret1")).await?;
    let token = login.data.expect("login data").token;
    let identity = common::identity(state, &token);
    assert_eq!(identity.user_id, registered.user.id);
    assert_eq!(identity.role, UserRole::Buyer);
    assert_eq!(identity.email, "a@b.com");
    Ok(())
}

#[tokio::test]
async fn login_failures_share_one_message() -> anyhow::Result<()> {
    let app = common::setup().await?;
    common::register_buyer(&app.state, "a@b.com").await?;

    let wrong_password = user_service::login(&app.state, login_request("a@b.com", "secret2"))
        .await
        .unwrap_err();
    let unknown_email = user_service::login(&app.state, login_request("x@b.com", "secret1"))
        .await
        .unwrap_err();
    let short_password = user_service::login(&app.state, login_request("a@b.com", "abc"))
        .await
        .unwrap_err();

    for err in [&wrong_password, &unknown_email, &short_password] {
        assert!(matches!(err, AppError::Unauthorized(_)), "got {err:?}");
    }
    assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    assert_eq!(wrong_password.to_string(), short_password.to_string());
    Ok(())
}

#[tokio::test]
async fn register_rejects_duplicates_and_bad_input() -> anyhow::Result<()> {
    let app = common::setup().await?;
    common::register_buyer(&app.state, "a@b.com").await?;

    let register = |email: &str, password: &str| RegisterRequest {
        email: email.to_string(),
        password: password.to_string(),
        phone: "+15550001111".to_string(),
    };

    let duplicate = user_service::register(&app.state, register("a@b.com", "secret1"))
        .await
        .unwrap_err();
    assert!(matches!(duplicate, AppError::Conflict(_)));

    let bad_email = user_service::register(&app.state, register("not-an-email", "secret1"))
        .await
        .unwrap_err();
    assert!(matches!(bad_email, AppError::Validation(_)));

    let weak = user_service::register(&app.state, register("c@d.com", "123"))
        .await
        .unwrap_err();
    assert!(matches!(weak, AppError::Validation(_)));
    Ok(())
}

#[tokio::test]
async fn profile_updates_only_supplied_fields() -> anyhow::Result<()> {
    let app = common::setup().await?;
    let user = common::register_buyer(&app.state, "a@b.com").await?;

    user_service::create_profile(
        &app.state,
        &user,
        ProfileInput {
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            email: None,
            address: Some(AddressInput {
                address_line1: "1 Main St".to_string(),
                address_line2: String::new(),
                city: "London".to_string(),
                postcode: "N1".to_string(),
                country: "UK".to_string(),
            }),
        },
    )
    .await?;

    let updated = user_service::update_profile(
        &app.state,
        &user,
        ProfileInput {
            last_name: Some("  ".to_string()),
            address: Some(AddressInput {
                address_line1: "2 High St".to_string(),
                address_line2: "Flat 3".to_string(),
                city: "Leeds".to_string(),
                postcode: "LS1".to_string(),
                country: "UK".to_string(),
            }),
            ..Default::default()
        },
    )
    .await?;
    let profile = updated.data.expect("profile");
    assert_eq!(profile.user.first_name, "Ada");
    assert_eq!(profile.user.last_name, "Lovelace");
    assert_eq!(profile.addresses.len(), 1);
    assert_eq!(profile.addresses[0].city, "Leeds");
    assert!(profile.bank_account.is_none());
    Ok(())
}

#[tokio::test]
async fn profile_email_change_checks_uniqueness() -> anyhow::Result<()> {
    let app = common::setup().await?;
    common::register_buyer(&app.state, "taken@b.com").await?;
    let user = common::register_buyer(&app.state, "a@b.com").await?;

    let err = user_service::update_profile(
        &app.state,
        &user,
        ProfileInput {
            email: Some("taken@b.com".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let resp = user_service::update_profile(
        &app.state,
        &user,
        ProfileInput {
            email: Some("new@b.com".to_string()),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(resp.data.expect("profile").user.email, "new@b.com");
    Ok(())
}

#[tokio::test]
async fn become_seller_reissues_token_once() -> anyhow::Result<()> {
    let app = common::setup().await?;
    let seller = common::register_seller(&app.state, "s@b.com").await?;
    assert_eq!(seller.role, UserRole::Seller);

    let profile = user_service::get_profile(&app.state, &seller)
        .await?
        .data
        .expect("profile");
    assert_eq!(profile.user.role, UserRole::Seller);
    assert_eq!(profile.user.first_name, "Sam");
    assert_eq!(profile.user.phone, "+15550002222");
    let bank = profile.bank_account.expect("bank account");
    assert_eq!(bank.swift_code, "TESTUS33");

    let again = user_service::become_seller(
        &app.state,
        &seller,
        BecomeSellerRequest {
            first_name: "Sam".to_string(),
            last_name: "Seller".to_string(),
            phone_number: "+15550002222".to_string(),
            bank_account_number: "987654321".to_string(),
            swift_code: "TESTUS33".to_string(),
            payment_type: "bank_transfer".to_string(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(again, AppError::Conflict(_)));
    Ok(())
}

fn seller_request(account: &str) -> BecomeSellerRequest {
    BecomeSellerRequest {
        first_name: "Sam".to_string(),
        last_name: "Seller".to_string(),
        phone_number: "+15550002222".to_string(),
        bank_account_number: account.to_string(),
        swift_code: "TESTUS33".to_string(),
        payment_type: "bank_transfer".to_string(),
    }
}

#[tokio::test]
async fn simultaneous_upgrades_keep_one_bank_account() -> anyhow::Result<()> {
    let app = common::setup().await?;
    let state = &app.state;
    let buyer = common::register_buyer(state, "a@b.com").await?;

    let (first, second) = tokio::join!(
        user_service::become_seller(state, &buyer, seller_request("111111111")),
        user_service::become_seller(state, &buyer, seller_request("222222222")),
    );

    let rejected = match (first, second) {
        (Ok(_), Err(err)) | (Err(err), Ok(_)) => err,
        (first, second) => panic!("expected one success, got {first:?} and {second:?}"),
    };
    assert!(matches!(rejected, AppError::Conflict(_)), "got {rejected:?}");

    let accounts = BankAccounts::find()
        .filter(BankCol::UserId.eq(buyer.user_id))
        .count(&state.orm)
        .await?;
    assert_eq!(accounts, 1);
    Ok(())
}
