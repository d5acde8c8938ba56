use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QuerySelect, Set, TransactionTrait,
};
use sea_orm::sea_query::LockType;
use uuid::Uuid;

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, VerifyCodeRequest},
        users::{AddressInput, BecomeSellerRequest, Profile, ProfileInput},
    },
    entity::{
        addresses::{ActiveModel as AddressActive, Column as AddressCol, Entity as Addresses},
        bank_accounts::{ActiveModel as BankAccountActive, Column as BankCol, Entity as BankAccounts},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel, UserRole},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    services::auth_service::{Authenticator, generate_verification_code},
    state::AppState,
};

pub const VERIFICATION_CODE_TTL_MINUTES: i64 = 30;

pub async fn register(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<RegisterResponse>> {
    let RegisterRequest {
        email,
        password,
        phone,
    } = payload;
    let email = normalize_email(&email)?;

    let password_hash = state.auth.hash_password(&password)?;

    if email_taken(state, &email).await? {
        return Err(AppError::conflict("Email is already taken"));
    }

    let now = Utc::now();
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        password_hash: Set(password_hash),
        phone: Set(phone.trim().to_string()),
        first_name: Set(String::new()),
        last_name: Set(String::new()),
        role: Set(UserRole::Buyer),
        verification_code: Set(None),
        code_expires_at: Set(None),
        verified: Set(false),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    let token = state.auth.issue_token(user.id, &user.email, user.role)?;
    tracing::info!(user_id = %user.id, "user registered");

    Ok(ApiResponse::success(
        "Register",
        RegisterResponse {
            token: Authenticator::bearer(&token),
            user: user.into(),
        },
        Some(Meta::empty()),
    ))
}

pub async fn login(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { email, password } = payload;
    let invalid = || AppError::unauthorized("Invalid email or password");

    let Some(user) = Users::find()
        .filter(UserCol::Email.eq(email.trim().to_lowercase()))
        .one(&state.orm)
        .await?
    else {
        state.auth.reject_unknown_account(&password);
        return Err(invalid());
    };

    state
        .auth
        .verify_password(&password, &user.password_hash)
        .map_err(|_| invalid())?;

    let token = state.auth.issue_token(user.id, &user.email, user.role)?;
    tracing::info!(user_id = %user.id, "user logged in");

    Ok(ApiResponse::success(
        "Login",
        LoginResponse {
            token: Authenticator::bearer(&token),
        },
        Some(Meta::empty()),
    ))
}

/// Stores a fresh code and texts it to the user. The stored code survives a
/// failed delivery so a later verify can still succeed.
pub async fn request_verification_code(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let existing = find_user(state, user.user_id).await?;
    if existing.verified {
        return Err(AppError::conflict("user already verified"));
    }

    let code = generate_verification_code();
    let now = Utc::now();
    let expires_at = now + Duration::minutes(VERIFICATION_CODE_TTL_MINUTES);

    let phone = existing.phone.clone();
    let mut active: UserActive = existing.into();
    active.verification_code = Set(Some(code));
    active.code_expires_at = Set(Some(expires_at.into()));
    active.updated_at = Set(now.into());
    active.update(&state.orm).await?;

    let message = format!("Your verification code is: {code}");
    state.sms.send_sms(&phone, &message).await?;

    Ok(ApiResponse::success(
        "the user now has a verification code",
        serde_json::json!({ "expires_at": expires_at }),
        Some(Meta::empty()),
    ))
}

pub async fn verify_code(
    state: &AppState,
    user: &AuthUser,
    payload: VerifyCodeRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let existing = find_user(state, user.user_id).await?;
    if existing.verified {
        return Err(AppError::conflict("user already verified"));
    }

    if existing.verification_code != Some(payload.code) {
        return Err(AppError::validation("verification code incorrect"));
    }

    let now = Utc::now();
    let expired = existing
        .code_expires_at
        .is_none_or(|expires_at| now >= expires_at.with_timezone(&Utc));
    if expired {
        return Err(AppError::Expired("verification code expired".into()));
    }

    let mut active: UserActive = existing.into();
    active.verified = Set(true);
    active.verification_code = Set(None);
    active.code_expires_at = Set(None);
    active.updated_at = Set(now.into());
    active.update(&state.orm).await?;

    tracing::info!(user_id = %user.user_id, "user verified");
    Ok(ApiResponse::success(
        "Verified Successfully",
        serde_json::json!({ "verified": true }),
        Some(Meta::empty()),
    ))
}

pub async fn get_profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Profile>> {
    let profile = load_profile(state, user.user_id).await?;
    Ok(ApiResponse::success("get profile", profile, Some(Meta::empty())))
}

pub async fn create_profile(
    state: &AppState,
    user: &AuthUser,
    payload: ProfileInput,
) -> AppResult<ApiResponse<Profile>> {
    let input = ProfileInput {
        email: None,
        ..payload
    };
    save_profile(state, user.user_id, input).await?;
    let profile = load_profile(state, user.user_id).await?;
    Ok(ApiResponse::success(
        "profile created successfully",
        profile,
        Some(Meta::empty()),
    ))
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: ProfileInput,
) -> AppResult<ApiResponse<Profile>> {
    save_profile(state, user.user_id, payload).await?;
    let profile = load_profile(state, user.user_id).await?;
    Ok(ApiResponse::success(
        "profile updated successfully",
        profile,
        Some(Meta::empty()),
    ))
}

pub async fn become_seller(
    state: &AppState,
    user: &AuthUser,
    payload: BecomeSellerRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let now = Utc::now();
    let txn = state.orm.begin().await?;

    // Role is re-read under the row lock so two upgrades cannot both pass.
    let existing = Users::find_by_id(user.user_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    if existing.role == UserRole::Seller {
        return Err(AppError::conflict(
            "you have already joined the seller program",
        ));
    }

    let mut active: UserActive = existing.into();
    active.role = Set(UserRole::Seller);
    if let Some(first_name) = non_blank(Some(payload.first_name)) {
        active.first_name = Set(first_name);
    }
    if let Some(last_name) = non_blank(Some(payload.last_name)) {
        active.last_name = Set(last_name);
    }
    if let Some(phone) = non_blank(Some(payload.phone_number)) {
        active.phone = Set(phone);
    }
    active.updated_at = Set(now.into());
    let seller = active.update(&txn).await?;

    BankAccountActive {
        id: Set(Uuid::new_v4()),
        account_number: Set(payload.bank_account_number),
        swift_code: Set(payload.swift_code),
        payment_type: Set(payload.payment_type),
        user_id: Set(seller.id),
        created_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    let token = state.auth.issue_token(seller.id, &seller.email, seller.role)?;
    tracing::info!(user_id = %seller.id, "user joined the seller program");

    Ok(ApiResponse::success(
        "become seller",
        LoginResponse {
            token: Authenticator::bearer(&token),
        },
        Some(Meta::empty()),
    ))
}

async fn save_profile(state: &AppState, user_id: Uuid, input: ProfileInput) -> AppResult<()> {
    let existing = find_user(state, user_id).await?;

    let new_email = match non_blank(input.email) {
        Some(email) => {
            let email = normalize_email(&email)?;
            if email != existing.email && email_taken(state, &email).await? {
                return Err(AppError::conflict("Email is already taken"));
            }
            Some(email)
        }
        None => None,
    };

    let now = Utc::now();
    let txn = state.orm.begin().await?;

    let mut active: UserActive = existing.into();
    if let Some(first_name) = non_blank(input.first_name) {
        active.first_name = Set(first_name);
    }
    if let Some(last_name) = non_blank(input.last_name) {
        active.last_name = Set(last_name);
    }
    if let Some(email) = new_email {
        active.email = Set(email);
    }
    active.updated_at = Set(now.into());
    active.update(&txn).await?;

    if let Some(address) = input.address {
        replace_address(&txn, user_id, address).await?;
    }

    txn.commit().await?;
    Ok(())
}

async fn replace_address<C>(conn: &C, user_id: Uuid, input: AddressInput) -> AppResult<()>
where
    C: sea_orm::ConnectionTrait,
{
    if input.address_line1.trim().is_empty() || input.city.trim().is_empty() {
        return Err(AppError::validation("address line 1 and city are required"));
    }

    Addresses::delete_many()
        .filter(AddressCol::UserId.eq(user_id))
        .exec(conn)
        .await?;

    let now = Utc::now();
    AddressActive {
        id: Set(Uuid::new_v4()),
        address_line1: Set(input.address_line1),
        address_line2: Set(input.address_line2),
        city: Set(input.city),
        postcode: Set(input.postcode),
        country: Set(input.country),
        user_id: Set(user_id),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(conn)
    .await?;

    Ok(())
}

async fn load_profile(state: &AppState, user_id: Uuid) -> AppResult<Profile> {
    let user = find_user(state, user_id).await?;

    let addresses = Addresses::find()
        .filter(AddressCol::UserId.eq(user_id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    let bank_account = BankAccounts::find()
        .filter(BankCol::UserId.eq(user_id))
        .one(&state.orm)
        .await?
        .map(Into::into);

    Ok(Profile {
        user: user.into(),
        addresses,
        bank_account,
    })
}

async fn find_user(state: &AppState, user_id: Uuid) -> AppResult<UserModel> {
    Users::find_by_id(user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)
}

async fn email_taken(state: &AppState, email: &str) -> AppResult<bool> {
    let exist = Users::find()
        .filter(UserCol::Email.eq(email))
        .one(&state.orm)
        .await?;
    Ok(exist.is_some())
}

fn normalize_email(raw: &str) -> AppResult<String> {
    let email = raw.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(AppError::validation("please provide a valid email")),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
