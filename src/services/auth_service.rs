use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use password_hash::rand_core::OsRng;
use rand::Rng;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dto::auth::Claims,
    entity::users::UserRole,
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
};

pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const BEARER_SCHEME: &str = "Bearer";

/// Password hashing, bearer tokens and verification codes. Built once from
/// config and shared through `AppState`.
pub struct Authenticator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl: Duration,
    // Checked against when the account is unknown so login costs the same.
    dummy_hash: String,
}

impl Authenticator {
    pub fn new(secret: &str, token_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            token_ttl,
            dummy_hash: dummy_hash(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.jwt_secret, Duration::days(config.jwt_ttl_days))
    }

    pub fn hash_password(&self, plaintext: &str) -> AppResult<String> {
        check_password_length(plaintext)?;
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("password hash failed: {e}")))?
            .to_string();
        Ok(hash)
    }

    pub fn verify_password(&self, plaintext: &str, hash: &str) -> AppResult<()> {
        check_password_length(plaintext)?;
        let parsed = PasswordHash::new(hash)
            .map_err(|_| AppError::unauthorized("password does not match"))?;
        Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .map_err(|_| AppError::unauthorized("password does not match"))
    }

    /// Runs a full argon2 verification that always fails. Used for unknown
    /// accounts so response time does not reveal whether an email exists.
    pub fn reject_unknown_account(&self, plaintext: &str) -> AppError {
        let _ = self.verify_password(plaintext, &self.dummy_hash);
        AppError::unauthorized("password does not match")
    }

    /// Returns the bare JWT; callers prefix it with the bearer scheme when
    /// handing it to clients.
    pub fn issue_token(&self, user_id: Uuid, email: &str, role: UserRole) -> AppResult<String> {
        if user_id.is_nil() || email.trim().is_empty() {
            return Err(AppError::validation(
                "required inputs are missing to generate token",
            ));
        }

        let now = Utc::now();
        let expiration = now
            .checked_add_signed(self.token_ttl)
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role,
            iat: now.timestamp() as usize,
            exp: expiration.timestamp() as usize,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("error on signing token: {e}")))
    }

    /// Parses a raw `Authorization` header value of the form `Bearer <jwt>`.
    pub fn verify_token(&self, header_value: &str) -> AppResult<AuthUser> {
        let parts: Vec<&str> = header_value.split(' ').collect();
        let [scheme, token] = parts.as_slice() else {
            return Err(AppError::unauthorized("Invalid Authorization header"));
        };
        if *scheme != BEARER_SCHEME {
            return Err(AppError::unauthorized("Invalid Authorization scheme"));
        }

        let decoded = decode::<Claims>(
            *token,
            &self.decoding_key,
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|_| AppError::unauthorized("Invalid or expired token"))?;

        let user_id = Uuid::parse_str(&decoded.claims.sub)
            .map_err(|_| AppError::unauthorized("Invalid user id in token"))?;

        Ok(AuthUser {
            user_id,
            email: decoded.claims.email,
            role: decoded.claims.role,
        })
    }

    pub fn bearer(token: &str) -> String {
        format!("{BEARER_SCHEME} {token}")
    }
}

fn dummy_hash() -> String {
    let salt = SaltString::generate(&mut OsRng);
    match Argon2::default().hash_password(b"no-such-account", &salt) {
        Ok(hash) => hash.to_string(),
        Err(err) => {
            tracing::warn!(error = %err, "could not prepare dummy password hash");
            String::new()
        }
    }
}

/// Six digit code for SMS verification. Not a secret; a wrong guess only
/// costs the user another request.
pub fn generate_verification_code() -> i32 {
    rand::thread_rng().gen_range(100_000..=999_999)
}

fn check_password_length(plaintext: &str) -> AppResult<()> {
    if plaintext.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::validation(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }
    Ok(())
}
