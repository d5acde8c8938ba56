use axum::{
    extract::{FromRequestParts, Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{
    entity::users::UserRole,
    error::{AppError, AppResult},
    state::AppState,
};

/// Identity decoded from a verified bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
}

pub fn ensure_role(user: &AuthUser, role: UserRole) -> Result<(), AppError> {
    if user.role != role {
        tracing::debug!(
            user_id = %user.user_id,
            required = role.as_str(),
            actual = user.role.as_str(),
            "role check failed"
        );
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_seller(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, UserRole::Seller)
}

fn identify(state: &AppState, request: &Request) -> AppResult<AuthUser> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::unauthorized("Authorization required"))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AppError::unauthorized("Invalid Authorization header"))?;

    state.auth.verify_token(auth_str)
}

/// Gate for signed-in routes. Attaches `AuthUser` to the request.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let user = identify(&state, &request)?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Gate for the seller program. Buyers get 403.
pub async fn authenticate_seller(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let user = identify(&state, &request)?;
    match user.role {
        UserRole::Seller => {}
        UserRole::Buyer => {
            tracing::debug!(user_id = %user.user_id, "buyer rejected from seller route");
            return Err(AppError::Forbidden);
        }
    }
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;
    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| AppError::unauthorized("Authorization required"))
    }
}
