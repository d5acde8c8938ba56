use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, VerifyCodeRequest},
        cart::{CartList, UpsertCartRequest},
        orders::{OrderList, OrderWithItems},
        users::{BecomeSellerRequest, Profile, ProfileInput},
    },
    error::AppResult,
    middleware::auth::{AuthUser, authenticate},
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::{cart_service, order_service, user_service},
    state::AppState,
};

pub fn router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/verify", get(request_code).post(verify_code))
        .route(
            "/profile",
            get(get_profile).post(create_profile).patch(update_profile),
        )
        .route("/cart", get(get_cart).post(upsert_cart))
        .route("/order", get(list_orders).post(place_order))
        .route("/order/{id}", get(get_order))
        .route("/become-seller", post(become_seller))
        .route_layer(from_fn_with_state(state, authenticate));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .merge(protected)
}

#[utoipa::path(
    post,
    path = "/api/users/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered", body = ApiResponse<RegisterResponse>),
        (status = 400, description = "Invalid email or password"),
        (status = 409, description = "Email already registered"),
    ),
    tag = "Users"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<RegisterResponse>>)> {
    let resp = user_service::register(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/users/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid email or password"),
    ),
    tag = "Users"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let resp = user_service::login(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/users/verify",
    responses(
        (status = 200, description = "Verification code sent"),
        (status = 409, description = "Already verified"),
        (status = 502, description = "SMS delivery failed"),
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn request_code(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = user_service::request_verification_code(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/users/verify",
    request_body = VerifyCodeRequest,
    responses(
        (status = 200, description = "Verified"),
        (status = 400, description = "Wrong or expired code"),
        (status = 409, description = "Already verified"),
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn verify_code(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<VerifyCodeRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = user_service::verify_code(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/users/profile",
    responses(
        (status = 200, description = "Profile of the current user", body = ApiResponse<Profile>),
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Profile>>> {
    let resp = user_service::get_profile(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/users/profile",
    request_body = ProfileInput,
    responses(
        (status = 200, description = "Profile created", body = ApiResponse<Profile>),
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn create_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ProfileInput>,
) -> AppResult<Json<ApiResponse<Profile>>> {
    let resp = user_service::create_profile(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/users/profile",
    request_body = ProfileInput,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<Profile>),
        (status = 409, description = "Email already registered"),
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ProfileInput>,
) -> AppResult<Json<ApiResponse<Profile>>> {
    let resp = user_service::update_profile(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/users/cart",
    responses(
        (status = 200, description = "Cart of the current user", body = ApiResponse<CartList>),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CartList>>> {
    let resp = cart_service::get_cart(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/users/cart",
    request_body = UpsertCartRequest,
    responses(
        (status = 200, description = "Cart after the change", body = ApiResponse<CartList>),
        (status = 400, description = "Unknown product"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn upsert_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpsertCartRequest>,
) -> AppResult<Json<ApiResponse<CartList>>> {
    let resp = cart_service::upsert_cart_item(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/users/order",
    responses(
        (status = 201, description = "Order placed from the cart", body = ApiResponse<OrderWithItems>),
        (status = 400, description = "Cart is empty"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn place_order(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<(StatusCode, Json<ApiResponse<OrderWithItems>>)> {
    let resp = order_service::place_order(&state, &user).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/users/order",
    params(OrderListQuery),
    responses(
        (status = 200, description = "Orders of the current user", body = ApiResponse<OrderList>),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/users/order/{id}",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Order with items", body = ApiResponse<OrderWithItems>),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = order_service::get_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/users/become-seller",
    request_body = BecomeSellerRequest,
    responses(
        (status = 200, description = "Seller token", body = ApiResponse<LoginResponse>),
        (status = 409, description = "Already a seller"),
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn become_seller(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<BecomeSellerRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let resp = user_service::become_seller(&state, &user, payload).await?;
    Ok(Json(resp))
}
