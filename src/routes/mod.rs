use axum::{
    Json, Router,
    http::{StatusCode, Uri},
    routing::get,
};

use crate::{
    response::{ApiResponse, Meta},
    state::AppState,
};

pub mod catalog;
pub mod doc;
pub mod health;
pub mod params;
pub mod seller;
pub mod users;

/// Routes mounted under `/api`. Auth gates are attached per group.
pub fn create_api_router(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/users", users::router(state.clone()))
        .nest("/seller", seller::router(state))
        .nest("/products", catalog::products_router())
        .nest("/categories", catalog::categories_router())
}

/// Full application router without the transport layers added in `main`.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", create_api_router(state.clone()))
        .merge(doc::scalar_docs())
        .fallback(not_found)
        .with_state(state)
}

async fn not_found(uri: Uri) -> (StatusCode, Json<ApiResponse<serde_json::Value>>) {
    let body = ApiResponse::success(
        "Not Found",
        serde_json::json!({ "path": uri.path() }),
        Some(Meta::empty()),
    );
    (StatusCode::NOT_FOUND, Json(body))
}
