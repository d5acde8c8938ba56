use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use sea_orm::sea_query::Expr;
use uuid::Uuid;

use crate::{
    dto::catalog::{CategoryList, CategoryWithProducts, CreateCategoryRequest, UpdateCategoryRequest},
    entity::{
        categories::{ActiveModel, Column, Entity as Categories, Model as CategoryModel},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_seller},
    models::Category,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let items = Categories::find()
        .order_by_asc(Column::DisplayOrder)
        .order_by_asc(Column::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Category::from)
        .collect();

    Ok(ApiResponse::success(
        "categories",
        CategoryList { items },
        Some(Meta::empty()),
    ))
}

pub async fn get_category(
    state: &AppState,
    id: Uuid,
) -> AppResult<ApiResponse<CategoryWithProducts>> {
    let found = Categories::find_by_id(id)
        .find_with_related(Products)
        .order_by_asc(ProdCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let (category, products) = match found.into_iter().next() {
        Some(pair) => pair,
        None => return Err(AppError::NotFound),
    };

    Ok(ApiResponse::success(
        "category",
        CategoryWithProducts {
            category: category.into(),
            products: products.into_iter().map(Into::into).collect(),
        },
        Some(Meta::empty()),
    ))
}

pub async fn create_category(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    ensure_seller(user)?;
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::validation("category name is required"));
    }
    if let Some(parent_id) = payload.parent_id {
        find_category(state, parent_id).await?;
    }

    let category = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        image_url: Set(payload.image_url),
        parent_id: Set(payload.parent_id),
        display_order: Set(payload.display_order),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(category_id = %category.id, seller_id = %user.user_id, "category created");
    Ok(ApiResponse::success(
        "category created successfully",
        category.into(),
        Some(Meta::empty()),
    ))
}

pub async fn edit_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    ensure_seller(user)?;
    let existing = find_category(state, id).await?;

    if let Some(Some(parent_id)) = payload.parent_id {
        if parent_id == id {
            return Err(AppError::validation("a category cannot be its own parent"));
        }
        find_category(state, parent_id).await?;
    }

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::validation("category name cannot be empty"));
        }
        active.name = Set(name);
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(image_url);
    }
    if let Some(parent_id) = payload.parent_id {
        active.parent_id = Set(parent_id);
    }
    if let Some(display_order) = payload.display_order {
        active.display_order = Set(display_order);
    }

    let category = active.update(&state.orm).await?;

    tracing::info!(category_id = %category.id, seller_id = %user.user_id, "category updated");
    Ok(ApiResponse::success(
        "category updated successfully",
        category.into(),
        Some(Meta::empty()),
    ))
}

pub async fn delete_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_seller(user)?;
    find_category(state, id).await?;

    let in_use = Products::find()
        .filter(ProdCol::CategoryId.eq(id))
        .count(&state.orm)
        .await?;
    if in_use > 0 {
        return Err(AppError::conflict(format!(
            "category still has {in_use} product(s)"
        )));
    }

    // Detach children explicitly; not every backend enforces ON DELETE SET NULL.
    Categories::update_many()
        .col_expr(Column::ParentId, Expr::value(Option::<Uuid>::None))
        .filter(Column::ParentId.eq(id))
        .exec(&state.orm)
        .await?;

    let result = Categories::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    tracing::info!(category_id = %id, seller_id = %user.user_id, "category deleted");
    Ok(ApiResponse::success(
        "category deleted successfully",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub(crate) async fn find_category(state: &AppState, id: Uuid) -> AppResult<CategoryModel> {
    Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)
}
