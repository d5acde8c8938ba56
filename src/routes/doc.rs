use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, VerifyCodeRequest},
        cart::{CartList, UpsertCartRequest},
        catalog::{CategoryList, CategoryWithProducts, CreateCategoryRequest, UpdateCategoryRequest},
        orders::{OrderList, OrderWithItems, SellerOrderItemList},
        products::{CreateProductRequest, ProductList, UpdateProductRequest, UpdateStockRequest},
        users::{AddressInput, BecomeSellerRequest, Profile, ProfileInput},
    },
    entity::users::UserRole,
    models::{Address, BankAccount, CartItem, Category, Order, OrderItem, Product, User},
    response::{ApiResponse, Meta},
    routes::{catalog, health, params, seller, users},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        users::register,
        users::login,
        users::request_code,
        users::verify_code,
        users::get_profile,
        users::create_profile,
        users::update_profile,
        users::get_cart,
        users::upsert_cart,
        users::place_order,
        users::list_orders,
        users::get_order,
        users::become_seller,
        catalog::list_products,
        catalog::get_product,
        catalog::list_categories,
        catalog::get_category,
        seller::create_category,
        seller::edit_category,
        seller::delete_category,
        seller::list_own_products,
        seller::create_product,
        seller::get_own_product,
        seller::edit_product,
        seller::update_stock,
        seller::delete_product,
        seller::list_order_items,
        seller::get_order_item
    ),
    components(
        schemas(
            User,
            UserRole,
            Address,
            BankAccount,
            Category,
            Product,
            CartItem,
            Order,
            OrderItem,
            RegisterRequest,
            RegisterResponse,
            LoginRequest,
            LoginResponse,
            VerifyCodeRequest,
            AddressInput,
            ProfileInput,
            Profile,
            BecomeSellerRequest,
            CreateCategoryRequest,
            UpdateCategoryRequest,
            CategoryList,
            CategoryWithProducts,
            CreateProductRequest,
            UpdateProductRequest,
            UpdateStockRequest,
            ProductList,
            UpsertCartRequest,
            CartList,
            OrderList,
            OrderWithItems,
            SellerOrderItemList,
            params::Pagination,
            params::SortOrder,
            params::ProductSortBy,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CartList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<Profile>,
            ApiResponse<LoginResponse>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Users", description = "Registration, login, verification and profile"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Catalog", description = "Public products and categories"),
        (name = "Seller", description = "Seller program endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
