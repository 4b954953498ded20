//! API service routes

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{MethodRouter, delete, get, patch, post},
};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::{
    error::ApiError,
    middleware::{auth_middleware, require_admin},
    state::AppState,
};

pub mod account;
pub mod product;
pub mod receipt;
pub mod shop;

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let authenticated = |route: MethodRouter<AppState>| {
        route.route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
    };
    let admin = |route: MethodRouter<AppState>| {
        authenticated(route.route_layer(middleware::from_fn(require_admin)))
    };

    // Per-method layers leave the method-not-allowed fallback unauthenticated
    let api_routes = Router::new()
        .route(
            "/account",
            authenticated(
                get(account::get_account)
                    .patch(account::update_account)
                    .delete(account::delete_account),
            ),
        )
        .route(
            "/products",
            authenticated(get(product::get_product).post(product::create_product))
                .merge(admin(patch(product::update_product).delete(product::delete_product))),
        )
        .route("/products/:id", authenticated(get(product::get_product_by_id)))
        .route("/products-all", authenticated(get(product::search_products)))
        .route(
            "/shops",
            authenticated(get(shop::get_shop).post(shop::create_shop))
                .merge(admin(patch(shop::update_shop).delete(shop::delete_shop))),
        )
        .route("/shops/:id", authenticated(get(shop::get_shop_by_id)))
        .route("/shops-all", authenticated(get(shop::search_shops)))
        .route("/shops/locations", authenticated(post(shop::add_location)))
        .route(
            "/shops/locations/:id",
            admin(patch(shop::update_location).delete(shop::delete_location)),
        )
        .route(
            "/shops/products",
            authenticated(post(shop::create_receipt))
                .merge(admin(delete(shop::remove_shop_product))),
        )
        .route(
            "/receipts",
            authenticated(get(receipt::get_receipts))
                .merge(admin(delete(receipt::delete_receipts))),
        )
        .route(
            "/receipts/:id",
            authenticated(get(receipt::get_receipt))
                .merge(admin(delete(receipt::delete_receipt))),
        );

    Router::new()
        .route("/health", get(health_check))
        .route("/signup", post(account::signup))
        .route("/login", post(account::login))
        .merge(api_routes)
        .fallback(not_implemented)
        .layer(middleware::map_response(method_not_implemented))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "grocery-api"
    }))
}

/// Fallback for every unknown route
pub async fn not_implemented() -> ApiError {
    ApiError::NotImplemented
}

/// Known paths called with an unsupported method get the same answer as unknown routes
async fn method_not_implemented(response: Response) -> Response {
    if response.status() == StatusCode::METHOD_NOT_ALLOWED {
        return ApiError::NotImplemented.into_response();
    }
    response
}
