//! Shop handlers, including receipt submission at a shop

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use uuid::Uuid;

use crate::{
    error::ApiError,
    extract::{JsonBody, PathParam, QueryParams},
    models::{
        Account, AddLocationRequest, CreateReceiptRequest, CreateShopRequest, LocationUpdates,
        NameQuery, ReceiptCreatedResponse, ShopMessageResponse, ShopProductQuery, ShopUpdates,
    },
    state::AppState,
};

/// Shop by `?name=`
pub async fn get_shop(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<NameQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let shop = state.shop_repository.find_by_name(query.name).await?;

    Ok(Json(shop))
}

pub async fn get_shop_by_id(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let shop = state.shop_repository.find_by_id(id).await?;

    Ok(Json(shop))
}

pub async fn search_shops(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<NameQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let shops = state.shop_repository.search(query.name).await?;

    Ok(Json(shops))
}

pub async fn create_shop(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateShopRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let shop = state.shop_repository.create(payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(ShopMessageResponse {
            message: "Shop successfully created".to_string(),
            shop,
        }),
    ))
}

pub async fn add_location(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<AddLocationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let shop = state.shop_repository.add_location(payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(ShopMessageResponse {
            message: "A new location was added".to_string(),
            shop,
        }),
    ))
}

/// Record a price observation for a product at a shop
pub async fn create_receipt(
    State(state): State<AppState>,
    Extension(account): Extension<Account>,
    JsonBody(payload): JsonBody<CreateReceiptRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (receipt, shop) = state.receipt_repository.create(&account, payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(ReceiptCreatedResponse {
            message: "Receipt successfully created".to_string(),
            shop,
            receipt,
        }),
    ))
}

pub async fn update_shop(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<NameQuery>,
    JsonBody(payload): JsonBody<ShopUpdates>,
) -> Result<impl IntoResponse, ApiError> {
    let shop = state.shop_repository.update(query.name, payload).await?;

    Ok(Json(shop))
}

pub async fn delete_shop(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<NameQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let shop = state.shop_repository.delete(query.name).await?;

    Ok(Json(shop))
}

pub async fn update_location(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
    JsonBody(payload): JsonBody<LocationUpdates>,
) -> Result<impl IntoResponse, ApiError> {
    let location = state.shop_repository.update_location(id, payload).await?;

    Ok(Json(location))
}

pub async fn delete_location(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let location = state.shop_repository.delete_location(id).await?;

    Ok(Json(location))
}

/// Drop a product from the shop's product index
pub async fn remove_shop_product(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ShopProductQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let shop = state.shop_repository.remove_product(query).await?;

    Ok(Json(shop))
}
