//! Product handlers

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use uuid::Uuid;

use crate::{
    error::ApiError,
    extract::{JsonBody, PathParam, QueryParams},
    models::{BarcodeQuery, CreateProductRequest, NameQuery, ProductUpdates},
    state::AppState,
};

/// Product by `?barcode=`
pub async fn get_product(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<BarcodeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state
        .product_repository
        .find_by_barcode(query.barcode)
        .await?;

    Ok(Json(product))
}

pub async fn get_product_by_id(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state.product_repository.find_by_id(id).await?;

    Ok(Json(product))
}

/// Products matching `?name=`, all of them without it
pub async fn search_products(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<NameQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let products = state.product_repository.search(query.name).await?;

    Ok(Json(products))
}

pub async fn create_product(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state.product_repository.create(payload).await?;

    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<BarcodeQuery>,
    JsonBody(payload): JsonBody<ProductUpdates>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state
        .product_repository
        .update(query.barcode, payload)
        .await?;

    Ok(Json(product))
}

pub async fn delete_product(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<BarcodeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state.product_repository.delete(query.barcode).await?;

    Ok(Json(product))
}
