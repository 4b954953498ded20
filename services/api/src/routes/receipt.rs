//! Receipt handlers

use axum::{Json, extract::State, response::IntoResponse};
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    error::ApiError,
    extract::{PathParam, QueryParams},
    models::{ReceiptListResponse, ReceiptsDeletedResponse},
    repositories::{ReceiptCriteria, receipt::page_from_params},
    state::AppState,
};

/// Receipts matching `shop`, `product`, `sdate`, `edate`, `minprice`,
/// `maxprice`, paginated by `limit` and `skip`
pub async fn get_receipts(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let criteria = ReceiptCriteria::from_params(&params)?;
    let page = page_from_params(&params)?;

    let receipts = state.receipt_repository.list(&criteria, page).await?;

    Ok(Json(ReceiptListResponse { receipts }))
}

pub async fn get_receipt(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let receipt = state.receipt_repository.find(id).await?;

    Ok(Json(receipt))
}

/// Bulk delete; the query string must hold at least one filter key and no other keys
pub async fn delete_receipts(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state.receipt_repository.delete_matching(&params).await?;

    Ok(Json(ReceiptsDeletedResponse {
        message: format!("{} receipt(s) deleted", deleted),
        deleted,
    }))
}

pub async fn delete_receipt(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let receipt = state.receipt_repository.delete(id).await?;

    Ok(Json(receipt))
}
