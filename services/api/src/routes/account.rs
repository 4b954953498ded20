//! Account handlers

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use crate::{
    error::ApiError,
    extract::JsonBody,
    models::{
        Account, AccountDeleteRequest, AccountPatchRequest, AccountResponse,
        AccountUpdatedResponse, LoginRequest, LoginResponse, SignupRequest,
    },
    state::AppState,
};

fn issue_token(state: &AppState, username: &str) -> Result<String, ApiError> {
    state
        .jwt_service
        .generate_access_token(username)
        .map_err(|e| {
            tracing::error!("Failed to generate access token: {}", e);
            ApiError::InternalServerError
        })
}

/// Register a new account
pub async fn signup(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.account_repository.signup(payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({"message": "Account successfully created"})),
    ))
}

/// Exchange credentials for an access token
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let account = state.account_repository.login(payload).await?;
    let access_token = issue_token(&state, &account.username)?;

    tracing::info!("Account {} logged in", account.username);
    Ok((
        StatusCode::CREATED,
        Json(LoginResponse {
            id: account.id,
            username: account.username,
            email: account.email,
            role: account.role,
            access_token,
        }),
    ))
}

/// Current account
pub async fn get_account(Extension(account): Extension<Account>) -> impl IntoResponse {
    Json(AccountResponse::from(&account))
}

pub async fn update_account(
    State(state): State<AppState>,
    Extension(account): Extension<Account>,
    JsonBody(payload): JsonBody<AccountPatchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state
        .account_repository
        .update(&account, payload.updates)
        .await?;
    let access_token = issue_token(&state, &updated.username)?;

    Ok(Json(AccountUpdatedResponse {
        account: AccountResponse::from(&updated),
        access_token,
    }))
}

pub async fn delete_account(
    State(state): State<AppState>,
    Extension(account): Extension<Account>,
    JsonBody(payload): JsonBody<AccountDeleteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .account_repository
        .delete(&account, payload.password)
        .await?;

    Ok(Json(json!({"message": "Account successfully deleted"})))
}
