//! Authentication and role middleware

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use tracing::{debug, warn};

use crate::{error::ApiError, models::Account, models::Role, state::AppState};

const PLEASE_AUTHENTICATE: &str = "Please authenticate";

/// Validate the bearer token and load its account into the request extensions
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let TypedHeader(Authorization(bearer)) =
        bearer.ok_or_else(|| ApiError::unauthorized(PLEASE_AUTHENTICATE))?;

    let claims = state
        .jwt_service
        .validate_token(bearer.token())
        .map_err(|e| {
            debug!("Failed to validate token: {}", e);
            ApiError::unauthorized(PLEASE_AUTHENTICATE)
        })?;

    // the account may have been renamed or deleted since the token was issued
    let account = state
        .account_repository
        .find_by_username(&claims.username)
        .await?
        .ok_or_else(|| ApiError::unauthorized(PLEASE_AUTHENTICATE))?;

    req.extensions_mut().insert(account);

    Ok(next.run(req).await)
}

/// Reject accounts without the admin role; runs after [`auth_middleware`]
pub async fn require_admin(req: Request, next: Next) -> Result<Response, ApiError> {
    let account = req
        .extensions()
        .get::<Account>()
        .ok_or_else(|| ApiError::unauthorized(PLEASE_AUTHENTICATE))?;

    if account.role != Role::Admin {
        warn!(
            "Account {} attempted {} {}",
            account.username,
            req.method(),
            req.uri().path()
        );
        return Err(ApiError::unauthorized("Role not valid"));
    }

    Ok(next.run(req).await)
}
