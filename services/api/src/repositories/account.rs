//! Account repository: signup, credentials and self-service changes

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::{ApiError, ApiResult};
use crate::models::{
    Account, AccountChanges, AccountUpdates, LoginRequest, NewAccount, Role, SignupRequest,
    rejected_keys,
};
use crate::store::{Store, StoreError};
use crate::validation::{
    PASSWORD_MESSAGE, is_secure, is_valid_email, is_valid_username, validate_email,
    validate_password, validate_username,
};

const ACCOUNT_TAKEN: &str = "The account name is already in use";
const INVALID_UPDATE: &str =
    "Invalid update: username, email and password are the only changes allowed.";

/// Hash a password with a fresh random salt
pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {}", e);
            ApiError::InternalServerError
        })
}

/// Check a password against a stored hash
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            error!("Stored password hash is malformed: {}", e);
            false
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Account repository
#[derive(Clone)]
pub struct AccountRepository {
    store: Arc<dyn Store>,
}

impl AccountRepository {
    /// Create a new account repository
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Register a new account
    pub async fn signup(&self, request: SignupRequest) -> ApiResult<Account> {
        let (Some(username), Some(email), Some(password)) = (
            non_empty(request.username),
            non_empty(request.email),
            request.password.filter(|p| !p.is_empty()),
        ) else {
            return Err(ApiError::bad_request(
                "A username, email and password needs to be provided",
            ));
        };

        if self.store.find_account_by_username(&username).await?.is_some() {
            return Err(ApiError::conflict(ACCOUNT_TAKEN));
        }

        validate_password(&password).map_err(ApiError::BadRequest)?;
        validate_username(&username).map_err(ApiError::BadRequest)?;
        validate_email(&email).map_err(ApiError::BadRequest)?;

        let role = match request.role.as_deref().map(str::trim) {
            None | Some("") => Role::default(),
            Some(role) => role.parse().map_err(ApiError::BadRequest)?,
        };

        let account = NewAccount {
            username,
            email,
            password_hash: hash_password(&password)?,
            role,
        };

        info!("Creating new account: {}", account.username);
        self.store
            .insert_account(account)
            .await
            .map_err(|e| match e {
                StoreError::Duplicate { .. } => ApiError::conflict(ACCOUNT_TAKEN),
                other => other.into(),
            })
    }

    /// Check credentials and return the matching account
    pub async fn login(&self, request: LoginRequest) -> ApiResult<Account> {
        let (Some(username), Some(password)) = (non_empty(request.username), request.password)
        else {
            return Err(ApiError::bad_request(
                "An account name and password must be provided",
            ));
        };

        let account = self
            .store
            .find_account_by_username(&username)
            .await?
            .ok_or_else(|| ApiError::not_found("No account found"))?;

        if !verify_password(&password, &account.password_hash) {
            warn!("Failed login for account: {}", username);
            return Err(ApiError::not_found("Incorrect password"));
        }

        Ok(account)
    }

    pub async fn find_by_username(&self, username: &str) -> ApiResult<Option<Account>> {
        Ok(self.store.find_account_by_username(username).await?)
    }

    /// Apply a self-service update; keys outside the allow-list reject the whole request
    pub async fn update(&self, account: &Account, updates: AccountUpdates) -> ApiResult<Account> {
        if !updates.unknown.is_empty() {
            warn!(
                "Rejected account update for {} with keys {:?}",
                account.username,
                rejected_keys(&updates.unknown)
            );
            return Err(ApiError::bad_request(INVALID_UPDATE));
        }

        if let Some(username) = &updates.username
            && !is_valid_username(username)
        {
            return Err(ApiError::bad_request("Username not valid"));
        }
        if let Some(email) = &updates.email
            && !is_valid_email(email)
        {
            return Err(ApiError::bad_request("Email not valid"));
        }
        if let Some(password) = &updates.password
            && !is_secure(password)
        {
            return Err(ApiError::bad_request(PASSWORD_MESSAGE));
        }

        let changes = AccountChanges {
            username: updates.username.filter(|u| *u != account.username),
            email: updates.email,
            password_hash: updates.password.as_deref().map(hash_password).transpose()?,
        };
        if changes.is_empty() {
            return Ok(account.clone());
        }

        if let Some(username) = &changes.username
            && self.store.find_account_by_username(username).await?.is_some()
        {
            return Err(ApiError::conflict(ACCOUNT_TAKEN));
        }

        info!("Updating account: {}", account.username);
        self.store
            .update_account(account.id, changes)
            .await
            .map_err(|e| match e {
                StoreError::Duplicate { .. } => ApiError::conflict(ACCOUNT_TAKEN),
                other => other.into(),
            })?
            .ok_or_else(|| ApiError::not_found("No account found"))
    }

    /// Delete the account after confirming its password
    pub async fn delete(&self, account: &Account, password: Option<String>) -> ApiResult<Account> {
        let password = password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ApiError::bad_request("A password needs to be provided"))?;

        if !verify_password(&password, &account.password_hash) {
            return Err(ApiError::unauthorized("Incorrect password"));
        }

        info!("Deleting account: {}", account.username);
        self.store
            .delete_account(account.id)
            .await?
            .ok_or_else(|| ApiError::not_found("No account found"))
    }
}
