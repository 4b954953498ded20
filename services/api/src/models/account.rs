//! Account model and related payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Authorization tier of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Regular,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Regular => "regular",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "regular" => Ok(Role::Regular),
            "admin" => Ok(Role::Admin),
            other => Err(format!("`{}` is not a valid role", other)),
        }
    }
}

/// Account entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    /// Products this account has submitted receipts for
    pub products: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// New account creation payload, password already hashed
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Account update payload
#[derive(Debug, Clone, Default)]
pub struct AccountChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

impl AccountChanges {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none() && self.password_hash.is_none()
    }
}

/// Request for account registration
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

/// Request for account login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Request for a self-service account update; changes outside `updates` are rejected
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountPatchRequest {
    #[serde(default)]
    pub updates: AccountUpdates,
}

/// Fields an account holder may change about themselves
#[derive(Debug, Default, Deserialize)]
pub struct AccountUpdates {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(flatten)]
    pub unknown: Map<String, Value>,
}

/// Request for account deletion
#[derive(Debug, Deserialize)]
pub struct AccountDeleteRequest {
    pub password: Option<String>,
}

/// Public view of an account
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub products: Vec<Uuid>,
}

impl From<&Account> for AccountResponse {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            username: account.username.clone(),
            email: account.email.clone(),
            role: account.role,
            products: account.products.clone(),
        }
    }
}

/// Response for a successful login
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub access_token: String,
}

/// Response for a successful account update, carrying a fresh token
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountUpdatedResponse {
    #[serde(flatten)]
    pub account: AccountResponse,
    pub access_token: String,
}
