//! Custom error types for the common library
//!
//! This module defines the errors raised while connecting to, migrating and
//! probing the PostgreSQL database.

use sqlx::Error as SqlxError;
use sqlx::migrate::MigrateError;
use thiserror::Error;

/// Failure while preparing or using the database connection
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// An environment setting could not be parsed
    #[error("Invalid value `{value}` for {key}")]
    InvalidSetting { key: &'static str, value: String },

    #[error("Invalid database URL: {0}")]
    InvalidUrl(#[source] SqlxError),

    /// The pool could not open its first connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    #[error("Database health check failed: {0}")]
    HealthCheck(#[source] SqlxError),

    #[error("Database migration error: {0}")]
    Migration(#[source] MigrateError),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;
