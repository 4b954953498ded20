//! JWT service for access token generation and validation
//!
//! Tokens are signed with HS256 using a shared secret and identify the
//! account by username. The account itself is re-resolved on every request.

use anyhow::Result;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::env_or;

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret used to sign and verify tokens
    pub secret: String,
    /// Access token expiration time in seconds (default: 2 hours)
    pub access_token_expiry: u64,
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `ACCESS_TOKEN_SECRET`: Shared signing secret (required)
    /// - `ACCESS_TOKEN_EXPIRY`: Access token expiry in seconds (default: 7200)
    pub fn from_env() -> Result<Self> {
        let secret = std::env::var("ACCESS_TOKEN_SECRET")
            .map_err(|_| anyhow::anyhow!("ACCESS_TOKEN_SECRET environment variable not set"))?;

        if secret.is_empty() {
            return Err(anyhow::anyhow!("ACCESS_TOKEN_SECRET must not be empty"));
        }

        let access_token_expiry = env_or("ACCESS_TOKEN_EXPIRY", 7200)?;

        Ok(JwtConfig {
            secret,
            access_token_expiry,
        })
    }
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Account username
    pub username: String,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: JwtConfig,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        JwtService {
            encoding_key,
            decoding_key,
            validation,
            config,
        }
    }

    /// Generate an access token for an account
    pub fn generate_access_token(&self, username: &str) -> Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| anyhow::anyhow!("Failed to get current time: {}", e))?
            .as_secs();

        let claims = Claims {
            username: username.to_string(),
            iat: now,
            exp: now + self.config.access_token_expiry,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Validate a token and return the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }

    /// Get the access token expiry time
    pub fn access_token_expiry(&self) -> u64 {
        self.config.access_token_expiry
    }
}
