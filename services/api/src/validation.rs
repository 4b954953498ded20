//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

use crate::models::{NewLocation, NutrientValues};

pub const PASSWORD_MESSAGE: &str =
    "A password with at least 8 characters, one uppercase and one lowercase is required";

/// At least 8 ASCII letters or digits, with an uppercase letter, a lowercase letter and a digit
pub fn is_secure(password: &str) -> bool {
    static PASSWORD_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = PASSWORD_REGEX
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9]{8,}$").expect("Failed to compile password regex"));

    regex.is_match(password)
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
}

/// 4 to 20 letters or digits, with single `.` or `_` separators between them
pub fn is_valid_username(username: &str) -> bool {
    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USERNAME_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9]+([._][a-zA-Z0-9]+)*$").expect("Failed to compile username regex")
    });

    (4..=20).contains(&username.len()) && regex.is_match(username)
}

/// HTML5 `input[type=email]` address grammar
pub fn is_valid_email(email: &str) -> bool {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(
            r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
        )
        .expect("Failed to compile email regex")
    });

    regex.is_match(email)
}

/// Validate username
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("A username is required".to_string());
    }

    if !is_valid_username(username) {
        return Err("Please, enter a valid username".to_string());
    }

    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("An email address is required".to_string());
    }

    if !is_valid_email(email) {
        return Err("Please, fill a valid email address".to_string());
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if !is_secure(password) {
        return Err(PASSWORD_MESSAGE.to_string());
    }

    Ok(())
}

pub fn validate_latitude(latitude: f64) -> Result<(), String> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err("Latitude not valid".to_string());
    }
    Ok(())
}

pub fn validate_longitude(longitude: f64) -> Result<(), String> {
    if !(-180.0..=180.0).contains(&longitude) {
        return Err("Longitude not valid".to_string());
    }
    Ok(())
}

pub fn validate_location(location: &NewLocation) -> Result<(), String> {
    validate_latitude(location.latitude)?;
    validate_longitude(location.longitude)
}

/// Provided values must be non-negative numbers, with salt or sodium given
pub fn validate_nutrients(values: &NutrientValues) -> Result<(), String> {
    if values.provided().any(|v| !v.is_finite() || v < 0.0) {
        return Err("Nutrient values must be non-negative numbers".to_string());
    }

    if values.salt.is_none() && values.sodium.is_none() {
        return Err("Either salt or sodium needs to be provided".to_string());
    }

    Ok(())
}
