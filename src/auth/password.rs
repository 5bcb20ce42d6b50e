//! Password hashing and strength rules.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::RngCore;
use thiserror::Error;

const MIN_LENGTH: usize = 8;
const MAX_LENGTH: usize = 128;
const SPECIAL_CHARS: &str = "!@#$%^&*()_+-=[]{};':\"\\|,.<>/?";
const COMMON_FRAGMENTS: &[&str] = &[
    "password", "12345678", "qwerty123", "admin123", "letmein",
    "welcome1", "password1", "123456789", "abc12345", "iloveyou",
];

/// Human readable summary returned alongside strength failures.
pub const REQUIREMENTS: &str = "Password must be at least 8 characters long and contain: \
uppercase letter, lowercase letter, digit, and special character.";

#[derive(Debug, Error)]
#[error("failed to hash password: {0}")]
pub struct PasswordHashError(String);

/// Hash a password into an Argon2id PHC string.
pub fn hash_password(password: &str) -> Result<String, PasswordHashError> {
    let mut salt_bytes = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| PasswordHashError(e.to_string()))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|phc| phc.to_string())
        .map_err(|e| PasswordHashError(e.to_string()))
}

/// Check a password against a stored PHC string. Unparseable hashes never match.
pub fn verify_password(hash: &str, password: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Every strength rule the password breaks. Empty means acceptable.
pub fn strength_violations(password: &str) -> Vec<String> {
    let mut errors = Vec::new();

    if password.trim().is_empty() {
        errors.push("Password is required".to_string());
        return errors;
    }

    let length = password.chars().count();
    if length < MIN_LENGTH {
        errors.push(format!("Password must be at least {} characters long", MIN_LENGTH));
    }
    if length > MAX_LENGTH {
        errors.push(format!("Password must not exceed {} characters", MAX_LENGTH));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push("Password must contain at least one uppercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push("Password must contain at least one lowercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Password must contain at least one digit".to_string());
    }
    if !password.chars().any(|c| SPECIAL_CHARS.contains(c)) {
        errors.push("Password must contain at least one special character".to_string());
    }

    let lower = password.to_lowercase();
    if COMMON_FRAGMENTS.iter().any(|common| lower.contains(common)) {
        errors.push("Password is too common or contains a common pattern".to_string());
    }

    errors
}
