//! Signed, time-bounded identity assertions.
//!
//! Tokens are compact HS256 JWTs signed with one process-wide secret. The
//! codec keeps expiry, tampering and garbage apart so the caller can log them
//! at different levels, but every failure means "no identity".

use std::time::Duration;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::role::Role;
use crate::auth::UserId;
use crate::time::unix_now;

/// Claims as they travel inside the token.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    sub: String,
    email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    iat: u64,
    exp: u64,
}

/// Decoded and verified token contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityAssertion {
    pub subject_id: UserId,
    /// Display and audit only; never used for lookups.
    pub email: String,
    pub role: Role,
    pub issued_at: u64,
    pub expires_at: u64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("token is malformed")]
    Malformed,

    #[error("token signature is invalid")]
    SignatureInvalid,

    #[error("token ttl must be at least one second")]
    InvalidTtl,

    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

impl TokenError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            TokenError::Expired => "expired",
            TokenError::Malformed => "malformed",
            TokenError::SignatureInvalid => "signature_invalid",
            TokenError::InvalidTtl => "invalid_ttl",
            TokenError::Signing(_) => "signing",
        }
    }
}

/// Issues and verifies identity tokens.
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    session_ttl: Duration,
}

impl TokenCodec {
    /// Create a codec around `secret` with the configured session TTL.
    pub fn new(secret: &[u8], session_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            session_ttl,
        }
    }

    /// TTL applied to login tokens.
    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    /// Sign a new assertion valid from now for `ttl`.
    pub fn issue(
        &self,
        subject_id: UserId,
        email: &str,
        role: Role,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        self.issue_at(subject_id, email, role, ttl, unix_now())
    }

    pub(crate) fn issue_at(
        &self,
        subject_id: UserId,
        email: &str,
        role: Role,
        ttl: Duration,
        issued_at: u64,
    ) -> Result<String, TokenError> {
        let ttl_secs = ttl.as_secs();
        if ttl_secs == 0 {
            return Err(TokenError::InvalidTtl);
        }

        let claims = Claims {
            sub: subject_id.to_string(),
            email: email.to_string(),
            role: Some(role.as_str().to_string()),
            iat: issued_at,
            exp: issued_at.saturating_add(ttl_secs),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(TokenError::Signing)
    }

    /// Verify signature and validity window, then extract the assertion.
    pub fn decode(&self, token: &str) -> Result<IdentityAssertion, TokenError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::SignatureInvalid
                }
                _ => TokenError::Malformed,
            })?;
        let claims = data.claims;

        if claims.exp <= claims.iat {
            return Err(TokenError::Malformed);
        }
        if claims.exp <= unix_now() {
            return Err(TokenError::Expired);
        }

        let subject_id: UserId = claims.sub.parse().map_err(|_| TokenError::Malformed)?;

        Ok(IdentityAssertion {
            subject_id,
            email: claims.email,
            role: Role::from_claim(claims.role.as_deref()),
            issued_at: claims.iat,
            expires_at: claims.exp,
        })
    }
}
