//! Bearer-token authentication.

use std::fmt;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use thiserror::Error;
use workload_core::clock::Clock;

use crate::error::ApiError;
use crate::state::AppState;

/// Claims extracted from a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenData {
    /// The authenticated principal.
    pub subject: String,
    /// When the token was issued.
    pub issued_at: DateTime<Utc>,
    /// When the token stops being valid.
    pub expires_at: DateTime<Utc>,
}

/// Authentication failures. All of them map to 401.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The request carried no `Authorization` header.
    #[error("missing bearer token")]
    MissingToken,

    /// The token is malformed, has a bad signature or lacks a claim.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// The token's expiry is in the past.
    #[error("token has expired")]
    Expired,
}

/// Verifies bearer tokens.
pub trait TokenValidator: Send + Sync {
    /// Verifies the signature and reads the claims without checking expiry.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token cannot be verified.
    fn parse_token(&self, token: &str) -> Result<TokenData, AuthError>;

    /// Parses the token and rejects it once it has expired.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` or `AuthError::Expired`.
    fn validate_token(&self, token: &str) -> Result<TokenData, AuthError>;
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// HS256 token validator with a shared secret. Expiry is evaluated against
/// the injected clock rather than the system time.
pub struct JwtTokenValidator {
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl JwtTokenValidator {
    /// Creates a validator for tokens signed with `secret`.
    #[must_use]
    pub fn new(secret: &[u8], clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["sub", "iat", "exp"]);
        validation.validate_exp = false;
        validation.validate_aud = false;

        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            clock,
        }
    }
}

impl fmt::Debug for JwtTokenValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtTokenValidator")
            .field("algorithms", &self.validation.algorithms)
            .finish_non_exhaustive()
    }
}

fn timestamp(seconds: i64, claim: &str) -> Result<DateTime<Utc>, AuthError> {
    DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| AuthError::InvalidToken(format!("{claim} is out of range")))
}

impl TokenValidator for JwtTokenValidator {
    fn parse_token(&self, token: &str) -> Result<TokenData, AuthError> {
        let claims = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?
            .claims;

        Ok(TokenData {
            subject: claims.sub,
            issued_at: timestamp(claims.iat, "iat")?,
            expires_at: timestamp(claims.exp, "exp")?,
        })
    }

    fn validate_token(&self, token: &str) -> Result<TokenData, AuthError> {
        let data = self.parse_token(token)?;
        if data.expires_at < self.clock.now() {
            return Err(AuthError::Expired);
        }
        Ok(data)
    }
}

/// Extractor that admits only requests with a valid bearer token.
#[derive(Debug, Clone)]
pub struct Authenticated(pub TokenData);

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingToken)?;
        let token = header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| AuthError::InvalidToken("expected a bearer token".into()))?;

        let data = state.token_validator.validate_token(token.trim())?;
        Ok(Self(data))
    }
}
