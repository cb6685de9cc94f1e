//! Token service - issues and verifies signed session tokens.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::{Config, TOKEN_TYPE_BEARER};
use crate::domain::{Identity, UserRole};
use crate::errors::{AppError, AppResult};

/// JWT claims payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: UserRole,
    pub iat: i64,
    pub exp: i64,
}

/// Reasons a presented token is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token is malformed or its signature does not match")]
    Invalid,

    #[error("token has expired")]
    Expired,
}

impl From<TokenError> for AppError {
    fn from(_: TokenError) -> Self {
        AppError::Unauthenticated
    }
}

/// Token handed to the client after register or login
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IssuedToken {
    /// JWT access token
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,
    /// Token type (always "Bearer")
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Token lifetime in seconds
    #[schema(example = 604800)]
    pub expires_in: i64,
    /// Absolute expiry time
    pub expires_at: DateTime<Utc>,
}

/// HS256 signer/verifier built once from configuration.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(config: &Config) -> Self {
        Self::from_secret(config.jwt_secret_bytes(), config.token_ttl)
    }

    pub fn from_secret(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    /// Issue a token for `identity` valid from now.
    pub fn issue(&self, identity: &Identity) -> AppResult<IssuedToken> {
        self.issue_at(identity, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(&self, identity: &Identity, now: DateTime<Utc>) -> AppResult<IssuedToken> {
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::internal("token expiry is out of range"))?;
        let claims = Claims {
            sub: identity.id,
            role: identity.role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let access_token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("failed to sign token: {e}")))?;

        Ok(IssuedToken {
            access_token,
            token_type: TOKEN_TYPE_BEARER.to_string(),
            expires_in: self.ttl.num_seconds(),
            expires_at,
        })
    }

    /// Verify signature and expiry, returning the embedded identity.
    pub fn verify(&self, token: &str) -> Result<Identity, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;

        Ok(Identity::new(data.claims.sub, data.claims.role))
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &"HS256")
            .field("ttl", &self.ttl)
            .finish()
    }
}
