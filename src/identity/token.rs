//! Bearer token issuance and verification.
//!
//! Tokens are HS256 JWTs carrying the user id in a `userId` claim and an
//! `exp` claim 15 days after issuance. The signing secret is handed in at
//! construction; nothing here reads the environment.
//!
//! # Example
//!
//! ```rust
//! use bookworm::identity::TokenService;
//! use bookworm::model::UserId;
//!
//! let tokens = TokenService::new("my-secret-key");
//! let user_id = UserId::generate();
//!
//! let token = tokens.issue(user_id).unwrap();
//! assert_eq!(tokens.verify(&token).unwrap(), user_id);
//! ```

use std::time::Duration;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, get_current_timestamp, Algorithm, DecodingKey, EncodingKey};
use jsonwebtoken::{Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::TokenError;
use crate::model::UserId;

/// Lifetime of an issued token (15 days).
pub const TOKEN_TTL: Duration = Duration::from_secs(15 * 24 * 60 * 60);

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Claims {
    user_id: UserId,
    iat: u64,
    exp: u64,
}

/// Issues and verifies signed identity tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    /// Create a token service signing with `secret` and the default 15-day TTL.
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self::with_ttl(secret, TOKEN_TTL)
    }

    /// Create a token service with a custom TTL.
    pub fn with_ttl(secret: impl AsRef<[u8]>, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_ref()),
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
            validation,
            ttl,
        }
    }

    /// Lifetime of tokens issued by this service.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `user_id`, valid from now.
    pub fn issue(&self, user_id: UserId) -> Result<String, TokenError> {
        self.issue_at(user_id, get_current_timestamp())
    }

    /// Issue a token as if it had been signed at `issued_at` (Unix seconds).
    pub fn issue_at(&self, user_id: UserId, issued_at: u64) -> Result<String, TokenError> {
        let claims = Claims {
            user_id,
            iat: issued_at,
            exp: issued_at + self.ttl.as_secs(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify signature and expiry, returning the embedded user id.
    pub fn verify(&self, token: &str) -> Result<UserId, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims.user_id)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            })
    }
}
