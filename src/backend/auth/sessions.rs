/**
 * Token Verification
 *
 * HS256 JWT handling for bearer credentials. The verifier resolves a token to
 * the opaque user id used throughout the hub.
 *
 * Tokens issued by the account service carry a numeric `user_id` claim;
 * string ids are accepted too and used verbatim.
 */

use std::time::Duration;

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default token lifetime for [`TokenVerifier::issue`]
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("token carries no user id")]
    MissingUserId,
}

/// User id as found in the `user_id` claim
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum UserIdClaim {
    Numeric(u64),
    Text(String),
}

impl UserIdClaim {
    fn into_user_id(self) -> Option<String> {
        match self {
            UserIdClaim::Numeric(0) => None,
            UserIdClaim::Numeric(n) => Some(n.to_string()),
            UserIdClaim::Text(s) if s.trim().is_empty() => None,
            UserIdClaim::Text(s) => Some(s),
        }
    }
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: UserIdClaim,
    #[serde(default)]
    pub username: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issued at time (Unix timestamp)
    #[serde(default)]
    pub iat: u64,
}

/// Verifies (and, for tests and tooling, issues) bearer tokens
pub struct TokenVerifier {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: DEFAULT_TOKEN_TTL,
        }
    }

    /// Resolve a token to a user id
    pub fn verify(&self, token: &str) -> Result<String, AuthError> {
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())?;
        data.claims.user_id.into_user_id().ok_or(AuthError::MissingUserId)
    }

    /// Sign a token for `user_id`
    pub fn issue(&self, user_id: &str, username: Option<&str>) -> Result<String, AuthError> {
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        let user_id = match user_id.parse::<u64>() {
            Ok(n) => UserIdClaim::Numeric(n),
            Err(_) => UserIdClaim::Text(user_id.to_string()),
        };
        let claims = Claims {
            user_id,
            username: username.map(str::to_string),
            exp: now + self.ttl.as_secs(),
            iat: now,
        };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }
}
