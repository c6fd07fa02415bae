/// Stateless session tokens carried in a signed cookie
///
/// A logged-in browser holds an HS256 JWT in the session cookie. Any
/// malformed, tampered or expired token is treated as an anonymous request.
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Cookie the session token travels in.
pub const SESSION_COOKIE: &str = "sessionid";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id
    pub sub: String,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

/// Mint a session token for a freshly authenticated user.
pub fn issue_session_token(
    secret: &str,
    user_id: Uuid,
    username: &str,
    ttl_days: i64,
) -> Result<String> {
    let now = Utc::now();
    let claims = SessionClaims {
        sub: user_id.to_string(),
        username: username.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::days(ttl_days)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("session token encoding failed: {}", e)))
}

/// Validate a session token; `None` means anonymous.
pub fn verify_session_token(secret: &str, token: &str) -> Option<SessionClaims> {
    decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .ok()
}
