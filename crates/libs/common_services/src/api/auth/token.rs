//! Bearer tokens for gallery owners. Issuing them belongs to the account service; this crate
//! only needs to produce and read the claims it checks ownership with.

use crate::api::auth::error::AuthError;
use crate::api::auth::interfaces::AuthClaims;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

/// Creates a new access token for a given photographer.
///
/// # Errors
///
/// * `AuthError::Internal` if token encoding fails.
pub fn create_access_token(
    jwt_secret: &str,
    user_id: i32,
    valid_for: Duration,
) -> Result<String, AuthError> {
    let claims = AuthClaims {
        sub: user_id,
        exp: (Utc::now() + valid_for).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_ref()),
    )
    .map_err(|e| AuthError::Internal(e.into()))
}

/// Verifies signature and expiry.
pub fn decode_token(token: &str, jwt_secret: &str) -> Result<AuthClaims, AuthError> {
    decode::<AuthClaims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_ref()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AuthError::InvalidToken)
}
