use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Represents the claims contained within a photographer's JWT.
#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthClaims {
    pub sub: i32, // Subject (photographer user ID)
    pub exp: i64, // Expiration time
}
