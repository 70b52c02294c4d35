use crate::api_state::ApiContext;
use crate::auth::middlewares::common::{extract_context, extract_token};
use axum::{
    extract::{FromRequestParts, State},
    http::request::Parts,
};
use common_services::api::auth::error::AuthError;
use common_services::api::auth::token::decode_token;

/// The photographer behind a valid bearer token. Ownership of galleries and invites is
/// checked per call by the invite manager, never here.
#[derive(Clone, Debug)]
pub struct ApiUser {
    pub user_id: i32,
}

impl<S> FromRequestParts<S> for ApiUser
where
    S: Send + Sync,
    State<ApiContext>: FromRequestParts<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts)?;
        let context = extract_context(parts, state).await?;
        let claims = decode_token(&token, &context.settings.secrets.jwt)?;
        let user = Self {
            user_id: claims.sub,
        };
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}
