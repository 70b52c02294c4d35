mod api_doc;
pub mod auth;
pub mod invite;
pub mod owner;
pub mod root;

use crate::api_state::ApiContext;
use crate::auth::middlewares::user::ApiUser;
use crate::invite::router::invite_public_router;
use crate::owner::router::owner_protected_router;
use crate::root::router::root_public_router;
use app_state::RateLimitingSettings;
use axum::Router;
use axum::middleware::from_extractor_with_state;
use color_eyre::Result;

pub use api_doc::ApiDoc;

// --- Router Construction ---
pub fn create_router(api_state: ApiContext) -> Result<Router> {
    Ok(Router::new()
        .merge(public_routes(&api_state.settings.api.rate_limiting)?)
        .merge(protected_routes(api_state.clone()))
        .with_state(api_state))
}

fn public_routes(rate_limiting: &RateLimitingSettings) -> Result<Router<ApiContext>> {
    Ok(Router::new()
        .merge(invite_public_router(rate_limiting)?)
        .merge(root_public_router()))
}

fn protected_routes(api_state: ApiContext) -> Router<ApiContext> {
    Router::new()
        .merge(owner_protected_router())
        .route_layer(from_extractor_with_state::<ApiUser, ApiContext>(api_state))
}
