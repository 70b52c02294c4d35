use crate::api_state::ApiContext;
use crate::invite::handlers::{
    authorize_handler, favorite_counts_handler, toggle_favorite_handler, validate_invite_handler,
};
use app_state::RateLimitingSettings;
use axum::{Router, routing::post};
use color_eyre::eyre::{Result, eyre};
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tracing::info;

/// Code-authenticated endpoints, rate limited per peer address unless disabled in the settings.
pub fn invite_public_router(rate_limiting: &RateLimitingSettings) -> Result<Router<ApiContext>> {
    let router = Router::new()
        .route("/invite/validate", post(validate_invite_handler))
        .route("/invite/authorize", post(authorize_handler))
        .route("/invite/favorite", post(toggle_favorite_handler))
        .route("/invite/favorite-counts", post(favorite_counts_handler));

    if !rate_limiting.enabled {
        info!("Rate limiting of invite endpoints is disabled");
        return Ok(router);
    }

    let governor_conf = GovernorConfigBuilder::default()
        .per_second(rate_limiting.req_per_second)
        .burst_size(rate_limiting.burst_size)
        .finish()
        .ok_or_else(|| eyre!("Could not create rate-limiting governor."))?;

    info!(
        "Using request limits: {} req/s, burst {}",
        rate_limiting.req_per_second, rate_limiting.burst_size
    );

    Ok(router.layer(GovernorLayer::new(governor_conf)))
}
