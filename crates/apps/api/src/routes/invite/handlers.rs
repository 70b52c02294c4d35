use crate::api_state::ApiContext;
use axum::Json;
use axum::extract::State;
use common_services::api::favorites::interfaces::{
    FavoriteCountsRequest, FavoriteCountsResponse, ToggleFavoriteRequest, ToggleFavoriteResponse,
};
use common_services::api::invite::error::InviteError;
use common_services::api::invite::gateway::{AccessTarget, VisitContext};
use common_services::api::invite::interfaces::{
    AuthorizeRequest, OperationContext, ValidInvite, ValidateInviteRequest,
};

/// Check an invite code without using it.
///
/// Returns the gallery and the permissions the code grants. Calling this any number of times
/// never counts as a use.
#[utoipa::path(
    post,
    path = "/invite/validate",
    tag = "Invite",
    request_body = ValidateInviteRequest,
    responses(
        (status = 200, description = "The invite is usable.", body = ValidInvite),
        (status = 410, description = "The invite is unknown, revoked, expired or used up."),
        (status = 503, description = "The system is temporarily unavailable."),
    )
)]
pub async fn validate_invite_handler(
    State(context): State<ApiContext>,
    Json(payload): Json<ValidateInviteRequest>,
) -> Result<Json<ValidInvite>, InviteError> {
    let valid = context.gateway.validate(&payload.code).await?;
    Ok(Json(valid))
}

/// Authorize one operation on the gallery or on one of its photos.
///
/// The first authorized operation of a visit counts as one use of the invite.
#[utoipa::path(
    post,
    path = "/invite/authorize",
    tag = "Invite",
    request_body = AuthorizeRequest,
    responses(
        (status = 200, description = "The operation is allowed.", body = OperationContext),
        (status = 403, description = "The invite does not grant this operation."),
        (status = 404, description = "The photo is not part of the invite's gallery."),
        (status = 410, description = "The invite is unknown, revoked, expired or used up."),
        (status = 503, description = "The system is temporarily unavailable."),
    )
)]
pub async fn authorize_handler(
    State(context): State<ApiContext>,
    Json(payload): Json<AuthorizeRequest>,
) -> Result<Json<OperationContext>, InviteError> {
    let operation_context = context
        .gateway
        .authorize(
            &payload.code,
            payload.operation,
            &AccessTarget::from(payload.photo_id),
            &VisitContext::new(payload.visit_key),
        )
        .await?;
    Ok(Json(operation_context))
}

/// Favorite or unfavorite a photo.
///
/// Retrying with the same `toggleId` returns the original result without counting again.
#[utoipa::path(
    post,
    path = "/invite/favorite",
    tag = "Invite",
    request_body = ToggleFavoriteRequest,
    responses(
        (status = 200, description = "The toggle was applied (or had been applied before).", body = ToggleFavoriteResponse),
        (status = 403, description = "The invite does not allow favoriting."),
        (status = 404, description = "The photo is not part of the invite's gallery."),
        (status = 410, description = "The invite is unknown, revoked, expired or used up."),
        (status = 503, description = "The system is temporarily unavailable."),
    )
)]
pub async fn toggle_favorite_handler(
    State(context): State<ApiContext>,
    Json(payload): Json<ToggleFavoriteRequest>,
) -> Result<Json<ToggleFavoriteResponse>, InviteError> {
    let response = context.favorites.apply_favorite(&payload).await?;
    Ok(Json(response))
}

/// Aggregate favorite counts for photos of the invite's gallery.
#[utoipa::path(
    post,
    path = "/invite/favorite-counts",
    tag = "Invite",
    request_body = FavoriteCountsRequest,
    responses(
        (status = 200, description = "Counts per photo, in request order.", body = FavoriteCountsResponse),
        (status = 400, description = "Too many photo ids."),
        (status = 410, description = "The invite is unknown, revoked, expired or used up."),
        (status = 503, description = "The system is temporarily unavailable."),
    )
)]
pub async fn favorite_counts_handler(
    State(context): State<ApiContext>,
    Json(payload): Json<FavoriteCountsRequest>,
) -> Result<Json<FavoriteCountsResponse>, InviteError> {
    let counts = context
        .favorites
        .favorite_counts(
            &payload.code,
            &payload.photo_ids,
            &VisitContext::new(payload.visit_key),
        )
        .await?;
    Ok(Json(FavoriteCountsResponse { counts }))
}
