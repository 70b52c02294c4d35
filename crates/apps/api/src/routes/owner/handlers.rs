use crate::api_state::ApiContext;
use crate::auth::middlewares::user::ApiUser;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use common_services::api::invite::error::InviteError;
use common_services::api::invite::interfaces::{
    CreateInviteRequest, GalleryIdParams, InviteIdParams, InviteSummary, UpdateInviteRequest,
};
use tracing::info;

/// List all invites of a gallery.
///
/// Each invite carries its effective status: what a visitor presenting it would run into.
#[utoipa::path(
    get,
    path = "/gallery/{gallery_id}/invites",
    tag = "Invite management",
    params(GalleryIdParams),
    responses(
        (status = 200, description = "Invites of the gallery, newest first.", body = Vec<InviteSummary>),
        (status = 404, description = "Gallery not found or not owned by the caller."),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_invites_handler(
    State(context): State<ApiContext>,
    Extension(user): Extension<ApiUser>,
    Path(params): Path<GalleryIdParams>,
) -> Result<Json<Vec<InviteSummary>>, InviteError> {
    let invites = context
        .manager
        .list_invites(user.user_id, &params.gallery_id)
        .await?;
    Ok(Json(invites))
}

/// Create an invite for a gallery.
///
/// New invites start out `pending` and become `active` on their first use.
#[utoipa::path(
    post,
    path = "/gallery/{gallery_id}/invites",
    tag = "Invite management",
    params(GalleryIdParams),
    request_body = CreateInviteRequest,
    responses(
        (status = 201, description = "Invite created.", body = InviteSummary),
        (status = 400, description = "Usage bound or expiry do not fit the invite type."),
        (status = 404, description = "Gallery not found or not owned by the caller."),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_invite_handler(
    State(context): State<ApiContext>,
    Extension(user): Extension<ApiUser>,
    Path(params): Path<GalleryIdParams>,
    Json(payload): Json<CreateInviteRequest>,
) -> Result<(StatusCode, Json<InviteSummary>), InviteError> {
    let invite = context
        .manager
        .create_invite(user.user_id, &params.gallery_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(invite)))
}

#[utoipa::path(
    get,
    path = "/invites/{invite_id}",
    tag = "Invite management",
    params(InviteIdParams),
    responses(
        (status = 200, description = "The invite.", body = InviteSummary),
        (status = 404, description = "Invite not found or not owned by the caller."),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_invite_handler(
    State(context): State<ApiContext>,
    Extension(user): Extension<ApiUser>,
    Path(params): Path<InviteIdParams>,
) -> Result<Json<InviteSummary>, InviteError> {
    let invite = context
        .manager
        .get_invite(user.user_id, params.invite_id)
        .await?;
    Ok(Json(invite))
}

/// Partially update an invite.
///
/// Absent fields are kept, `null` clears optional fields. Revoked and expired invites cannot be
/// made active again.
#[utoipa::path(
    patch,
    path = "/invites/{invite_id}",
    tag = "Invite management",
    params(InviteIdParams),
    request_body = UpdateInviteRequest,
    responses(
        (status = 200, description = "The updated invite.", body = InviteSummary),
        (status = 400, description = "The edit breaks a rule of the invite lifecycle."),
        (status = 404, description = "Invite not found or not owned by the caller."),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_invite_handler(
    State(context): State<ApiContext>,
    Extension(user): Extension<ApiUser>,
    Path(params): Path<InviteIdParams>,
    Json(payload): Json<UpdateInviteRequest>,
) -> Result<Json<InviteSummary>, InviteError> {
    let invite = context
        .manager
        .update_invite(user.user_id, params.invite_id, &payload)
        .await?;
    Ok(Json(invite))
}

#[utoipa::path(
    post,
    path = "/invites/{invite_id}/revoke",
    tag = "Invite management",
    params(InviteIdParams),
    responses(
        (status = 200, description = "The revoked invite.", body = InviteSummary),
        (status = 404, description = "Invite not found or not owned by the caller."),
    ),
    security(("bearer_auth" = []))
)]
pub async fn revoke_invite_handler(
    State(context): State<ApiContext>,
    Extension(user): Extension<ApiUser>,
    Path(params): Path<InviteIdParams>,
) -> Result<Json<InviteSummary>, InviteError> {
    let invite = context
        .manager
        .revoke_invite(user.user_id, params.invite_id)
        .await?;
    Ok(Json(invite))
}

/// Delete an invite.
///
/// This is irreversible. Visitors holding the code lose access immediately.
#[utoipa::path(
    delete,
    path = "/invites/{invite_id}",
    tag = "Invite management",
    params(InviteIdParams),
    responses(
        (status = 204, description = "Invite deleted."),
        (status = 404, description = "Invite not found or not owned by the caller."),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_invite_handler(
    State(context): State<ApiContext>,
    Extension(user): Extension<ApiUser>,
    Path(params): Path<InviteIdParams>,
) -> Result<StatusCode, InviteError> {
    context
        .manager
        .delete_invite(user.user_id, params.invite_id)
        .await?;
    info!("User {} deleted invite {}", user.user_id, params.invite_id);
    Ok(StatusCode::NO_CONTENT)
}
