use crate::routes::{invite, owner, root};
use common_services::api::favorites::interfaces::{
    FavoriteCountsRequest, FavoriteCountsResponse, ToggleFavoriteRequest, ToggleFavoriteResponse,
};
use common_services::api::invite::error::InvalidReason;
use common_services::api::invite::interfaces::{
    AuthorizeRequest, CreateInviteRequest, InviteMeta, InviteSummary, OperationContext,
    UpdateInviteRequest, UsageReceipt, ValidInvite, ValidateInviteRequest,
};
use common_services::api::invite::permissions::Operation;
use common_services::api::invite::status::EffectiveStatus;
use common_services::database::favorite::FavoriteCount;
use common_services::database::gallery::Gallery;
use common_services::database::invite::invite::{Invite, InviteStatus, InviteType, PermissionSet};
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        root::handlers::health_check,
        // Visitor handlers
        invite::handlers::validate_invite_handler,
        invite::handlers::authorize_handler,
        invite::handlers::toggle_favorite_handler,
        invite::handlers::favorite_counts_handler,
        // Owner handlers
        owner::handlers::list_invites_handler,
        owner::handlers::create_invite_handler,
        owner::handlers::get_invite_handler,
        owner::handlers::update_invite_handler,
        owner::handlers::revoke_invite_handler,
        owner::handlers::delete_invite_handler,
    ),
    components(
        schemas(
            Invite,
            InviteType,
            InviteStatus,
            PermissionSet,
            Gallery,
            Operation,
            InvalidReason,
            EffectiveStatus,
            InviteMeta,
            ValidInvite,
            UsageReceipt,
            OperationContext,
            ValidateInviteRequest,
            AuthorizeRequest,
            CreateInviteRequest,
            UpdateInviteRequest,
            InviteSummary,
            FavoriteCount,
            ToggleFavoriteRequest,
            ToggleFavoriteResponse,
            FavoriteCountsRequest,
            FavoriteCountsResponse,
        ),
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Invite", description = "Endpoints for visitors holding an invite code"),
        (name = "Invite management", description = "Endpoints for photographers managing the invites of their galleries"),
        (name = "System", description = "Health check"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
