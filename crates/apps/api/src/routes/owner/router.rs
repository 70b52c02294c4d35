use crate::api_state::ApiContext;
use crate::owner::handlers::{
    create_invite_handler, delete_invite_handler, get_invite_handler, list_invites_handler,
    revoke_invite_handler, update_invite_handler,
};
use axum::{
    Router,
    routing::{get, post},
};

pub fn owner_protected_router() -> Router<ApiContext> {
    Router::new()
        .route(
            "/gallery/{gallery_id}/invites",
            get(list_invites_handler).post(create_invite_handler),
        )
        .route(
            "/invites/{invite_id}",
            get(get_invite_handler)
                .patch(update_invite_handler)
                .delete(delete_invite_handler),
        )
        .route("/invites/{invite_id}/revoke", post(revoke_invite_handler))
}
