use crate::api::invite::permissions::Operation;
use crate::database::DbError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use color_eyre::eyre;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{error, info, warn};
use utoipa::ToSchema;

/// Why an invite code cannot be used right now.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum InvalidReason {
    NotFound,
    Revoked,
    Expired,
    Exhausted,
}

#[derive(Debug, Error)]
pub enum InviteError {
    #[error("Invite not found")]
    NotFound,

    #[error("Invite was revoked")]
    Revoked,

    #[error("Invite has expired")]
    Expired,

    #[error("Invite usage limit reached")]
    Exhausted,

    #[error("Invite does not grant {0}")]
    PermissionDenied(Operation),

    #[error("Photo {0} is not part of this gallery")]
    PhotoNotFound(String),

    #[error("Ownership check failed: {0}")]
    OwnershipDenied(String),

    #[error("Lost the compare-and-swap race too often")]
    ConcurrencyConflict,

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Database error")]
    Database(#[from] DbError),

    #[error("internal error")]
    Internal(#[from] eyre::Report),
}

impl InviteError {
    /// Storage or internal faults, as opposed to ordinary domain outcomes.
    #[must_use]
    pub const fn is_fault(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Internal(_))
    }
}

impl From<InvalidReason> for InviteError {
    fn from(reason: InvalidReason) -> Self {
        match reason {
            InvalidReason::NotFound => Self::NotFound,
            InvalidReason::Revoked => Self::Revoked,
            InvalidReason::Expired => Self::Expired,
            InvalidReason::Exhausted => Self::Exhausted,
        }
    }
}

fn log_error(error: &InviteError) {
    match error {
        InviteError::NotFound
        | InviteError::Revoked
        | InviteError::Expired
        | InviteError::Exhausted => info!("Invite rejected: {}", error),
        InviteError::PermissionDenied(operation) => {
            info!("Invite -> Permission denied for {}", operation);
        }
        InviteError::PhotoNotFound(photo_id) => {
            warn!("Invite -> Photo {} requested outside its gallery", photo_id);
        }
        InviteError::OwnershipDenied(message) => {
            warn!("Invite management -> Ownership denied: {}", message);
        }
        InviteError::ConcurrencyConflict => {
            warn!("Invite -> Consumption kept losing the compare-and-swap race");
        }
        InviteError::BadRequest(message) => warn!("Invite -> Bad Request: {}", message),
        InviteError::Database(e) => error!("Invite -> Database query failed: {}", e),
        InviteError::Internal(e) => error!("Invite -> Internal error: {:?}", e),
    }
}

impl IntoResponse for InviteError {
    fn into_response(self) -> Response {
        log_error(&self);

        // Visitors are told the invite is unusable without learning which bucket applies.
        let (status, error_message) = match self {
            Self::NotFound
            | Self::Revoked
            | Self::Expired
            | Self::Exhausted
            | Self::ConcurrencyConflict => (
                StatusCode::GONE,
                "This invite is no longer valid.".to_string(),
            ),
            Self::PermissionDenied(operation) => (
                StatusCode::FORBIDDEN,
                format!("This invite does not allow {operation}."),
            ),
            Self::PhotoNotFound(_) => (StatusCode::NOT_FOUND, "Photo not found.".to_string()),
            Self::OwnershipDenied(_) => (StatusCode::NOT_FOUND, "Not found.".to_string()),
            Self::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, format!("Bad request: {message}"))
            }
            Self::Database(_) | Self::Internal(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "The system is temporarily unavailable.".to_string(),
            ),
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
