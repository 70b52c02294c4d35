use crate::api::invite::error::{InvalidReason, InviteError};
use crate::api::invite::interfaces::{InviteMeta, ValidInvite};
use crate::api::invite::status::{effective_status, needs_expiry_write};
use crate::database::Stores;
use crate::database::gallery::Gallery;
use crate::database::gallery_store::GalleryStore;
use crate::database::invite::invite::Invite;
use crate::database::invite_store::InviteStore;
use crate::utils::redact_code;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// An invite looked up by code, together with its gallery and effective status.
#[derive(Debug, Clone)]
pub struct ResolvedInvite {
    pub invite: Invite,
    pub gallery: Gallery,
    pub status: Result<(), InvalidReason>,
}

/// Derive the effective status and persist an observed time expiry.
/// A failed expiry write is logged and otherwise ignored; the next read observes it again.
pub(crate) async fn observe_status(
    invites: &dyn InviteStore,
    invite: &Invite,
) -> Result<(), InvalidReason> {
    let status = effective_status(invite, Utc::now());
    if let Err(reason) = status
        && needs_expiry_write(invite, reason)
    {
        match invites.mark_expired(invite.id).await {
            Ok(()) => debug!("Stored expiry of invite {}", invite.id),
            Err(e) => warn!("Could not store expiry of invite {}: {}", invite.id, e),
        }
    }
    status
}

/// Read-only resolution of invite codes. Never consumes usage.
#[derive(Clone)]
pub struct InviteValidator {
    invites: Arc<dyn InviteStore>,
    galleries: Arc<dyn GalleryStore>,
}

impl InviteValidator {
    #[must_use]
    pub fn new(stores: &Stores) -> Self {
        Self {
            invites: stores.invites.clone(),
            galleries: stores.galleries.clone(),
        }
    }

    /// Look up a code and derive its status, without failing on an unusable invite.
    /// Only a missing invite (or a missing gallery) is an error here.
    #[instrument(skip(self, code), fields(code = %redact_code(code)))]
    pub async fn resolve(&self, code: &str) -> Result<ResolvedInvite, InviteError> {
        let Some(invite) = self.invites.get_invite_by_code(code).await? else {
            return Err(InviteError::NotFound);
        };
        let status = observe_status(self.invites.as_ref(), &invite).await;
        let Some(gallery) = self.galleries.get_gallery(&invite.gallery_id).await? else {
            warn!(
                "Invite {} points at missing gallery {}",
                invite.id, invite.gallery_id
            );
            return Err(InviteError::NotFound);
        };

        Ok(ResolvedInvite {
            invite,
            gallery,
            status,
        })
    }

    /// The gallery and permissions a code currently grants.
    #[instrument(skip(self, code), fields(code = %redact_code(code)))]
    pub async fn validate(&self, code: &str) -> Result<ValidInvite, InviteError> {
        let resolved = self.resolve(code).await?;
        resolved.status?;

        let invite = resolved.invite;
        Ok(ValidInvite {
            invite: InviteMeta::from(&invite),
            gallery: resolved.gallery,
            permissions: invite.permissions,
            allowed_operations: invite.permissions.allowed_operations(),
        })
    }
}
