use crate::api::invite::error::InviteError;
use crate::api::invite::interfaces::{CreateInviteRequest, InviteSummary, UpdateInviteRequest};
use crate::api::invite::status::EffectiveStatus;
use crate::database::gallery::Gallery;
use crate::database::gallery_store::GalleryStore;
use crate::database::invite::invite::{
    Invite, InviteStatus, InviteType, InviteUpdate, NewInvite, PermissionSet,
};
use crate::database::invite_store::InviteStore;
use crate::database::{DbError, Stores};
use crate::utils::nice_id;
use app_state::InviteConstants;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{info, instrument, warn};

const CODE_GENERATION_ATTEMPTS: u32 = 5;

fn summarize(invite: Invite, now: DateTime<Utc>) -> InviteSummary {
    InviteSummary {
        effective_status: EffectiveStatus::of(&invite, now),
        invite,
    }
}

fn clean_email(email: Option<String>) -> Option<String> {
    email
        .map(|e| e.trim().to_owned())
        .filter(|e| !e.is_empty())
}

/// Usage bound and expiry an invite of `invite_type` ends up with.
fn bounds_for_type(
    invite_type: InviteType,
    max_usage: Option<i32>,
    expires_at: Option<DateTime<Utc>>,
) -> Result<(Option<i32>, Option<DateTime<Utc>>), InviteError> {
    match invite_type {
        InviteType::SingleUse => match max_usage {
            None | Some(1) => Ok((Some(1), expires_at)),
            Some(other) => Err(InviteError::BadRequest(format!(
                "single-use invites are bounded at 1, got {other}"
            ))),
        },
        InviteType::MultiUse => match max_usage {
            Some(max) if max >= 1 => Ok((Some(max), expires_at)),
            _ => Err(InviteError::BadRequest(
                "multi-use invites need a maxUsage of at least 1".to_string(),
            )),
        },
        InviteType::TimeLimited => match expires_at {
            Some(expires_at) => Ok((None, Some(expires_at))),
            None => Err(InviteError::BadRequest(
                "time-limited invites need an expiresAt".to_string(),
            )),
        },
    }
}

/// Whether an owner may move an invite from `from` to `to`.
/// `revoked` is final, `expired` may only be escalated to `revoked`.
fn check_transition(from: InviteStatus, to: InviteStatus) -> Result<(), InviteError> {
    let allowed = from == to
        || to == InviteStatus::Revoked
        || match from {
            InviteStatus::Pending => to == InviteStatus::Active || to == InviteStatus::Expired,
            InviteStatus::Active => to == InviteStatus::Expired,
            InviteStatus::Expired | InviteStatus::Revoked => false,
        };
    if allowed {
        Ok(())
    } else {
        Err(InviteError::BadRequest(format!(
            "cannot change status from {from} to {to}"
        )))
    }
}

/// Resolve a partial edit against the current record.
fn apply_patch(
    current: &Invite,
    patch: &UpdateInviteRequest,
    now: DateTime<Utc>,
) -> Result<InviteUpdate, InviteError> {
    // An unobserved time expiry counts as stored, so extending `expiresAt` cannot revive it.
    let current_status = match current.status {
        InviteStatus::Pending | InviteStatus::Active
            if current.expires_at.is_some_and(|e| e <= now) =>
        {
            InviteStatus::Expired
        }
        status => status,
    };
    let status = patch.status.unwrap_or(current_status);
    check_transition(current_status, status)?;

    let invite_type = patch.invite_type.unwrap_or(current.invite_type);
    let requested_max = patch.max_usage.unwrap_or(match invite_type {
        InviteType::MultiUse => current.max_usage,
        _ => None,
    });
    let requested_expiry = patch.expires_at.unwrap_or(current.expires_at);
    let (max_usage, expires_at) = bounds_for_type(invite_type, requested_max, requested_expiry)?;

    if let Some(max) = max_usage
        && max < current.usage_count
    {
        return Err(InviteError::BadRequest(format!(
            "maxUsage {max} is below the {} uses already counted",
            current.usage_count
        )));
    }

    let permissions = PermissionSet {
        can_view: patch.can_view.unwrap_or(current.permissions.can_view),
        can_favorite: patch.can_favorite.unwrap_or(current.permissions.can_favorite),
        can_comment: patch.can_comment.unwrap_or(current.permissions.can_comment),
        can_download: patch.can_download.unwrap_or(current.permissions.can_download),
        can_request_purchase: patch
            .can_request_purchase
            .unwrap_or(current.permissions.can_request_purchase),
    };

    Ok(InviteUpdate {
        invite_type,
        status,
        expires_at,
        max_usage,
        client_email: clean_email(
            patch
                .client_email
                .clone()
                .unwrap_or_else(|| current.client_email.clone()),
        ),
        permissions,
    })
}

/// Invite CRUD for the photographer owning the gallery.
/// Every call re-checks ownership; a failed check looks exactly like a missing record.
#[derive(Clone)]
pub struct InviteManager {
    invites: Arc<dyn InviteStore>,
    galleries: Arc<dyn GalleryStore>,
    constants: InviteConstants,
}

impl InviteManager {
    #[must_use]
    pub fn new(stores: &Stores, constants: InviteConstants) -> Self {
        Self {
            invites: stores.invites.clone(),
            galleries: stores.galleries.clone(),
            constants,
        }
    }

    async fn owned_gallery(&self, user_id: i32, gallery_id: &str) -> Result<Gallery, InviteError> {
        self.galleries
            .get_owned_gallery(gallery_id, user_id)
            .await?
            .ok_or_else(|| {
                InviteError::OwnershipDenied(format!("user {user_id} on gallery {gallery_id}"))
            })
    }

    async fn owned_invite(&self, user_id: i32, invite_id: i64) -> Result<Invite, InviteError> {
        self.invites
            .get_invite_with_ownership(invite_id, user_id)
            .await?
            .ok_or_else(|| {
                InviteError::OwnershipDenied(format!("user {user_id} on invite {invite_id}"))
            })
    }

    #[instrument(skip(self, request))]
    pub async fn create_invite(
        &self,
        user_id: i32,
        gallery_id: &str,
        request: CreateInviteRequest,
    ) -> Result<InviteSummary, InviteError> {
        let gallery = self.owned_gallery(user_id, gallery_id).await?;

        let now = Utc::now();
        let expires_at = match (request.invite_type, request.expires_at) {
            (InviteType::TimeLimited, None) => {
                Some(now + Duration::hours(self.constants.default_time_limit_hours))
            }
            (_, expires_at) => expires_at,
        };
        if expires_at.is_some_and(|e| e <= now) {
            return Err(InviteError::BadRequest(
                "expiresAt must be in the future".to_string(),
            ));
        }
        let (max_usage, expires_at) =
            bounds_for_type(request.invite_type, request.max_usage, expires_at)?;

        let mut new_invite = NewInvite {
            code: String::new(),
            gallery_id: gallery.id,
            client_email: clean_email(request.client_email),
            invite_type: request.invite_type,
            status: InviteStatus::Pending,
            expires_at,
            max_usage,
            permissions: request.permissions,
        };

        for _ in 0..CODE_GENERATION_ATTEMPTS {
            new_invite.code = nice_id(self.constants.code_length);
            match self.invites.insert_invite(&new_invite).await {
                Ok(invite) => {
                    info!(
                        "Created {} invite {} for gallery {}",
                        invite.invite_type, invite.id, invite.gallery_id
                    );
                    return Ok(summarize(invite, now));
                }
                Err(DbError::UniqueViolation(_)) => {
                    warn!("Invite code collision, generating a new one");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(InviteError::Internal(color_eyre::eyre::eyre!(
            "no unique invite code after {CODE_GENERATION_ATTEMPTS} attempts"
        )))
    }

    #[instrument(skip(self))]
    pub async fn get_invite(
        &self,
        user_id: i32,
        invite_id: i64,
    ) -> Result<InviteSummary, InviteError> {
        let invite = self.owned_invite(user_id, invite_id).await?;
        Ok(summarize(invite, Utc::now()))
    }

    /// The owner's audit view: every invite of the gallery with its effective status.
    #[instrument(skip(self))]
    pub async fn list_invites(
        &self,
        user_id: i32,
        gallery_id: &str,
    ) -> Result<Vec<InviteSummary>, InviteError> {
        let gallery = self.owned_gallery(user_id, gallery_id).await?;
        let now = Utc::now();
        let invites = self.invites.list_invites_for_gallery(&gallery.id).await?;
        Ok(invites
            .into_iter()
            .map(|invite| summarize(invite, now))
            .collect())
    }

    /// Apply a partial edit. Retries on a fresh read when any concurrent write got there first,
    /// so concurrent edits of different fields all survive.
    #[instrument(skip(self, patch))]
    pub async fn update_invite(
        &self,
        user_id: i32,
        invite_id: i64,
        patch: &UpdateInviteRequest,
    ) -> Result<InviteSummary, InviteError> {
        for _ in 0..self.constants.consume_max_attempts.max(1) {
            let current = self.owned_invite(user_id, invite_id).await?;
            let now = Utc::now();
            let update = apply_patch(&current, patch, now)?;

            if let Some(updated) = self
                .invites
                .update_invite(current.id, current.snapshot(), &update)
                .await?
            {
                info!("Invite {} updated (status {})", updated.id, updated.status);
                return Ok(summarize(updated, now));
            }
        }
        Err(InviteError::ConcurrencyConflict)
    }

    #[instrument(skip(self))]
    pub async fn revoke_invite(
        &self,
        user_id: i32,
        invite_id: i64,
    ) -> Result<InviteSummary, InviteError> {
        let patch = UpdateInviteRequest {
            status: Some(InviteStatus::Revoked),
            ..UpdateInviteRequest::default()
        };
        self.update_invite(user_id, invite_id, &patch).await
    }

    /// Hard delete, there is no way back.
    #[instrument(skip(self))]
    pub async fn delete_invite(&self, user_id: i32, invite_id: i64) -> Result<(), InviteError> {
        let invite = self.owned_invite(user_id, invite_id).await?;
        if !self.invites.delete_invite(invite.id).await? {
            return Err(InviteError::OwnershipDenied(format!(
                "invite {invite_id} vanished before deletion"
            )));
        }
        info!("Deleted invite {} of gallery {}", invite.id, invite.gallery_id);
        Ok(())
    }
}
