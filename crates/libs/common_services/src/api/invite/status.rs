//! The one place where an invite's effective state is derived from its stored fields.
//! Nothing else compares timestamps or counts to decide whether an invite is usable.

use crate::api::invite::error::InvalidReason;
use crate::database::invite::invite::{Invite, InviteStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Resolve whether an invite is usable at `now`. First match wins:
/// revoked, then past `expires_at`, then usage bound reached, then a stored `expired` status.
pub fn effective_status(invite: &Invite, now: DateTime<Utc>) -> Result<(), InvalidReason> {
    if invite.status == InviteStatus::Revoked {
        return Err(InvalidReason::Revoked);
    }
    if invite.expires_at.is_some_and(|expires_at| expires_at <= now) {
        return Err(InvalidReason::Expired);
    }
    if invite
        .usage_limit()
        .is_some_and(|limit| invite.usage_count >= limit)
    {
        return Err(InvalidReason::Exhausted);
    }
    if invite.status == InviteStatus::Expired {
        return Err(InvalidReason::Expired);
    }
    Ok(())
}

/// `true` when the stored status lags behind an observed time expiry.
#[must_use]
pub fn needs_expiry_write(invite: &Invite, reason: InvalidReason) -> bool {
    reason == InvalidReason::Expired
        && matches!(invite.status, InviteStatus::Pending | InviteStatus::Active)
}

/// Status after one more successful consumption.
#[must_use]
pub fn status_after_use(invite: &Invite, usage_count: i32) -> InviteStatus {
    match invite.usage_limit() {
        Some(limit) if usage_count >= limit => InviteStatus::Expired,
        _ => InviteStatus::Active,
    }
}

/// Effective state as shown to the owner.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum EffectiveStatus {
    Valid,
    Revoked,
    Expired,
    Exhausted,
}

impl EffectiveStatus {
    #[must_use]
    pub fn of(invite: &Invite, now: DateTime<Utc>) -> Self {
        match effective_status(invite, now) {
            Ok(()) => Self::Valid,
            Err(InvalidReason::Revoked) => Self::Revoked,
            Err(InvalidReason::Exhausted) => Self::Exhausted,
            Err(InvalidReason::Expired | InvalidReason::NotFound) => Self::Expired,
        }
    }
}
