use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::fmt::Display;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, ToSchema, PartialEq, Eq, Hash)]
#[sqlx(type_name = "invite_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InviteType {
    SingleUse,
    MultiUse,
    TimeLimited,
}

impl Display for InviteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::SingleUse => "single_use",
            Self::MultiUse => "multi_use",
            Self::TimeLimited => "time_limited",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, ToSchema, PartialEq, Eq, Hash)]
#[sqlx(type_name = "invite_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InviteStatus {
    Pending,
    Active,
    Expired,
    Revoked,
}

impl Display for InviteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Revoked => "revoked",
        };
        f.write_str(s)
    }
}

/// The five capability flags of an invite. They are independent, no flag implies another.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, FromRow, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct PermissionSet {
    pub can_view: bool,
    pub can_favorite: bool,
    pub can_comment: bool,
    pub can_download: bool,
    pub can_request_purchase: bool,
}

/// Represents a single invite in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Invite {
    pub id: i64,
    pub code: String,
    pub gallery_id: String,
    pub client_email: Option<String>,
    #[serde(rename = "type")]
    pub invite_type: InviteType,
    pub status: InviteStatus,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_usage: Option<i32>,
    pub usage_count: i32,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub permissions: PermissionSet,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Bumped by every write, so any stale read loses its compare-and-swap.
    #[serde(skip)]
    pub version: i64,
}

impl Invite {
    /// The usage bound that applies to this invite, if any.
    /// Single-use invites are always bounded at one; time-limited invites never are.
    #[must_use]
    pub const fn usage_limit(&self) -> Option<i32> {
        match self.invite_type {
            InviteType::SingleUse => Some(1),
            InviteType::MultiUse => self.max_usage,
            InviteType::TimeLimited => None,
        }
    }

    #[must_use]
    pub const fn snapshot(&self) -> UsageSnapshot {
        UsageSnapshot {
            usage_count: self.usage_count,
            status: self.status,
            version: self.version,
        }
    }
}

/// Values required to insert an invite. `usage_count` always starts at zero.
#[derive(Debug, Clone)]
pub struct NewInvite {
    pub code: String,
    pub gallery_id: String,
    pub client_email: Option<String>,
    pub invite_type: InviteType,
    pub status: InviteStatus,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_usage: Option<i32>,
    pub permissions: PermissionSet,
}

/// The fields a conditional update compares against before writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageSnapshot {
    pub usage_count: i32,
    pub status: InviteStatus,
    pub version: i64,
}

/// The fields a consumption writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsagePatch {
    pub usage_count: i32,
    pub status: InviteStatus,
}

/// Fully resolved owner edit, written as a whole.
#[derive(Debug, Clone)]
pub struct InviteUpdate {
    pub invite_type: InviteType,
    pub status: InviteStatus,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_usage: Option<i32>,
    pub client_email: Option<String>,
    pub permissions: PermissionSet,
}
