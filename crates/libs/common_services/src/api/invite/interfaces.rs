use crate::api::invite::permissions::Operation;
use crate::api::invite::status::EffectiveStatus;
use crate::database::gallery::Gallery;
use crate::database::invite::invite::{Invite, InviteStatus, InviteType, PermissionSet};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

// --- Visitor payloads ---

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ValidateInviteRequest {
    pub code: String,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeRequest {
    pub code: String,
    pub operation: Operation,
    /// Client-generated, one per browser session per gallery visit.
    pub visit_key: String,
    /// Set when the operation targets a single photo.
    pub photo_id: Option<String>,
}

/// The part of an invite a visitor gets to see.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InviteMeta {
    pub id: i64,
    #[serde(rename = "type")]
    pub invite_type: InviteType,
    pub status: InviteStatus,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_usage: Option<i32>,
    pub usage_count: i32,
}

impl From<&Invite> for InviteMeta {
    fn from(invite: &Invite) -> Self {
        Self {
            id: invite.id,
            invite_type: invite.invite_type,
            status: invite.status,
            expires_at: invite.expires_at,
            max_usage: invite.usage_limit(),
            usage_count: invite.usage_count,
        }
    }
}

/// Result of a successful validation. Nothing was consumed to produce it.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ValidInvite {
    pub invite: InviteMeta,
    pub gallery: Gallery,
    pub permissions: PermissionSet,
    pub allowed_operations: Vec<Operation>,
}

/// Usage state right after a successful consumption.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UsageReceipt {
    pub invite_id: i64,
    pub usage_count: i32,
    pub status: InviteStatus,
}

/// What the caller needs to carry out an authorized action.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct OperationContext {
    pub invite_id: i64,
    pub gallery: Gallery,
    pub permissions: PermissionSet,
    pub operation: Operation,
    pub photo_id: Option<String>,
    /// Present only when this call consumed a use of the invite.
    pub usage: Option<UsageReceipt>,
}

// --- Owner payloads ---

fn default_permissions() -> PermissionSet {
    PermissionSet {
        can_view: true,
        ..PermissionSet::default()
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateInviteRequest {
    #[serde(rename = "type")]
    pub invite_type: InviteType,
    pub client_email: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_usage: Option<i32>,
    /// Defaults to view-only.
    #[serde(default = "default_permissions")]
    pub permissions: PermissionSet,
}

/// Distinguishes an absent field from an explicit `null`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Partial owner edit. Absent fields are left untouched, `null` clears optional fields.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInviteRequest {
    #[serde(rename = "type")]
    pub invite_type: Option<InviteType>,
    pub status: Option<InviteStatus>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<DateTime<Utc>>)]
    pub expires_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub max_usage: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub client_email: Option<Option<String>>,
    pub can_view: Option<bool>,
    pub can_favorite: Option<bool>,
    pub can_comment: Option<bool>,
    pub can_download: Option<bool>,
    pub can_request_purchase: Option<bool>,
}

/// An invite as the owner sees it, with the status a visitor would actually run into.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct InviteSummary {
    #[serde(flatten)]
    pub invite: Invite,
    pub effective_status: EffectiveStatus,
}

// --- URL/Path Parameters ---

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Path)]
pub struct GalleryIdParams {
    pub gallery_id: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Path)]
pub struct InviteIdParams {
    pub invite_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use color_eyre::Result;

    #[test]
    fn update_request_tells_null_from_absent() -> Result<()> {
        let cleared: UpdateInviteRequest =
            serde_json::from_str(r#"{"expiresAt": null, "canFavorite": true}"#)?;
        let untouched: UpdateInviteRequest = serde_json::from_str("{}")?;

        assert_eq!(cleared.expires_at, Some(None));
        assert_eq!(cleared.can_favorite, Some(true));
        assert_eq!(untouched.expires_at, None);
        assert_eq!(untouched.max_usage, None);
        Ok(())
    }

    #[test]
    fn create_request_defaults_to_view_only() -> Result<()> {
        let request: CreateInviteRequest =
            serde_json::from_str(r#"{"type": "multi_use", "maxUsage": 5}"#)?;

        assert_eq!(request.invite_type, InviteType::MultiUse);
        assert_eq!(request.permissions.allowed_operations(), vec![Operation::View]);
        Ok(())
    }
}
