use crate::database::DbError;
use crate::database::invite::invite::{
    Invite, InviteUpdate, NewInvite, UsagePatch, UsageSnapshot,
};
use async_trait::async_trait;

/// Persistence of invite records. Holds no logic beyond atomic reads and updates.
#[async_trait]
pub trait InviteStore: Send + Sync {
    /// Fails with [`DbError::UniqueViolation`] when the code is already taken.
    async fn insert_invite(&self, invite: &NewInvite) -> Result<Invite, DbError>;

    /// Exact, case-sensitive lookup.
    async fn get_invite_by_code(&self, code: &str) -> Result<Option<Invite>, DbError>;

    async fn get_invite_by_id(&self, invite_id: i64) -> Result<Option<Invite>, DbError>;

    /// The invite, but only when `user_id` owns the gallery it belongs to.
    async fn get_invite_with_ownership(
        &self,
        invite_id: i64,
        user_id: i32,
    ) -> Result<Option<Invite>, DbError>;

    async fn list_invites_for_gallery(&self, gallery_id: &str) -> Result<Vec<Invite>, DbError>;

    /// Compare-and-swap on `(usage_count, status, version)`. Writes `patch` only when the stored
    /// row still matches `expected` and the new count stays within `max_usage`.
    /// Returns `None` when the comparison failed.
    async fn conditional_update_invite(
        &self,
        invite_id: i64,
        expected: UsageSnapshot,
        patch: UsagePatch,
    ) -> Result<Option<Invite>, DbError>;

    /// Owner edit, guarded by the same compare-and-swap as consumption. The version makes a
    /// patch computed from a stale read fail even when count and status did not move.
    async fn update_invite(
        &self,
        invite_id: i64,
        expected: UsageSnapshot,
        update: &InviteUpdate,
    ) -> Result<Option<Invite>, DbError>;

    /// Persist an observed time expiry. Only `pending` and `active` invites are touched.
    async fn mark_expired(&self, invite_id: i64) -> Result<(), DbError>;

    /// Hard delete. Returns whether a row was removed.
    async fn delete_invite(&self, invite_id: i64) -> Result<bool, DbError>;

    /// Cheap reachability probe for health checks.
    async fn ping(&self) -> Result<(), DbError> {
        Ok(())
    }
}
