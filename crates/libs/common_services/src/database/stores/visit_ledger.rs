use crate::database::DbError;
use crate::database::invite::invite::{Invite, UsagePatch, UsageSnapshot};
use async_trait::async_trait;

/// Result of [`VisitLedger::enter_visit`].
#[derive(Debug, Clone)]
pub enum VisitEntry {
    /// The visit was recorded and the use written, in one step.
    Entered(Invite),
    /// The visit had already entered. Nothing was written.
    AlreadyEntered,
    /// The invite no longer matched the snapshot. Nothing was written.
    Stale,
}

/// Records which visits consumed usage of an invite.
///
/// A visit only exists once its use is committed, so a visit never counts as entered while
/// its consumption can still fail.
#[async_trait]
pub trait VisitLedger: Send + Sync {
    /// Record the visit and apply `patch` to the invite atomically. The patch is guarded by the
    /// same compare-and-swap as [`InviteStore::conditional_update_invite`].
    ///
    /// [`InviteStore::conditional_update_invite`]: crate::database::invite_store::InviteStore::conditional_update_invite
    async fn enter_visit(
        &self,
        invite_id: i64,
        visit_key: &str,
        expected: UsageSnapshot,
        patch: UsagePatch,
    ) -> Result<VisitEntry, DbError>;

    async fn has_visit(&self, invite_id: i64, visit_key: &str) -> Result<bool, DbError>;
}
