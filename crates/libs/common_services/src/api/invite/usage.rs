use crate::api::invite::error::InviteError;
use crate::api::invite::interfaces::UsageReceipt;
use crate::api::invite::status::status_after_use;
use crate::api::invite::validator::observe_status;
use crate::database::Stores;
use crate::database::invite::invite::{Invite, UsagePatch};
use crate::database::invite_store::InviteStore;
use crate::database::visit_ledger::{VisitEntry, VisitLedger};
use crate::utils::redact_code;
use color_eyre::eyre::eyre;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Counts uses against an invite's bound. Every increment is a compare-and-swap on
/// `(usage_count, status, version)`, retried on a fresh read when another writer got there first.
#[derive(Clone)]
pub struct UsageTracker {
    invites: Arc<dyn InviteStore>,
    visits: Arc<dyn VisitLedger>,
    max_attempts: u32,
}

impl UsageTracker {
    #[must_use]
    pub fn new(stores: &Stores, max_attempts: u32) -> Self {
        Self {
            invites: stores.invites.clone(),
            visits: stores.visits.clone(),
            max_attempts: max_attempts.max(1),
        }
    }

    /// Consume one use of the invite behind `code`.
    ///
    /// Not idempotent. A caller that timed out must re-validate before deciding to call again.
    #[instrument(skip(self, code), fields(code = %redact_code(code)))]
    pub async fn consume(&self, code: &str) -> Result<UsageReceipt, InviteError> {
        let Some(invite) = self.invites.get_invite_by_code(code).await? else {
            return Err(InviteError::NotFound);
        };
        self.consume_invite(invite).await
    }

    /// Consume one use, starting from an already loaded (possibly stale) record.
    #[instrument(skip(self, invite), fields(invite_id = invite.id))]
    pub async fn consume_invite(&self, invite: Invite) -> Result<UsageReceipt, InviteError> {
        let invite_id = invite.id;
        self.consume_with(invite, None).await?.ok_or_else(|| {
            InviteError::Internal(eyre!("consume of invite {invite_id} reported a visit"))
        })
    }

    /// Consume one use on behalf of a visit, recording the visit in the same write.
    /// `None` when the visit had already entered, in which case nothing is consumed.
    #[instrument(skip(self, invite, visit_key), fields(invite_id = invite.id))]
    pub async fn consume_for_visit(
        &self,
        invite: Invite,
        visit_key: &str,
    ) -> Result<Option<UsageReceipt>, InviteError> {
        self.consume_with(invite, Some(visit_key)).await
    }

    async fn consume_with(
        &self,
        mut invite: Invite,
        visit_key: Option<&str>,
    ) -> Result<Option<UsageReceipt>, InviteError> {
        for attempt in 1..=self.max_attempts {
            observe_status(self.invites.as_ref(), &invite).await?;

            let usage_count = invite.usage_count + 1;
            let patch = UsagePatch {
                usage_count,
                status: status_after_use(&invite, usage_count),
            };
            let entry = match visit_key {
                Some(visit_key) => {
                    self.visits
                        .enter_visit(invite.id, visit_key, invite.snapshot(), patch)
                        .await?
                }
                None => self
                    .invites
                    .conditional_update_invite(invite.id, invite.snapshot(), patch)
                    .await?
                    .map_or(VisitEntry::Stale, VisitEntry::Entered),
            };

            match entry {
                VisitEntry::Entered(updated) => {
                    info!(
                        "Consumed invite {} ({} uses, now {})",
                        updated.id, updated.usage_count, updated.status
                    );
                    return Ok(Some(UsageReceipt {
                        invite_id: updated.id,
                        usage_count: updated.usage_count,
                        status: updated.status,
                    }));
                }
                VisitEntry::AlreadyEntered => return Ok(None),
                VisitEntry::Stale => {
                    debug!("Lost consume race on invite {}, attempt {}", invite.id, attempt);
                    invite = self
                        .invites
                        .get_invite_by_id(invite.id)
                        .await?
                        .ok_or(InviteError::NotFound)?;
                }
            }
        }

        Err(InviteError::ConcurrencyConflict)
    }
}
