use crate::api::invite::error::{InvalidReason, InviteError};
use crate::api::invite::interfaces::{OperationContext, UsageReceipt, ValidInvite};
use crate::api::invite::permissions::{Operation, is_allowed};
use crate::api::invite::usage::UsageTracker;
use crate::api::invite::validator::InviteValidator;
use crate::database::Stores;
use crate::database::gallery_store::GalleryStore;
use crate::database::invite::invite::Invite;
use crate::database::visit_ledger::VisitLedger;
use crate::utils::redact_code;
use app_state::InviteConstants;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// What an operation acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessTarget {
    Gallery,
    Photo(String),
}

impl AccessTarget {
    #[must_use]
    pub fn photo_id(&self) -> Option<&str> {
        match self {
            Self::Gallery => None,
            Self::Photo(photo_id) => Some(photo_id),
        }
    }
}

impl From<Option<String>> for AccessTarget {
    fn from(photo_id: Option<String>) -> Self {
        photo_id.map_or(Self::Gallery, Self::Photo)
    }
}

/// Identifies one gallery visit: a browser session, not a page load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitContext {
    pub visit_key: String,
}

impl VisitContext {
    pub fn new(visit_key: impl Into<String>) -> Self {
        Self {
            visit_key: visit_key.into(),
        }
    }
}

/// Single entry point answering "may code X perform operation Y on gallery or photo Z".
///
/// The first authorized operation of a visit enters the gallery: the visit is recorded and one
/// use of the invite consumed in the same write. Later operations of the same visit re-check the
/// invite and its permissions but never consume again.
#[derive(Clone)]
pub struct GalleryAccessGateway {
    validator: InviteValidator,
    tracker: UsageTracker,
    visits: Arc<dyn VisitLedger>,
    galleries: Arc<dyn GalleryStore>,
}

impl GalleryAccessGateway {
    #[must_use]
    pub fn new(stores: &Stores, constants: &InviteConstants) -> Self {
        Self {
            validator: InviteValidator::new(stores),
            tracker: UsageTracker::new(stores, constants.consume_max_attempts),
            visits: stores.visits.clone(),
            galleries: stores.galleries.clone(),
        }
    }

    pub async fn validate(&self, code: &str) -> Result<ValidInvite, InviteError> {
        self.validator.validate(code).await
    }

    pub async fn consume(&self, code: &str) -> Result<UsageReceipt, InviteError> {
        self.tracker.consume(code).await
    }

    #[instrument(skip(self, code, visit), fields(code = %redact_code(code)))]
    pub async fn authorize(
        &self,
        code: &str,
        operation: Operation,
        target: &AccessTarget,
        visit: &VisitContext,
    ) -> Result<OperationContext, InviteError> {
        let resolved = self.validator.resolve(code).await?;
        let invite = resolved.invite;

        if let Err(reason) = resolved.status {
            // A visit keeps access to an invite its own entry used up.
            let waived = reason == InvalidReason::Exhausted
                && self.visits.has_visit(invite.id, &visit.visit_key).await?;
            if !waived {
                return Err(reason.into());
            }
            debug!("Invite {} is exhausted, visit already entered", invite.id);
        }

        if !is_allowed(&invite.permissions, operation) {
            return Err(InviteError::PermissionDenied(operation));
        }

        if let Some(photo_id) = target.photo_id() {
            let photo_gallery = self.galleries.photo_gallery_id(photo_id).await?;
            if photo_gallery.as_deref() != Some(invite.gallery_id.as_str()) {
                return Err(InviteError::PhotoNotFound(photo_id.to_owned()));
            }
        }

        let usage = self.enter(&invite, visit).await?;

        Ok(OperationContext {
            invite_id: invite.id,
            gallery: resolved.gallery,
            permissions: invite.permissions,
            operation,
            photo_id: target.photo_id().map(ToOwned::to_owned),
            usage,
        })
    }

    /// Record the visit and consume a use, unless the visit already entered.
    async fn enter(
        &self,
        invite: &Invite,
        visit: &VisitContext,
    ) -> Result<Option<UsageReceipt>, InviteError> {
        if self.visits.has_visit(invite.id, &visit.visit_key).await? {
            return Ok(None);
        }

        match self
            .tracker
            .consume_for_visit(invite.clone(), &visit.visit_key)
            .await
        {
            Ok(Some(receipt)) => {
                info!("New visit entered gallery {} via invite {}", invite.gallery_id, invite.id);
                Ok(Some(receipt))
            }
            Ok(None) => Ok(None),
            // A concurrent request of the same visit may have taken the last use.
            Err(InviteError::Exhausted) => {
                if self.visits.has_visit(invite.id, &visit.visit_key).await? {
                    Ok(None)
                } else {
                    Err(InviteError::Exhausted)
                }
            }
            Err(e) => Err(e),
        }
    }
}
