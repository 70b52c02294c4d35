//! In-memory implementation of every store.
//!
//! Suitable for development and tests. Each trait method takes the single lock once, so every
//! method is atomic with respect to every other, which matches the guarantees of [`PgStore`].
//!
//! [`PgStore`]: crate::database::pg_store::PgStore

use crate::database::DbError;
use crate::database::favorite::{FavoriteCount, FavoriteToggle, NewFavoriteToggle, ToggleOutcome};
use crate::database::favorite_store::FavoriteCountStore;
use crate::database::gallery::Gallery;
use crate::database::gallery_store::GalleryStore;
use crate::database::invite::invite::{
    Invite, InviteStatus, InviteUpdate, NewInvite, UsagePatch, UsageSnapshot,
};
use crate::database::invite_store::InviteStore;
use crate::database::visit_ledger::{VisitEntry, VisitLedger};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct MemoryState {
    next_invite_id: i64,
    invites: HashMap<i64, Invite>,
    galleries: HashMap<String, Gallery>,
    /// photo id -> gallery id
    photos: HashMap<String, String>,
    visits: HashSet<(i64, String)>,
    favorite_counts: HashMap<String, i32>,
    toggles: HashMap<Uuid, FavoriteToggle>,
}

impl MemoryState {
    fn apply_usage(
        &mut self,
        invite_id: i64,
        expected: UsageSnapshot,
        patch: UsagePatch,
    ) -> Option<Invite> {
        let invite = self.invites.get_mut(&invite_id)?;
        let within_bound = invite.max_usage.is_none_or(|max| patch.usage_count <= max);
        if invite.snapshot() != expected || !within_bound {
            return None;
        }
        invite.usage_count = patch.usage_count;
        invite.status = patch.status;
        invite.version += 1;
        invite.updated_at = Utc::now();
        Some(invite.clone())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Galleries are created elsewhere in production; this seeds one.
    pub async fn insert_gallery(&self, gallery: Gallery) {
        let mut state = self.state.lock().await;
        state.galleries.insert(gallery.id.clone(), gallery);
    }

    pub async fn insert_photo(&self, photo_id: &str, gallery_id: &str) {
        let mut state = self.state.lock().await;
        state
            .photos
            .insert(photo_id.to_owned(), gallery_id.to_owned());
    }
}

#[async_trait]
impl InviteStore for MemoryStore {
    async fn insert_invite(&self, invite: &NewInvite) -> Result<Invite, DbError> {
        let mut state = self.state.lock().await;
        if state.invites.values().any(|i| i.code == invite.code) {
            return Err(DbError::UniqueViolation(format!(
                "invite code {} already exists",
                invite.code
            )));
        }
        state.next_invite_id += 1;
        let now = Utc::now();
        let created = Invite {
            id: state.next_invite_id,
            code: invite.code.clone(),
            gallery_id: invite.gallery_id.clone(),
            client_email: invite.client_email.clone(),
            invite_type: invite.invite_type,
            status: invite.status,
            expires_at: invite.expires_at,
            max_usage: invite.max_usage,
            usage_count: 0,
            permissions: invite.permissions,
            created_at: now,
            updated_at: now,
            version: 0,
        };
        state.invites.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_invite_by_code(&self, code: &str) -> Result<Option<Invite>, DbError> {
        let state = self.state.lock().await;
        Ok(state.invites.values().find(|i| i.code == code).cloned())
    }

    async fn get_invite_by_id(&self, invite_id: i64) -> Result<Option<Invite>, DbError> {
        let state = self.state.lock().await;
        Ok(state.invites.get(&invite_id).cloned())
    }

    async fn get_invite_with_ownership(
        &self,
        invite_id: i64,
        user_id: i32,
    ) -> Result<Option<Invite>, DbError> {
        let state = self.state.lock().await;
        Ok(state
            .invites
            .get(&invite_id)
            .filter(|invite| {
                state
                    .galleries
                    .get(&invite.gallery_id)
                    .is_some_and(|g| g.owner_id == user_id)
            })
            .cloned())
    }

    async fn list_invites_for_gallery(&self, gallery_id: &str) -> Result<Vec<Invite>, DbError> {
        let state = self.state.lock().await;
        let mut invites: Vec<Invite> = state
            .invites
            .values()
            .filter(|i| i.gallery_id == gallery_id)
            .cloned()
            .collect();
        invites.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(invites)
    }

    async fn conditional_update_invite(
        &self,
        invite_id: i64,
        expected: UsageSnapshot,
        patch: UsagePatch,
    ) -> Result<Option<Invite>, DbError> {
        let mut state = self.state.lock().await;
        Ok(state.apply_usage(invite_id, expected, patch))
    }

    async fn update_invite(
        &self,
        invite_id: i64,
        expected: UsageSnapshot,
        update: &InviteUpdate,
    ) -> Result<Option<Invite>, DbError> {
        let mut state = self.state.lock().await;
        let Some(invite) = state.invites.get_mut(&invite_id) else {
            return Ok(None);
        };
        if invite.snapshot() != expected {
            return Ok(None);
        }
        invite.invite_type = update.invite_type;
        invite.status = update.status;
        invite.expires_at = update.expires_at;
        invite.max_usage = update.max_usage;
        invite.client_email.clone_from(&update.client_email);
        invite.permissions = update.permissions;
        invite.version += 1;
        invite.updated_at = Utc::now();
        Ok(Some(invite.clone()))
    }

    async fn mark_expired(&self, invite_id: i64) -> Result<(), DbError> {
        let mut state = self.state.lock().await;
        if let Some(invite) = state.invites.get_mut(&invite_id)
            && matches!(invite.status, InviteStatus::Pending | InviteStatus::Active)
        {
            invite.status = InviteStatus::Expired;
            invite.version += 1;
            invite.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete_invite(&self, invite_id: i64) -> Result<bool, DbError> {
        let mut state = self.state.lock().await;
        state.visits.retain(|(id, _)| *id != invite_id);
        Ok(state.invites.remove(&invite_id).is_some())
    }
}

#[async_trait]
impl GalleryStore for MemoryStore {
    async fn get_gallery(&self, gallery_id: &str) -> Result<Option<Gallery>, DbError> {
        let state = self.state.lock().await;
        Ok(state.galleries.get(gallery_id).cloned())
    }

    async fn get_owned_gallery(
        &self,
        gallery_id: &str,
        user_id: i32,
    ) -> Result<Option<Gallery>, DbError> {
        let state = self.state.lock().await;
        Ok(state
            .galleries
            .get(gallery_id)
            .filter(|g| g.owner_id == user_id)
            .cloned())
    }

    async fn photo_gallery_id(&self, photo_id: &str) -> Result<Option<String>, DbError> {
        let state = self.state.lock().await;
        Ok(state.photos.get(photo_id).cloned())
    }

    async fn photos_in_gallery(
        &self,
        gallery_id: &str,
        photo_ids: &[String],
    ) -> Result<Vec<String>, DbError> {
        let state = self.state.lock().await;
        Ok(photo_ids
            .iter()
            .filter(|id| state.photos.get(*id).is_some_and(|g| g == gallery_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl VisitLedger for MemoryStore {
    async fn enter_visit(
        &self,
        invite_id: i64,
        visit_key: &str,
        expected: UsageSnapshot,
        patch: UsagePatch,
    ) -> Result<VisitEntry, DbError> {
        let mut state = self.state.lock().await;
        let visit = (invite_id, visit_key.to_owned());
        if state.visits.contains(&visit) {
            return Ok(VisitEntry::AlreadyEntered);
        }
        let Some(updated) = state.apply_usage(invite_id, expected, patch) else {
            return Ok(VisitEntry::Stale);
        };
        state.visits.insert(visit);
        Ok(VisitEntry::Entered(updated))
    }

    async fn has_visit(&self, invite_id: i64, visit_key: &str) -> Result<bool, DbError> {
        let state = self.state.lock().await;
        Ok(state.visits.contains(&(invite_id, visit_key.to_owned())))
    }
}

#[async_trait]
impl FavoriteCountStore for MemoryStore {
    async fn apply_favorite_toggle(
        &self,
        toggle: &NewFavoriteToggle,
    ) -> Result<ToggleOutcome, DbError> {
        let mut state = self.state.lock().await;
        if let Some(recorded) = state.toggles.get(&toggle.toggle_id) {
            return Ok(ToggleOutcome {
                toggle: recorded.clone(),
                replayed: true,
            });
        }

        let count = state
            .favorite_counts
            .entry(toggle.photo_id.clone())
            .or_insert(0);
        *count = if toggle.favorited {
            *count + 1
        } else {
            (*count - 1).max(0)
        };
        let favorite_count = *count;

        let applied = FavoriteToggle {
            toggle_id: toggle.toggle_id,
            invite_id: toggle.invite_id,
            photo_id: toggle.photo_id.clone(),
            favorited: toggle.favorited,
            favorite_count,
            created_at: Utc::now(),
        };
        state.toggles.insert(applied.toggle_id, applied.clone());
        Ok(ToggleOutcome {
            toggle: applied,
            replayed: false,
        })
    }

    async fn get_favorite_counts(
        &self,
        photo_ids: &[String],
    ) -> Result<Vec<FavoriteCount>, DbError> {
        let state = self.state.lock().await;
        Ok(photo_ids
            .iter()
            .map(|photo_id| FavoriteCount {
                photo_id: photo_id.clone(),
                favorite_count: state.favorite_counts.get(photo_id).copied().unwrap_or(0),
            })
            .collect())
    }
}
