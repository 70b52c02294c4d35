//! Seeded in-memory stores shared by the invite tests.

use crate::database::gallery::Gallery;
use crate::database::invite::invite::{
    Invite, InviteStatus, InviteType, InviteUpdate, NewInvite, PermissionSet, UsagePatch,
    UsageSnapshot,
};
use crate::database::invite_store::InviteStore;
use crate::database::memory_store::MemoryStore;
use crate::database::{DbError, Stores};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use color_eyre::Result;
use color_eyre::eyre::eyre;
use std::sync::Arc;

pub const GALLERY_A: &str = "gallery-a";
pub const GALLERY_B: &str = "gallery-b";
pub const OWNER_A: i32 = 1;
pub const OWNER_B: i32 = 2;

pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub stores: Stores,
}

/// Two galleries with different owners, two photos in A and one in B.
pub async fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    store
        .insert_gallery(Gallery {
            id: GALLERY_A.to_owned(),
            title: "Wedding".to_owned(),
            owner_id: OWNER_A,
        })
        .await;
    store
        .insert_gallery(Gallery {
            id: GALLERY_B.to_owned(),
            title: "Portraits".to_owned(),
            owner_id: OWNER_B,
        })
        .await;
    store.insert_photo("photo-a1", GALLERY_A).await;
    store.insert_photo("photo-a2", GALLERY_A).await;
    store.insert_photo("photo-b1", GALLERY_B).await;

    let stores = Stores::from_backend(store.clone());
    Fixture { store, stores }
}

pub fn view_only() -> PermissionSet {
    PermissionSet {
        can_view: true,
        ..PermissionSet::default()
    }
}

pub fn all_permissions() -> PermissionSet {
    PermissionSet {
        can_view: true,
        can_favorite: true,
        can_comment: true,
        can_download: true,
        can_request_purchase: true,
    }
}

pub struct InviteSeed {
    pub code: &'static str,
    pub invite_type: InviteType,
    pub max_usage: Option<i32>,
    pub expires_at: Option<DateTime<Utc>>,
    pub permissions: PermissionSet,
}

impl InviteSeed {
    pub fn new(code: &'static str, invite_type: InviteType, max_usage: Option<i32>) -> Self {
        Self {
            code,
            invite_type,
            max_usage,
            expires_at: None,
            permissions: view_only(),
        }
    }
}

/// Inserts an `active` invite into gallery A.
pub async fn seed_invite(fixture: &Fixture, seed: InviteSeed) -> Result<Invite> {
    let invite = fixture
        .store
        .insert_invite(&NewInvite {
            code: seed.code.to_owned(),
            gallery_id: GALLERY_A.to_owned(),
            client_email: None,
            invite_type: seed.invite_type,
            status: InviteStatus::Pending,
            expires_at: seed.expires_at,
            max_usage: seed.max_usage,
            permissions: seed.permissions,
        })
        .await?;
    set_usage(fixture, &invite, 0, InviteStatus::Active).await
}

/// Forces usage count and status, as if earlier visits had happened.
pub async fn set_usage(
    fixture: &Fixture,
    invite: &Invite,
    usage_count: i32,
    status: InviteStatus,
) -> Result<Invite> {
    fixture
        .store
        .conditional_update_invite(
            invite.id,
            invite.snapshot(),
            UsagePatch {
                usage_count,
                status,
            },
        )
        .await?
        .ok_or_else(|| eyre!("invite {} changed underneath the fixture", invite.id))
}

/// An invite store whose database is gone.
pub struct FailingInviteStore;

fn unreachable() -> DbError {
    DbError::Sqlx(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl InviteStore for FailingInviteStore {
    async fn insert_invite(&self, _invite: &NewInvite) -> Result<Invite, DbError> {
        Err(unreachable())
    }

    async fn get_invite_by_code(&self, _code: &str) -> Result<Option<Invite>, DbError> {
        Err(unreachable())
    }

    async fn get_invite_by_id(&self, _invite_id: i64) -> Result<Option<Invite>, DbError> {
        Err(unreachable())
    }

    async fn get_invite_with_ownership(
        &self,
        _invite_id: i64,
        _user_id: i32,
    ) -> Result<Option<Invite>, DbError> {
        Err(unreachable())
    }

    async fn list_invites_for_gallery(&self, _gallery_id: &str) -> Result<Vec<Invite>, DbError> {
        Err(unreachable())
    }

    async fn conditional_update_invite(
        &self,
        _invite_id: i64,
        _expected: UsageSnapshot,
        _patch: UsagePatch,
    ) -> Result<Option<Invite>, DbError> {
        Err(unreachable())
    }

    async fn update_invite(
        &self,
        _invite_id: i64,
        _expected: UsageSnapshot,
        _update: &InviteUpdate,
    ) -> Result<Option<Invite>, DbError> {
        Err(unreachable())
    }

    async fn mark_expired(&self, _invite_id: i64) -> Result<(), DbError> {
        Err(unreachable())
    }

    async fn delete_invite(&self, _invite_id: i64) -> Result<bool, DbError> {
        Err(unreachable())
    }

    async fn ping(&self) -> Result<(), DbError> {
        Err(unreachable())
    }
}

/// The seeded fixture, with every invite read and write failing.
pub async fn failing_fixture() -> Fixture {
    let mut fixture = fixture().await;
    fixture.stores.invites = Arc::new(FailingInviteStore);
    fixture
}

pub async fn stored(fixture: &Fixture, invite_id: i64) -> Result<Invite> {
    fixture
        .store
        .get_invite_by_id(invite_id)
        .await?
        .ok_or_else(|| eyre!("invite {invite_id} is gone"))
}
