#![allow(dead_code)]

use api::api_state::ApiContext;
use api::{build_app, serve_on};
use app_state::{AppSettings, load_constants_from_path, load_settings_from_path};
use async_trait::async_trait;
use chrono::Duration;
use color_eyre::Result;
use common_services::api::auth::token::create_access_token;
use common_services::api::invite::interfaces::InviteSummary;
use common_services::database::gallery::Gallery;
use common_services::database::invite::invite::{
    Invite, InviteUpdate, NewInvite, UsagePatch, UsageSnapshot,
};
use common_services::database::invite_store::InviteStore;
use common_services::database::memory_store::MemoryStore;
use common_services::database::{DbError, Stores};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::error;

pub const GALLERY_A: &str = "gallery-a";
pub const GALLERY_B: &str = "gallery-b";
pub const OWNER_A: i32 = 1;
pub const OWNER_B: i32 = 2;

/// An API server on a random local port, backed by a seeded in-memory store.
pub struct TestContext {
    pub settings: AppSettings,
    pub store: Arc<MemoryStore>,
    pub http_client: reqwest::Client,
    pub base_url: String,
    api_handle: JoinHandle<()>,
}

impl TestContext {
    pub async fn new() -> Result<Self> {
        Self::start(None).await
    }

    /// The same server, with every invite read and write going to `invites`.
    pub async fn with_invite_store(invites: Arc<dyn InviteStore>) -> Result<Self> {
        Self::start(Some(invites)).await
    }

    async fn start(invites: Option<Arc<dyn InviteStore>>) -> Result<Self> {
        let settings_path =
            Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../config/settings.yaml");
        let mut settings = load_settings_from_path(&settings_path, false)?;
        let constants = load_constants_from_path(&settings_path)?;
        // Every test client shares 127.0.0.1.
        settings.api.rate_limiting.enabled = false;

        let store = Arc::new(MemoryStore::new());
        seed_galleries(&store).await;
        let mut stores = Stores::from_backend(store.clone());
        if let Some(invites) = invites {
            stores.invites = invites;
        }
        let app = build_app(ApiContext::new(settings.clone(), stores, &constants.invites))?;

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let base_url = format!("http://{}", listener.local_addr()?);
        let api_handle = tokio::spawn(async move {
            if let Err(e) = serve_on(listener, app).await {
                error!("API server failed: {}", e);
            }
        });

        Ok(Self {
            settings,
            store,
            http_client: reqwest::Client::new(),
            base_url,
            api_handle,
        })
    }

    pub fn token_for(&self, user_id: i32) -> Result<String> {
        Ok(create_access_token(
            &self.settings.secrets.jwt,
            user_id,
            Duration::hours(1),
        )?)
    }

    /// Create an invite in gallery A as its owner.
    pub async fn create_invite(&self, payload: Value) -> Result<InviteSummary> {
        let response = self
            .http_client
            .post(format!("{}/gallery/{GALLERY_A}/invites", self.base_url))
            .bearer_auth(self.token_for(OWNER_A)?)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    pub async fn get_invite(&self, invite_id: i64) -> Result<InviteSummary> {
        let response = self
            .http_client
            .get(format!("{}/invites/{invite_id}", self.base_url))
            .bearer_auth(self.token_for(OWNER_A)?)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        self.api_handle.abort();
    }
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

async fn seed_galleries(store: &MemoryStore) {
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
}
