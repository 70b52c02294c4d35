//! Keeps a visitor's device-local favorites in line with the server's aggregate counts.
//!
//! The device decides *whether* this visitor favorited a photo, the server decides *how many*
//! visitors did. A toggle is only committed locally after the server confirmed it, and the
//! server's answer wins whenever the two disagree. A toggle that got no answer is kept as
//! pending and resent with the same toggle id, so the server counts it at most once.

use crate::api::favorites::device_store::DeviceFavoriteStore;
use crate::api::favorites::error::FavoriteError;
use crate::api::favorites::interfaces::{
    FavoritePhoto, FavoriteState, PendingToggle, ToggleFavoriteRequest, ToggleFavoriteResponse,
};
use crate::api::invite::gateway::VisitContext;
use crate::database::favorite::FavoriteCount;
use crate::utils::redact_code;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// The server side of a toggle, reached over HTTP or in-process.
#[async_trait]
pub trait FavoriteApi: Send + Sync {
    /// Must be idempotent per `request.toggle_id`.
    async fn toggle(
        &self,
        request: &ToggleFavoriteRequest,
    ) -> Result<ToggleFavoriteResponse, FavoriteError>;

    async fn counts(
        &self,
        code: &str,
        photo_ids: &[String],
        visit: &VisitContext,
    ) -> Result<Vec<FavoriteCount>, FavoriteError>;
}

/// Result of a confirmed toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedToggle {
    pub state: FavoriteState,
    pub favorite_count: i32,
}

#[derive(Clone)]
pub struct FavoritesReconciler {
    device: Arc<dyn DeviceFavoriteStore>,
    api: Arc<dyn FavoriteApi>,
    visit: VisitContext,
}

impl FavoritesReconciler {
    pub fn new(
        device: Arc<dyn DeviceFavoriteStore>,
        api: Arc<dyn FavoriteApi>,
        visit: VisitContext,
    ) -> Self {
        Self { device, api, visit }
    }

    pub async fn favorites(&self, code: &str) -> Result<Vec<FavoritePhoto>, FavoriteError> {
        Ok(self.device.get(code).await?.favorites)
    }

    pub async fn state(&self, code: &str, photo_id: &str) -> Result<FavoriteState, FavoriteError> {
        Ok(self.device.get(code).await?.state(photo_id))
    }

    /// Flip the locally known state of `photo`.
    ///
    /// The favorite state only changes once the server answered. When the answer is lost, the
    /// toggle is stored as pending and the next toggle of the photo resends it with the same id
    /// and the same desired state, until the server confirms or refuses it.
    #[instrument(skip(self, code, photo), fields(code = %redact_code(code), photo_id = %photo.id))]
    pub async fn toggle(
        &self,
        code: &str,
        photo: &FavoritePhoto,
    ) -> Result<ConfirmedToggle, FavoriteError> {
        let mut record = self.device.get(code).await?;
        let pending = match record.pending_toggle(&photo.id) {
            Some(pending) => {
                debug!("Resending toggle {} for photo {}", pending.toggle_id, photo.id);
                pending.clone()
            }
            None => PendingToggle {
                photo_id: photo.id.clone(),
                toggle_id: Uuid::new_v4(),
                favorited: record.state(&photo.id).flipped().is_favorited(),
            },
        };

        let request = ToggleFavoriteRequest {
            code: code.to_owned(),
            photo_id: photo.id.clone(),
            favorited: pending.favorited,
            toggle_id: pending.toggle_id,
            visit_key: self.visit.visit_key.clone(),
        };
        let response = match self.api.toggle(&request).await {
            Ok(response) => response,
            Err(e) if e.is_transient() => {
                if record.pending_toggle(&photo.id) != Some(&pending) {
                    record.set_pending(pending);
                    self.device.set(&record).await?;
                }
                return Err(e);
            }
            Err(e) => {
                if record.clear_pending(&photo.id) {
                    self.device.set(&record).await?;
                }
                return Err(e);
            }
        };

        let confirmed = FavoriteState::from(response.is_favorited);
        let cleared = record.clear_pending(&photo.id);
        let changed = record.set_state(photo, confirmed);
        if cleared || changed {
            self.device.set(&record).await?;
        }
        info!(
            "Photo {} is now {:?} ({} favorites in total)",
            photo.id, confirmed, response.favorite_count
        );
        Ok(ConfirmedToggle {
            state: confirmed,
            favorite_count: response.favorite_count,
        })
    }

    /// Make the device record agree with a state the server confirmed for `photo`.
    pub async fn apply_server_state(
        &self,
        code: &str,
        photo: &FavoritePhoto,
        is_favorited: bool,
    ) -> Result<FavoriteState, FavoriteError> {
        let mut record = self.device.get(code).await?;
        let confirmed = FavoriteState::from(is_favorited);
        if record.set_state(photo, confirmed) {
            self.device.set(&record).await?;
        }
        Ok(confirmed)
    }

    /// Aggregate counts for display. Failures are reported, the device record is never touched.
    pub async fn counts(
        &self,
        code: &str,
        photo_ids: &[String],
    ) -> Result<Vec<FavoriteCount>, FavoriteError> {
        self.api
            .counts(code, photo_ids, &self.visit)
            .await
            .inspect_err(|e| warn!("Could not load favorite counts: {}", e))
    }
}
