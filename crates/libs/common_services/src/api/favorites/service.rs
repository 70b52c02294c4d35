use crate::api::favorites::error::FavoriteError;
use crate::api::favorites::interfaces::{ToggleFavoriteRequest, ToggleFavoriteResponse};
use crate::api::favorites::reconciler::FavoriteApi;
use crate::api::invite::error::InviteError;
use crate::api::invite::gateway::{AccessTarget, GalleryAccessGateway, VisitContext};
use crate::api::invite::permissions::Operation;
use crate::database::Stores;
use crate::database::favorite::{FavoriteCount, NewFavoriteToggle};
use crate::database::favorite_store::FavoriteCountStore;
use crate::database::gallery_store::GalleryStore;
use crate::utils::redact_code;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument};

/// Upper bound on photo ids per counts request.
pub const MAX_COUNT_PHOTOS: usize = 500;

/// Server side of favorites: every toggle is authorized through the gateway, then applied to
/// the aggregate exactly once per toggle id.
#[derive(Clone)]
pub struct FavoriteService {
    gateway: GalleryAccessGateway,
    counts: Arc<dyn FavoriteCountStore>,
    galleries: Arc<dyn GalleryStore>,
}

impl FavoriteService {
    #[must_use]
    pub fn new(gateway: GalleryAccessGateway, stores: &Stores) -> Self {
        Self {
            gateway,
            counts: stores.favorites.clone(),
            galleries: stores.galleries.clone(),
        }
    }

    #[instrument(skip(self, request), fields(code = %redact_code(&request.code), photo_id = %request.photo_id))]
    pub async fn apply_favorite(
        &self,
        request: &ToggleFavoriteRequest,
    ) -> Result<ToggleFavoriteResponse, InviteError> {
        let context = self
            .gateway
            .authorize(
                &request.code,
                Operation::Favorite,
                &AccessTarget::Photo(request.photo_id.clone()),
                &VisitContext::new(request.visit_key.clone()),
            )
            .await?;

        let outcome = self
            .counts
            .apply_favorite_toggle(&NewFavoriteToggle {
                toggle_id: request.toggle_id,
                invite_id: context.invite_id,
                photo_id: request.photo_id.clone(),
                favorited: request.favorited,
            })
            .await?;

        if outcome.replayed {
            info!("Favorite toggle {} replayed", request.toggle_id);
        }
        Ok(ToggleFavoriteResponse {
            photo_id: outcome.toggle.photo_id,
            favorite_count: outcome.toggle.favorite_count,
            is_favorited: outcome.toggle.favorited,
            replayed: outcome.replayed,
        })
    }

    /// Aggregate counts for photos of the invite's gallery. Ids from other galleries are
    /// silently left out.
    #[instrument(skip(self, code, photo_ids, visit), fields(code = %redact_code(code)))]
    pub async fn favorite_counts(
        &self,
        code: &str,
        photo_ids: &[String],
        visit: &VisitContext,
    ) -> Result<Vec<FavoriteCount>, InviteError> {
        if photo_ids.len() > MAX_COUNT_PHOTOS {
            return Err(InviteError::BadRequest(format!(
                "at most {MAX_COUNT_PHOTOS} photos per request"
            )));
        }
        let context = self
            .gateway
            .authorize(code, Operation::View, &AccessTarget::Gallery, visit)
            .await?;

        let mut requested: Vec<String> = Vec::with_capacity(photo_ids.len());
        for photo_id in photo_ids {
            if !requested.contains(photo_id) {
                requested.push(photo_id.clone());
            }
        }
        let in_gallery = self
            .galleries
            .photos_in_gallery(&context.gallery.id, &requested)
            .await?;

        Ok(self.counts.get_favorite_counts(&in_gallery).await?)
    }
}

/// In-process [`FavoriteApi`], for callers that live next to the service.
#[derive(Clone)]
pub struct ServiceFavoriteApi {
    service: FavoriteService,
}

impl ServiceFavoriteApi {
    #[must_use]
    pub const fn new(service: FavoriteService) -> Self {
        Self { service }
    }
}

impl From<InviteError> for FavoriteError {
    fn from(error: InviteError) -> Self {
        if error.is_fault() {
            Self::Unavailable(error.to_string())
        } else {
            Self::Rejected(error.to_string())
        }
    }
}

#[async_trait]
impl FavoriteApi for ServiceFavoriteApi {
    async fn toggle(
        &self,
        request: &ToggleFavoriteRequest,
    ) -> Result<ToggleFavoriteResponse, FavoriteError> {
        Ok(self.service.apply_favorite(request).await?)
    }

    async fn counts(
        &self,
        code: &str,
        photo_ids: &[String],
        visit: &VisitContext,
    ) -> Result<Vec<FavoriteCount>, FavoriteError> {
        Ok(self.service.favorite_counts(code, photo_ids, visit).await?)
    }
}
