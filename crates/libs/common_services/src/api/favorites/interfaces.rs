use crate::database::favorite::FavoriteCount;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// --- Device-local shape ---

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FavoritePhotographer {
    pub id: String,
    pub name: String,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteGallery {
    pub id: String,
    pub title: String,
    pub photographer: FavoritePhotographer,
}

/// A favorited photo with enough display fields to render it without another request.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FavoritePhoto {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub url: String,
    pub thumbnail_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    pub is_for_sale: bool,
    pub gallery: FavoriteGallery,
}

/// A toggle the server may or may not have applied. Resent unchanged until it answers.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PendingToggle {
    pub photo_id: String,
    pub toggle_id: Uuid,
    pub favorited: bool,
}

/// Everything one device remembers for one invite code. Deduplicated by photo id.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceFavorites {
    pub invite_code: String,
    pub favorites: Vec<FavoritePhoto>,
    pub last_modified: DateTime<Utc>,
    /// At most one per photo.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pending: Vec<PendingToggle>,
}

impl DeviceFavorites {
    #[must_use]
    pub fn empty(invite_code: &str) -> Self {
        Self {
            invite_code: invite_code.to_owned(),
            favorites: Vec::new(),
            last_modified: Utc::now(),
            pending: Vec::new(),
        }
    }

    #[must_use]
    pub fn contains(&self, photo_id: &str) -> bool {
        self.favorites.iter().any(|p| p.id == photo_id)
    }

    /// No-op when the photo is already present.
    pub fn insert(&mut self, photo: FavoritePhoto) {
        if !self.contains(&photo.id) {
            self.favorites.push(photo);
            self.last_modified = Utc::now();
        }
    }

    /// No-op when the photo is absent.
    pub fn remove(&mut self, photo_id: &str) {
        let before = self.favorites.len();
        self.favorites.retain(|p| p.id != photo_id);
        if self.favorites.len() != before {
            self.last_modified = Utc::now();
        }
    }

    #[must_use]
    pub fn state(&self, photo_id: &str) -> FavoriteState {
        if self.contains(photo_id) {
            FavoriteState::Favorited
        } else {
            FavoriteState::NotFavorited
        }
    }

    /// Insert or remove `photo` so that its state becomes `state`. Returns whether it changed.
    pub fn set_state(&mut self, photo: &FavoritePhoto, state: FavoriteState) -> bool {
        if self.state(&photo.id) == state {
            return false;
        }
        if state.is_favorited() {
            self.insert(photo.clone());
        } else {
            self.remove(&photo.id);
        }
        true
    }

    #[must_use]
    pub fn pending_toggle(&self, photo_id: &str) -> Option<&PendingToggle> {
        self.pending.iter().find(|p| p.photo_id == photo_id)
    }

    /// Replaces any pending toggle of the same photo.
    pub fn set_pending(&mut self, toggle: PendingToggle) {
        self.clear_pending(&toggle.photo_id);
        self.pending.push(toggle);
        self.last_modified = Utc::now();
    }

    /// Returns whether a pending toggle was removed.
    pub fn clear_pending(&mut self, photo_id: &str) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.photo_id != photo_id);
        let cleared = self.pending.len() != before;
        if cleared {
            self.last_modified = Utc::now();
        }
        cleared
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FavoriteState {
    NotFavorited,
    Favorited,
}

impl FavoriteState {
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::NotFavorited => Self::Favorited,
            Self::Favorited => Self::NotFavorited,
        }
    }

    #[must_use]
    pub const fn is_favorited(self) -> bool {
        matches!(self, Self::Favorited)
    }
}

impl From<bool> for FavoriteState {
    fn from(favorited: bool) -> Self {
        if favorited {
            Self::Favorited
        } else {
            Self::NotFavorited
        }
    }
}

// --- Request Payloads ---

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ToggleFavoriteRequest {
    pub code: String,
    pub photo_id: String,
    /// The state the visitor wants to end up in.
    pub favorited: bool,
    /// Generated once per toggle action and reused on retries.
    pub toggle_id: Uuid,
    pub visit_key: String,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteCountsRequest {
    pub code: String,
    pub photo_ids: Vec<String>,
    pub visit_key: String,
}

// --- Response Payloads ---

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ToggleFavoriteResponse {
    pub photo_id: String,
    /// Aggregate across all visitors right after this toggle was applied.
    pub favorite_count: i32,
    pub is_favorited: bool,
    /// The toggle id had been applied before; nothing changed this time.
    pub replayed: bool,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteCountsResponse {
    pub counts: Vec<FavoriteCount>,
}
