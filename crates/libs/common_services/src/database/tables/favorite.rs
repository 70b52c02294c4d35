use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Aggregate favorite count of one photo, across all visitors.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteCount {
    pub photo_id: String,
    pub favorite_count: i32,
}

/// Ledger row of one applied toggle. `favorite_count` is the aggregate right after it was applied.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteToggle {
    pub toggle_id: Uuid,
    pub invite_id: i64,
    pub photo_id: String,
    pub favorited: bool,
    pub favorite_count: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFavoriteToggle {
    pub toggle_id: Uuid,
    pub invite_id: i64,
    pub photo_id: String,
    pub favorited: bool,
}

#[derive(Debug, Clone)]
pub struct ToggleOutcome {
    pub toggle: FavoriteToggle,
    /// The toggle id was already recorded; nothing was applied this time.
    pub replayed: bool,
}
