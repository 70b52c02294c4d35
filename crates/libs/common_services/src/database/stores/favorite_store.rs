use crate::database::DbError;
use crate::database::favorite::{FavoriteCount, NewFavoriteToggle, ToggleOutcome};
use async_trait::async_trait;

/// Aggregate favorite counts per photo.
#[async_trait]
pub trait FavoriteCountStore: Send + Sync {
    /// Apply +1 (`favorited`) or -1 to the photo's aggregate, never going below zero.
    /// Idempotent per `toggle_id`: a replay returns the recorded toggle and applies nothing.
    async fn apply_favorite_toggle(
        &self,
        toggle: &NewFavoriteToggle,
    ) -> Result<ToggleOutcome, DbError>;

    /// Counts for the given photos. Photos that were never favorited are reported as zero.
    async fn get_favorite_counts(
        &self,
        photo_ids: &[String],
    ) -> Result<Vec<FavoriteCount>, DbError>;
}
