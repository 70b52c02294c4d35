use crate::database::DbError;
use crate::database::gallery::Gallery;
use async_trait::async_trait;

/// Read-only view on galleries and photo membership.
#[async_trait]
pub trait GalleryStore: Send + Sync {
    async fn get_gallery(&self, gallery_id: &str) -> Result<Option<Gallery>, DbError>;

    async fn get_owned_gallery(
        &self,
        gallery_id: &str,
        user_id: i32,
    ) -> Result<Option<Gallery>, DbError>;

    /// The gallery a photo belongs to.
    async fn photo_gallery_id(&self, photo_id: &str) -> Result<Option<String>, DbError>;

    /// The ids among `photo_ids` that belong to `gallery_id`, in request order.
    async fn photos_in_gallery(
        &self,
        gallery_id: &str,
        photo_ids: &[String],
    ) -> Result<Vec<String>, DbError>;
}
