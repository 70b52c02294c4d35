//! Where an account-less visitor's favorites live. One record per invite code; a second device
//! using the same code starts out empty.

use crate::api::favorites::error::FavoriteError;
use crate::api::favorites::interfaces::DeviceFavorites;
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

#[async_trait]
pub trait DeviceFavoriteStore: Send + Sync {
    /// The stored record, or an empty one when this device never favorited anything.
    async fn get(&self, invite_code: &str) -> Result<DeviceFavorites, FavoriteError>;

    /// Replace the record of `favorites.invite_code`.
    async fn set(&self, favorites: &DeviceFavorites) -> Result<(), FavoriteError>;
}

#[derive(Default)]
pub struct MemoryFavoriteStore {
    records: Mutex<HashMap<String, DeviceFavorites>>,
}

impl MemoryFavoriteStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeviceFavoriteStore for MemoryFavoriteStore {
    async fn get(&self, invite_code: &str) -> Result<DeviceFavorites, FavoriteError> {
        let records = self.records.lock().await;
        Ok(records
            .get(invite_code)
            .cloned()
            .unwrap_or_else(|| DeviceFavorites::empty(invite_code)))
    }

    async fn set(&self, favorites: &DeviceFavorites) -> Result<(), FavoriteError> {
        let mut records = self.records.lock().await;
        records.insert(favorites.invite_code.clone(), favorites.clone());
        Ok(())
    }
}

/// All records of a device in one JSON file, keyed by invite code.
/// Writes go to a temp file in the same directory first, then replace the original.
pub struct JsonFileFavoriteStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileFavoriteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn read_all(&self) -> Result<HashMap<String, DeviceFavorites>, FavoriteError> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_all(
        &self,
        records: &HashMap<String, DeviceFavorites>,
    ) -> Result<(), FavoriteError> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).await?;

        let bytes = serde_json::to_vec_pretty(records)?;
        let temp = NamedTempFile::new_in(dir)?;
        fs::write(temp.path(), bytes).await?;
        temp.persist(&self.path).map_err(|e| e.error)?;
        debug!("Wrote device favorites to {}", self.path.display());
        Ok(())
    }
}

#[async_trait]
impl DeviceFavoriteStore for JsonFileFavoriteStore {
    async fn get(&self, invite_code: &str) -> Result<DeviceFavorites, FavoriteError> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_all().await?;
        Ok(records
            .remove(invite_code)
            .unwrap_or_else(|| DeviceFavorites::empty(invite_code)))
    }

    async fn set(&self, favorites: &DeviceFavorites) -> Result<(), FavoriteError> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_all().await?;
        records.insert(favorites.invite_code.clone(), favorites.clone());
        self.write_all(&records).await
    }
}
