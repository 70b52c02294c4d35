use thiserror::Error;

/// Why a favorite toggle did not go through. In every case the device state is left as it was.
#[derive(Debug, Error)]
pub enum FavoriteError {
    #[error("Device favorites could not be read or written: {0}")]
    Io(#[from] std::io::Error),

    #[error("Device favorites are not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The server refused the toggle, e.g. the invite no longer allows favoriting.
    #[error("Favorite rejected: {0}")]
    Rejected(String),

    /// The server could not be reached or failed internally. The outcome is unknown.
    #[error("Favorites service unavailable: {0}")]
    Unavailable(String),
}

impl FavoriteError {
    /// Only an unreachable server is worth another try with the same toggle id.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
