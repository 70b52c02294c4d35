pub mod favorite_store;
pub mod gallery_store;
pub mod invite_store;
pub mod memory_store;
pub mod pg_store;
pub mod visit_ledger;

use favorite_store::FavoriteCountStore;
use gallery_store::GalleryStore;
use invite_store::InviteStore;
use std::sync::Arc;
use visit_ledger::VisitLedger;

/// Every store the invite core needs, usually all backed by the same database.
#[derive(Clone)]
pub struct Stores {
    pub invites: Arc<dyn InviteStore>,
    pub galleries: Arc<dyn GalleryStore>,
    pub visits: Arc<dyn VisitLedger>,
    pub favorites: Arc<dyn FavoriteCountStore>,
}

impl Stores {
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: InviteStore + GalleryStore + VisitLedger + FavoriteCountStore + 'static,
    {
        Self {
            invites: backend.clone(),
            galleries: backend.clone(),
            visits: backend.clone(),
            favorites: backend,
        }
    }
}
