use app_state::{AppSettings, InviteConstants};
use axum::extract::FromRef;
use common_services::api::favorites::service::FavoriteService;
use common_services::api::invite::gateway::GalleryAccessGateway;
use common_services::api::invite::management::InviteManager;
use common_services::database::Stores;

#[derive(Clone)]
pub struct ApiContext {
    pub settings: AppSettings,
    pub stores: Stores,
    pub gateway: GalleryAccessGateway,
    pub manager: InviteManager,
    pub favorites: FavoriteService,
}

impl ApiContext {
    /// Wires the invite services on top of one set of stores.
    #[must_use]
    pub fn new(settings: AppSettings, stores: Stores, invite_constants: &InviteConstants) -> Self {
        let gateway = GalleryAccessGateway::new(&stores, invite_constants);
        Self {
            manager: InviteManager::new(&stores, invite_constants.clone()),
            favorites: FavoriteService::new(gateway.clone(), &stores),
            gateway,
            stores,
            settings,
        }
    }
}

impl FromRef<ApiContext> for AppSettings {
    fn from_ref(state: &ApiContext) -> Self {
        state.settings.clone()
    }
}

impl FromRef<ApiContext> for GalleryAccessGateway {
    fn from_ref(state: &ApiContext) -> Self {
        state.gateway.clone()
    }
}

impl FromRef<ApiContext> for InviteManager {
    fn from_ref(state: &ApiContext) -> Self {
        state.manager.clone()
    }
}
