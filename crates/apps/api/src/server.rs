use crate::api_state::ApiContext;
use crate::create_router;
use app_state::{AppConstants, AppSettings};
use axum::Router;
use color_eyre::Result;
use common_services::database::Stores;
use common_services::database::get_db_pool;
use common_services::database::pg_store::PgStore;
use http::{HeaderValue, header};
use std::iter::once;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

const MAX_BODY_BYTES: usize = 256 * 1024;

/// The full application: routes plus the HTTP layers every request goes through.
pub fn build_app(api_state: ApiContext) -> Result<Router> {
    // --- CORS Configuration ---
    let allowed_origins: Vec<HeaderValue> = api_state
        .settings
        .api
        .allowed_origins
        .iter()
        .filter_map(|s| match s.parse() {
            Ok(hv) => Some(hv),
            Err(e) => {
                error!("Invalid CORS origin configured: {} - Error: {}", s, e);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_methods(cors::Any)
        .allow_origin(allowed_origins)
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::ORIGIN,
        ]);

    Ok(create_router(api_state)?
        .layer(TraceLayer::new_for_http().on_request(()))
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(SetSensitiveRequestHeadersLayer::new(once(
            header::AUTHORIZATION,
        ))))
}

/// Serve on an already bound listener. Peer addresses are kept for rate limiting.
pub async fn serve_on(listener: TcpListener, app: Router) -> Result<()> {
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

pub async fn serve(settings: AppSettings, constants: AppConstants) -> Result<()> {
    // --- Server Startup ---
    info!("🚀 Initializing server...");
    let pool = get_db_pool(&settings.secrets.database_url, &constants.database).await?;
    let stores = Stores::from_backend(Arc::new(PgStore::new(pool)));
    let api_state = ApiContext::new(settings.clone(), stores, &constants.invites);

    let app = build_app(api_state)?;

    let listener = TcpListener::bind(settings.api.listen_address()).await?;
    info!("🐸 Server listening on http://{}", listener.local_addr()?);
    serve_on(listener, app).await
}
