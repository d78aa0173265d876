use std::net::SocketAddr;
use std::sync::Arc;

use axtarget_backend::{
    app,
    config::{get_config, init_config},
    database::{
        memory::MemoryListingStore, pool::create_pool, postgres::PgListingStore,
        store::ListingStore,
    },
    middleware::cors::permissive_cors,
    AppState,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_config()?;
    let config = get_config();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.json_logs {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let store: Arc<dyn ListingStore> = match &config.database_url {
        Some(database_url) => {
            let pool = create_pool(database_url).await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            let store = PgListingStore::new(pool, config.app_id.clone());
            store.listen().await?;
            Arc::new(store)
        }
        None => {
            warn!("DATABASE_URL is not set; listings are kept in memory and lost on restart");
            Arc::new(MemoryListingStore::new(config.app_id.clone()))
        }
    };
    info!(collection = %store.collection_path(), "Listing store ready");

    let app_state = AppState::new(config, store);
    app_state.feed_service.start().await?;

    let router = app(app_state)
        .layer(permissive_cors())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = ?e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown signal received");
}
