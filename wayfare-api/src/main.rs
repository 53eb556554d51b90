use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wayfare_api::{app, state::AuthConfig, AppState};
use wayfare_booking::TravelStore;
use wayfare_store::{DbClient, MemoryStore, PendingSearchStore, PgStore};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wayfare_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = wayfare_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Wayfare API on port {}", config.server.port);

    let store: Arc<dyn TravelStore> = if config.database.url.is_empty() {
        tracing::warn!("No database configured, running on the in-memory store");
        Arc::new(MemoryStore::new())
    } else {
        let db = DbClient::new(&config.database.url)
            .await
            .expect("Failed to connect to Postgres");
        db.migrate().await.expect("Failed to run migrations");
        Arc::new(PgStore::new(db.pool.clone()))
    };

    let searches = Arc::new(PendingSearchStore::new(Duration::from_secs(
        config.search.pending_search_ttl_seconds,
    )));

    let app_state = AppState::new(
        store,
        searches,
        AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
            admin_key: config.auth.admin_key.clone(),
        },
    );

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
