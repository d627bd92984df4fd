use std::sync::Arc;

use anyhow::Result;
use auth::{AuthConfig, AuthMode, SessionGuard, repositories::UserRepository};
use common::{
    blob_store::{BlobStore, BlobStoreConfig, open_blob_store},
    clock::{Clock, SystemClock},
    database::{DatabaseConfig, health_check, init_pool},
};
use media::{ImageIngestor, ImagePolicy};
use records::RecordStore;
use tokio::net::TcpListener;
use tracing::info;

mod config;
mod error;
mod middleware;
mod models;
mod routes;
mod state;

use crate::{config::ApiConfig, state::AppState};

#[tokio::main]
async fn main() -> Result<()> {
    common::logging::init("theatre-log-api");

    info!("Starting API service");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let blob_config = BlobStoreConfig::from_env()?;
    let blobs = open_blob_store(&blob_config).await?;
    let records = RecordStore::load(blobs.clone(), clock.clone()).await?;

    let sessions = build_session_guard(blobs, clock.clone()).await?;
    let ingestor = ImageIngestor::new(ImagePolicy::from_env());

    let app_state = AppState::new(records, sessions, ingestor, clock);

    // Start the web server
    let app = routes::create_router(app_state);

    let api_config = ApiConfig::from_env();
    let listener = TcpListener::bind(&api_config.bind_addr).await?;
    info!("API service listening on {}", api_config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Connected mode when `DATABASE_URL` is set, offline otherwise
async fn build_session_guard(
    blobs: Arc<dyn BlobStore>,
    clock: Arc<dyn Clock>,
) -> Result<SessionGuard> {
    let auth_config = AuthConfig::from_env();

    let Some(db_config) = DatabaseConfig::from_env() else {
        info!("No DATABASE_URL set, using the offline credential");
        return Ok(SessionGuard::offline(&auth_config, blobs, clock));
    };

    let pool = init_pool(&db_config).await?;
    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    Ok(SessionGuard::new(
        AuthMode::Connected(Arc::new(UserRepository::new(pool))),
        blobs,
        clock,
        auth_config.session_ttl,
    ))
}
