use anyhow::Result;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use common::database::{DatabaseConfig, health_check, init_pool, run_migrations};
use grocery_api::{
    AppState,
    config::{ServerConfig, StoreBackend},
    create_router,
    jwt::JwtService,
    store::{MemoryStore, PgStore, Store, postgres::MIGRATOR},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting grocery API service");

    let config = ServerConfig::from_env()?;

    let (store, pool): (Arc<dyn Store>, Option<PgPool>) = match config.backend {
        StoreBackend::Postgres => {
            let db_config = DatabaseConfig::from_env()?;
            let pool = init_pool(&db_config).await?;
            run_migrations(&pool, &MIGRATOR).await?;

            if health_check(&pool).await? {
                info!("Database connection successful");
            } else {
                anyhow::bail!("Failed to connect to database");
            }

            let store: Arc<dyn Store> = Arc::new(PgStore::new(pool.clone()));
            (store, Some(pool))
        }
        StoreBackend::Memory => {
            info!("Using in-memory store; data is lost on shutdown");
            let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
            (store, None)
        }
    };

    let jwt_service = JwtService::new(config.jwt.clone());
    info!(
        "Access tokens expire after {} seconds",
        jwt_service.access_token_expiry()
    );

    let app_state = AppState::new(store, jwt_service);
    let app = create_router(app_state);

    let addr = config.addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!("API service listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pool) = pool {
        pool.close().await;
        info!("Database pool closed");
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down");
}
