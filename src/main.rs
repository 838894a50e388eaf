use inkwell_blog::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    repository::{RepositoryState, SqliteRepository, connect_pool},
    revalidate::{LogRevalidator, RevalidatorState},
    seed::seed_demo,
    storage::{LocalDiskStorage, S3StorageClient, StorageState},
};
use std::sync::Arc;
use tokio::{net::TcpListener, signal};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Boots configuration, logging, the database, storage and the HTTP server, then
/// tears the pool down once the server has drained.
#[tokio::main]
async fn main() {
    // 1. Configuration (fails fast on missing production secrets)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging: pretty locally, JSON in production
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "inkwell_blog=debug,tower_http=info,axum=trace".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 3. Database: one process-wide pool, migrated before serving
    let pool = connect_pool(&config.db_url)
        .await
        .expect("FATAL: Failed to open the database. Check DATABASE_URL.");
    let sqlite = SqliteRepository::new(pool);
    sqlite
        .migrate()
        .await
        .expect("FATAL: Failed to apply database migrations.");
    let repo = Arc::new(sqlite) as RepositoryState;

    if config.seed_demo {
        seed_demo(repo.as_ref())
            .await
            .expect("FATAL: Failed to seed demo content.");
    }

    // 4. Storage: local disk in development, S3-compatible bucket in production
    let storage: StorageState = match &config.s3 {
        Some(s3) if config.env == Env::Production => Arc::new(S3StorageClient::new(
            &s3.endpoint,
            &s3.region,
            &s3.access_key,
            &s3.secret_key,
            &s3.bucket,
            &s3.public_url,
        )),
        _ => Arc::new(LocalDiskStorage::new(&config.upload_dir)),
    };
    if let Err(e) = storage.prepare().await {
        tracing::warn!("storage not ready: {e}");
    }

    // 5. State and router
    let bind_addr = config.bind_addr.clone();
    let app_state = AppState {
        repo: repo.clone(),
        storage,
        revalidator: Arc::new(LogRevalidator) as RevalidatorState,
        config,
    };
    let app = create_router(app_state);

    // 6. Serve until a shutdown signal, then release the pool
    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: Failed to bind BIND_ADDR.");

    tracing::info!("Listening on {bind_addr}");
    tracing::info!("API Documentation (Swagger UI) available at: http://{bind_addr}/swagger-ui");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("server error: {e}");
    }

    repo.close().await;
    tracing::info!("Server shut down");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
