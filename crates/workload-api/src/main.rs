//! Trainer workload API server entry point.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use workload_api::app;
use workload_api::auth::JwtTokenValidator;
use workload_api::config::AppConfig;
use workload_api::error::AppError;
use workload_api::state::AppState;
use workload_core::clock::SystemClock;
use workload_ledger::application::command_handlers::ConflictRetry;
use workload_store::MIGRATOR;
use workload_store::pg_bucket_store::PgBucketStore;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    info!("Starting trainer workload service");

    let config = AppConfig::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await?;
    MIGRATOR.run(&pool).await?;
    info!("Database migrations applied");

    let app_state = AppState::new(
        Arc::new(PgBucketStore::new(pool)),
        Arc::new(JwtTokenValidator::new(
            config.jwt_secret.as_bytes(),
            Arc::new(SystemClock),
        )),
        ConflictRetry::new(config.ledger_max_attempts),
    );
    let router = app::build_router(app_state, app::cors_layer(&config.cors_allowed_origins)?);

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "unable to install ctrl+c handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "unable to install sigterm handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
