use anyhow::Error as AnyhowError;
use config::AppConfig;
use db::{DBService, DbErr};
use server::{AppState, http};
use services::points::PointsService;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, prelude::*};
use utils_jwt::JwtService;

#[derive(Debug, Error)]
enum ServerError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error(transparent)]
    Other(#[from] AnyhowError),
}

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let filter_string = format!(
        "warn,server={level},services={level},db={level},config={level}",
        level = log_level
    );
    let env_filter = EnvFilter::try_new(filter_string).expect("Failed to create tracing filter");
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(env_filter))
        .init();

    let config = AppConfig::from_env();
    let db = DBService::new(&config.database_url).await?;
    let jwt = JwtService::new(config.jwt_secret.clone(), config.token_expiry_minutes);
    let points = PointsService::new(config.rewards.clone());
    let state = AppState::new(db, jwt, points);

    let app = http::router(state);
    let listener = tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;
    let actual_port = listener.local_addr()?.port();
    tracing::info!("Server running on http://{}:{}", config.host, actual_port);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl+C handler: {err}");
        return;
    }
    tracing::info!("Shutdown signal received, stopping server");
}
