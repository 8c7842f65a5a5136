//! Athenaeum Server - library lending and review API

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use athenaeum_server::{
    api, config::AppConfig, repository::Repository, services::Services, AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    // Keep the guard alive for the whole process so buffered logs get flushed
    let (writer, _log_guard) = match &config.logging.directory {
        Some(directory) => tracing_appender::non_blocking(tracing_appender::rolling::daily(
            directory,
            "athenaeum.log",
        )),
        None => tracing_appender::non_blocking(std::io::stdout()),
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("athenaeum_server={},tower_http=debug", config.logging.level).into()
    });
    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry.with(fmt::layer().json().with_writer(writer)).init();
    } else {
        registry.with(fmt::layer().with_writer(writer)).init();
    }

    tracing::info!("Starting Athenaeum Server v{}", env!("CARGO_PKG_VERSION"));

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!("Database migrations completed");

    let addr = SocketAddr::new(
        config.server.host.parse().context("Invalid host address")?,
        config.server.port,
    );

    tracing::info!(
        max_active_borrows = config.lending.max_active_borrows,
        loan_period_days = config.lending.loan_period_days,
        "Lending rules loaded"
    );

    let services = Services::new(Repository::new(pool), config.lending);

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    let app = api::create_router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
