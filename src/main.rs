mod bootstrap;
mod config;
mod error;

use std::time::Duration;

use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use error::{AppError, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env();
    config.validate().map_err(AppError::Configuration)?;

    initialize_logging(&config)?;
    tracing::info!(address = %config.server_address(), "starting depot API");

    let bootstrapped = bootstrap::bootstrap(&config).await?;
    let router = distribution::build_router(bootstrapped.state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(config.server.request_timeout_secs)))
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(config.server_address()).await?;
    tracing::info!("listening on {}", config.server_address());

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    bootstrapped.cache_sweeper.abort();
    tracing::info!("shutdown complete");
    Ok(())
}

fn initialize_logging(config: &Config) -> Result<()> {
    let env_filter = EnvFilter::try_new(&config.logging.level)
        .map_err(|e| AppError::LoggingSetup(e.to_string()))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => registry.with(fmt::layer().json()).try_init(),
        "compact" => registry.with(fmt::layer().compact()).try_init(),
        _ => registry.with(fmt::layer().pretty()).try_init(),
    }
    .map_err(|e| AppError::LoggingSetup(e.to_string()))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logging_setup_rejects_invalid_level_filter() {
        let mut config = Config::default();
        config.logging.level = "not-a-level".to_string();
        // EnvFilter is lenient about unknown directives, but an empty string should still fail
        // construction rather than silently defaulting.
        config.logging.level = String::new();
        assert!(EnvFilter::try_new(&config.logging.level).is_err());
    }
}
