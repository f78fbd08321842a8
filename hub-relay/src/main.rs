//! HubRelay - webhook receiver.
//!
//! This binary:
//! - Answers the platform's subscription handshake
//! - Verifies signed event deliveries
//! - Archives each payload to blob storage
//! - Fetches details for every referenced entity and publishes them to a topic

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hubrelay::{
    router, AmqpTopicBroker, AppState, AzureBlobStore, Config, DetailClient, Pipeline,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("web_server_starting");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        port = config.port,
        app_id = %config.app_id,
        topic = %config.topic_name,
        container = %config.blob_container_name,
        detail_api = %config.detail_api_base_url,
        extract_field = %config.extract_field,
        request_timeout_ms = config.request_timeout_ms,
        "config_loaded"
    );

    let timeout = Duration::from_millis(config.request_timeout_ms);

    let store = AzureBlobStore::from_connection_string(
        &config.blob_connection_string,
        &config.blob_container_name,
        timeout,
    )
    .context("Failed to create blob store")?;

    let details = DetailClient::new(
        &config.detail_api_base_url,
        config.access_token.clone(),
        timeout,
    )
    .context("Failed to create detail API client")?;

    // Senders are opened per request; nothing connects here.
    let broker = AmqpTopicBroker::new(config.broker_url.clone(), config.topic_name.clone(), timeout);

    let pipeline = Pipeline::new(
        Arc::new(store),
        Arc::new(details),
        Arc::new(broker),
        config.extract_field.clone(),
    );

    let port = config.port;
    let app = router(AppState::new(config, pipeline));

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("web_server_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "ctrl_c_handler_failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "sigterm_handler_failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}
