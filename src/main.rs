use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chatery_whatsapp::config::Config;
use chatery_whatsapp::trigger::{self, EventSink, HttpForwarder, LogSink};
use chatery_whatsapp::ChateryClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,chatery_whatsapp=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Gateway: {}", config.credentials.url);
    info!("  Triggers: {}", config.triggers.len());

    // The trigger works without a reachable gateway; only report it.
    let client = ChateryClient::new(config.credentials.clone());
    match client.test_credentials().await {
        Ok(_) => info!("Chatery gateway is reachable"),
        Err(e) => warn!("Chatery credential test failed: {}", e),
    }

    let sink: Arc<dyn EventSink> = match &config.forward {
        Some(forward) => {
            info!("  Forwarding events to: {}", forward.url);
            Arc::new(HttpForwarder::new(forward.url.clone()))
        }
        None => {
            info!("  No forward URL configured, accepted events are logged");
            Arc::new(LogSink)
        }
    };

    let app = trigger::router(&config.triggers, sink);
    let listener = TcpListener::bind(config.server.listen)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.listen))?;

    trigger::serve(listener, app).await
}
