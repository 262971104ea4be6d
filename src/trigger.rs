//! Webhook trigger endpoint.
//!
//! Every configured trigger gets one `POST` route. A delivery is acknowledged
//! right away with `{"received": true, "processed": <forwarded>}`; accepted
//! events are handed to the [`EventSink`] on a separate task.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{extract::State, routing::post, Json, Router};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::config::TriggerConfig;
use crate::filter::{should_forward, Decision, TriggerFilter};

/// Header naming the trigger that accepted a forwarded event.
pub const TRIGGER_HEADER: &str = "X-Chatery-Trigger";

/// Receives events accepted by a trigger.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, trigger: &str, event: Value) -> Result<()>;
}

/// Posts accepted events to a workflow URL.
pub struct HttpForwarder {
    client: reqwest::Client,
    url: String,
}

impl HttpForwarder {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl EventSink for HttpForwarder {
    async fn emit(&self, trigger: &str, event: Value) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .header(TRIGGER_HEADER, trigger)
            .json(&event)
            .send()
            .await
            .with_context(|| format!("Failed to forward event to {}", self.url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Workflow endpoint rejected event ({}): {}", status, body);
        }
        Ok(())
    }
}

/// Logs accepted events; used when no forward URL is configured.
pub struct LogSink;

#[async_trait]
impl EventSink for LogSink {
    async fn emit(&self, trigger: &str, event: Value) -> Result<()> {
        info!("[{}] {}", trigger, event);
        Ok(())
    }
}

#[derive(Debug, Serialize, PartialEq)]
struct WebhookResponse {
    received: bool,
    processed: bool,
}

#[derive(Clone)]
struct TriggerState {
    name: Arc<str>,
    filter: Arc<TriggerFilter>,
    sink: Arc<dyn EventSink>,
}

/// Build the router serving every trigger.
pub fn router(triggers: &[TriggerConfig], sink: Arc<dyn EventSink>) -> Router {
    let mut app = Router::new();
    for trigger in triggers {
        let state = TriggerState {
            name: Arc::from(trigger.name.as_str()),
            filter: Arc::new(trigger.filter()),
            sink: sink.clone(),
        };
        info!(
            "Trigger '{}' listening on POST {} (event: {})",
            trigger.name,
            trigger.route(),
            trigger.event
        );
        app = app.route(&trigger.route(), post(handle_webhook).with_state(state));
    }
    app
}

async fn handle_webhook(
    State(state): State<TriggerState>,
    Json(body): Json<Value>,
) -> Json<WebhookResponse> {
    let processed = match should_forward(&body, &state.filter, Utc::now()) {
        Decision::Forward(event) => {
            debug!("Trigger '{}' accepted event", state.name);
            let sink = state.sink.clone();
            let name = state.name.clone();
            tokio::spawn(async move {
                if let Err(e) = sink.emit(&name, event).await {
                    error!("Failed to deliver event from trigger '{}': {:#}", name, e);
                }
            });
            true
        }
        Decision::Suppress(reason) => {
            debug!("Trigger '{}' dropped event: {}", state.name, reason);
            false
        }
    };

    Json(WebhookResponse {
        received: true,
        processed,
    })
}

/// Serve the triggers until Ctrl-C.
pub async fn serve(listener: TcpListener, app: Router) -> Result<()> {
    let addr = listener.local_addr().context("Failed to read listener address")?;
    info!("Webhook server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down webhook server");
        })
        .await
        .context("Server error")?;

    Ok(())
}
