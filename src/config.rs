use anyhow::{Context, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;

use crate::credentials::Credentials;
use crate::events::TriggerEvent;
use crate::filter::{FilterOptions, TriggerFilter};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub credentials: Credentials,
    #[serde(default)]
    pub node: NodeConfig,
    #[serde(default = "default_server_config")]
    pub server: ServerConfig,
    #[serde(default)]
    pub forward: Option<ForwardConfig>,
    #[serde(default = "default_triggers")]
    pub triggers: Vec<TriggerConfig>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct NodeConfig {
    /// Record per-item failures as `{error}` items instead of aborting
    #[serde(default)]
    pub continue_on_fail: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
}

/// Where accepted trigger events are delivered.
#[derive(Debug, Deserialize, Clone)]
pub struct ForwardConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TriggerConfig {
    #[serde(default = "default_trigger_name")]
    pub name: String,
    /// Path segment the webhook is served under
    #[serde(default = "default_trigger_path")]
    pub path: String,
    #[serde(default)]
    pub event: TriggerEvent,
    #[serde(default)]
    pub options: FilterOptions,
}

impl TriggerConfig {
    pub fn filter(&self) -> TriggerFilter {
        TriggerFilter::new(self.event, self.options.clone())
    }

    /// Route path with a single leading slash.
    pub fn route(&self) -> String {
        format!("/{}", self.path.trim_start_matches('/'))
    }
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 5678))
}

fn default_server_config() -> ServerConfig {
    ServerConfig {
        listen: default_listen(),
    }
}

fn default_trigger_name() -> String {
    "Chatery WhatsApp Trigger".to_string()
}

fn default_trigger_path() -> String {
    "webhook".to_string()
}

fn default_triggers() -> Vec<TriggerConfig> {
    vec![TriggerConfig {
        name: default_trigger_name(),
        path: default_trigger_path(),
        event: TriggerEvent::default(),
        options: FilterOptions::default(),
    }]
}

/// A route the router serves as-is: no `:`/`*` segments and no `{}` captures.
fn is_literal_route(route: &str) -> bool {
    !route.contains(['{', '}'])
        && route
            .split('/')
            .all(|segment| !segment.starts_with(':') && !segment.starts_with('*'))
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;

        let mut routes = std::collections::HashSet::new();
        for trigger in &config.triggers {
            let route = trigger.route();
            if !is_literal_route(&route) {
                anyhow::bail!(
                    "Invalid trigger path '{}' (trigger '{}'): captures are not allowed",
                    route,
                    trigger.name
                );
            }
            if !routes.insert(route) {
                anyhow::bail!(
                    "Duplicate trigger path '{}' (trigger '{}')",
                    trigger.route(),
                    trigger.name
                );
            }
        }

        Ok(config)
    }
}
