use serde::Deserialize;

/// Header carrying the optional gateway API key.
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Endpoint used to test a set of credentials.
pub const HEALTH_ENDPOINT: &str = "/api/health";

/// Connection settings for a Chatery server.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Credentials {
    /// Base URL of the Chatery API server
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            url: default_url(),
            api_key: None,
        }
    }
}

impl Credentials {
    pub fn new(url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            url: url.into(),
            api_key,
        }
    }

    /// The API key to send, if any. A blank key counts as not configured.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// Join the base URL with an endpoint path.
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.url.trim_end_matches('/'), endpoint)
    }
}

fn default_url() -> String {
    "http://localhost:3000".to_string()
}
