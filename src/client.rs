use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde_json::{Map, Value};
use tracing::debug;

use crate::credentials::{Credentials, API_KEY_HEADER, HEALTH_ENDPOINT};
use crate::dispatch::RequestSpec;
use crate::error::{ChateryError, Result};

/// HTTP client for a Chatery gateway.
#[derive(Clone)]
pub struct ChateryClient {
    client: reqwest::Client,
    credentials: Credentials,
}

impl ChateryClient {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            client: reqwest::Client::new(),
            credentials,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Send a prepared request and decode the answer.
    pub async fn execute(&self, spec: &RequestSpec) -> Result<Value> {
        self.request(spec.method.clone(), &spec.path, spec.body.as_ref())
            .await
    }

    /// Check that the gateway is reachable with these credentials.
    pub async fn test_credentials(&self) -> Result<Value> {
        self.request(Method::GET, HEALTH_ENDPOINT, None).await
    }

    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<Value> {
        let url = self.credentials.endpoint_url(endpoint);

        debug!("Sending {} request to Chatery: {}", method, url);

        let mut request = self
            .client
            .request(method, &url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(api_key) = self.credentials.api_key() {
            request = request.header(API_KEY_HEADER, api_key);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ChateryError::api(format!("{}: {}", status, text)));
        }

        Ok(decode_body(&text))
    }
}

/// Empty bodies become `{}`; bodies that are not JSON are kept as a string.
fn decode_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Object(Map::new());
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}
