//! Parameter access for node items.
//!
//! The host hands every item a flat JSON object of named parameters. Presence
//! of required fields is the host schema's job; the accessors here only turn
//! absence or a wrongly typed value into a [`ChateryError`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::{ChateryError, Result};
use crate::events::SessionWebhookEvent;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeParameters(Map<String, Value>);

impl NodeParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.0.insert(name.to_string(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|v| !v.is_null())
    }

    pub fn required_str(&self, name: &str) -> Result<&str> {
        match self.get(name) {
            None => Err(ChateryError::MissingParameter(name.to_string())),
            Some(Value::String(s)) => Ok(s),
            Some(other) => Err(expected(name, "a string", other)),
        }
    }

    /// A string parameter that is left out when absent or empty.
    pub fn optional_str(&self, name: &str) -> Result<Option<&str>> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::String(s)) if s.is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(other) => Err(expected(name, "a string", other)),
        }
    }

    pub fn required_number(&self, name: &str) -> Result<Number> {
        match self.get(name) {
            None => Err(ChateryError::MissingParameter(name.to_string())),
            Some(Value::Number(n)) => Ok(n.clone()),
            Some(other) => Err(expected(name, "a number", other)),
        }
    }

    /// A numeric parameter that is only sent when strictly positive.
    pub fn positive_number(&self, name: &str) -> Result<Option<Number>> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::Number(n)) => {
                let positive = n.as_f64().is_some_and(|v| v > 0.0);
                Ok(positive.then(|| n.clone()))
            }
            Some(other) => Err(expected(name, "a number", other)),
        }
    }

    /// A value from one of the schema's option lists.
    pub fn option<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let value = self
            .get(name)
            .ok_or_else(|| ChateryError::MissingParameter(name.to_string()))?;
        serde_json::from_value(value.clone())
            .map_err(|_| ChateryError::invalid(name, format!("unsupported value {}", value)))
    }

    /// Like [`option`](Self::option), but absent means the type's default.
    pub fn option_or_default<T: DeserializeOwned + Default>(&self, name: &str) -> Result<T> {
        if self.get(name).is_none() {
            return Ok(T::default());
        }
        self.option(name)
    }

    /// Entries of a fixed collection, e.g. `{"webhookValues": [{...}, ...]}`.
    /// A missing collection or key yields no entries.
    pub fn collection<T: DeserializeOwned>(&self, name: &str, key: &str) -> Result<Vec<T>> {
        let Some(entries) = self.get(name).and_then(|c| c.get(key)) else {
            return Ok(Vec::new());
        };
        if entries.is_null() {
            return Ok(Vec::new());
        }
        serde_json::from_value(entries.clone())
            .map_err(|e| ChateryError::invalid(name, format!("malformed '{}': {}", key, e)))
    }

    /// A multi-option parameter. Absent means empty.
    pub fn list<T: DeserializeOwned>(&self, name: &str) -> Result<Vec<T>> {
        match self.get(name) {
            None => Ok(Vec::new()),
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| ChateryError::invalid(name, e.to_string())),
        }
    }
}

/// A webhook registered on a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookRegistration {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<SessionWebhookEvent>>,
}

/// A reply button attached to a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Button {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub text: String,
}

/// Split a comma-separated participant list, trimming and dropping blanks.
pub fn parse_participants(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

/// Session metadata from its free-form JSON text.
///
/// Empty text and the literal `{}` add nothing. Text that does not parse is
/// replaced with an empty object rather than reported.
pub fn parse_metadata(raw: Option<&str>) -> Option<Value> {
    let raw = raw.filter(|s| !s.is_empty() && *s != "{}")?;
    Some(serde_json::from_str(raw).unwrap_or_else(|_| Value::Object(Map::new())))
}

fn expected(name: &str, what: &str, got: &Value) -> ChateryError {
    ChateryError::invalid(name, format!("expected {}, got {}", what, type_name(got)))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
