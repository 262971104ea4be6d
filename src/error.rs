//! Error types for the Chatery node.

use thiserror::Error;

/// Errors raised while building or executing a gateway request.
#[derive(Error, Debug)]
pub enum ChateryError {
    /// Transport failure or non-2xx answer from the gateway. The message is
    /// kept verbatim; status classes are not distinguished.
    #[error("Chatery API error: {message}")]
    Api { message: String },

    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    #[error("Unknown operation: {operation} (resource: {resource})")]
    UnknownOperation { resource: String, operation: String },

    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },
}

impl ChateryError {
    pub(crate) fn api(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<reqwest::Error> for ChateryError {
    fn from(err: reqwest::Error) -> Self {
        Self::api(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ChateryError>;
